//! Pairwise non-overlap.

use super::{covers_object, validate_ids, ExternalConstraint, ModelView};
use crate::error::GeostError;
use crate::internal::{Generator, ObstacleFrame, ObstacleObject};

/// No two objects of the set may overlap on every selected axis at once.
///
/// By default every geometric axis and the time axis are selected, so
/// objects may share space as long as their time intervals are disjoint.
/// Each object becomes an obstacle for the others.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NonOverlapping {
    objects: Option<Vec<i32>>,
    dimensions: Option<Vec<usize>>,
}

impl NonOverlapping {
    /// Applies to every object, on every axis.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the constraint to the objects with these ids.
    pub fn for_objects(mut self, ids: Vec<i32>) -> Self {
        self.objects = Some(ids);
        self
    }

    /// Selects the axes on which overlap is checked; `k` denotes time.
    pub fn with_dimensions(mut self, dimensions: Vec<usize>) -> Self {
        self.dimensions = Some(dimensions);
        self
    }
}

impl ExternalConstraint for NonOverlapping {
    fn objects(&self) -> Option<&[i32]> {
        self.objects.as_deref()
    }

    fn dimensions(&self, dimension: usize) -> Vec<usize> {
        match &self.dimensions {
            Some(d) => d.clone(),
            None => (0..=dimension).collect(),
        }
    }

    fn validate(&self, model: &ModelView<'_>) -> Result<(), GeostError> {
        validate_ids(self.objects(), model)?;
        let dimensions = self.dimensions(model.dimension);
        // Without a selected axis every pair would overlap.
        if dimensions.is_empty() {
            return Err(GeostError::InvalidDimension(0));
        }
        match dimensions.into_iter().find(|&d| d > model.dimension) {
            Some(d) => Err(GeostError::InvalidDimension(d)),
            None => Ok(()),
        }
    }

    fn generate(&self, model: &ModelView<'_>) -> Vec<Generator> {
        let selected = self.dimensions(model.dimension);
        (0..model.objects.len())
            .filter(|&i| covers_object(self.objects(), i, model))
            .map(|i| {
                let obstacle = &model.objects[i];
                if model.store.is_singleton(obstacle.shape()) {
                    Generator::ObstacleObject(ObstacleObject::new(i, model.dimension, &selected))
                } else {
                    Generator::ObstacleFrame(ObstacleFrame::new(i, model.dimension, &selected))
                }
            })
            .collect()
    }

    fn is_applicable(&self, generator: &Generator, object: usize, model: &ModelView<'_>) -> bool {
        generator.owner() != Some(object) && covers_object(self.objects(), object, model)
    }

    fn stringify(&self) -> String {
        let ids = match &self.objects {
            Some(ids) => format!("{ids:?}"),
            None => "all".to_string(),
        };
        let dims = match &self.dimensions {
            Some(d) => format!("{d:?}"),
            None => "all".to_string(),
        };
        format!("NonOverlapping(objects: {ids}, dimensions: {dims})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::test_support::object;
    use crate::object::GeostObject;
    use crate::store::Store;
    use std::collections::HashMap;

    fn objects(store: &mut Store) -> (Vec<GeostObject>, HashMap<i32, usize>) {
        let a = object(store, (0, 3), (0, 3), &[0], (0, 0), 1);
        let b = object(store, (0, 3), (0, 3), &[0, 1], (0, 0), 1);
        let a = GeostObject::new(10, a.coords().to_vec(), a.shape(), a.start(), a.duration(), a.end());
        let b = GeostObject::new(20, b.coords().to_vec(), b.shape(), b.start(), b.duration(), b.end());
        (vec![a, b], HashMap::from([(10, 0), (20, 1)]))
    }

    #[test]
    fn fixed_shape_obstacles_skip_the_frame_machinery() {
        let mut store = Store::new();
        let (objects, index) = objects(&mut store);
        let model = ModelView {
            objects: &objects,
            index: &index,
            store: &store,
            dimension: 2,
        };
        let c = NonOverlapping::new();
        let kinds: Vec<&str> = c.generate(&model).iter().map(Generator::kind).collect();
        assert_eq!(kinds, vec!["obstacle-object", "obstacle-frame"]);
    }

    #[test]
    fn obstacle_never_applies_to_its_owner() {
        let mut store = Store::new();
        let (objects, index) = objects(&mut store);
        let model = ModelView {
            objects: &objects,
            index: &index,
            store: &store,
            dimension: 2,
        };
        let c = NonOverlapping::new();
        let generators = c.generate(&model);
        assert!(!c.is_applicable(&generators[0], 0, &model));
        assert!(c.is_applicable(&generators[0], 1, &model));
    }

    #[test]
    fn restricted_object_set() {
        let mut store = Store::new();
        let (objects, index) = objects(&mut store);
        let model = ModelView {
            objects: &objects,
            index: &index,
            store: &store,
            dimension: 2,
        };
        let c = NonOverlapping::new().for_objects(vec![20]);
        assert_eq!(c.generate(&model).len(), 1);
        assert_eq!(
            NonOverlapping::new().for_objects(vec![30]).validate(&model),
            Err(GeostError::UnknownObject(30))
        );
    }

    #[test]
    fn dimensions_default_to_all_axes() {
        let c = NonOverlapping::new();
        assert_eq!(c.dimensions(2), vec![0, 1, 2]);
        let c = NonOverlapping::new().with_dimensions(vec![0, 1]);
        assert_eq!(c.dimensions(2), vec![0, 1]);
        assert_eq!(
            c.stringify(),
            "NonOverlapping(objects: all, dimensions: [0, 1])"
        );
    }

    #[test]
    fn validate_rejects_axes_beyond_time() {
        let mut store = Store::new();
        let (objects, index) = objects(&mut store);
        let model = ModelView {
            objects: &objects,
            index: &index,
            store: &store,
            dimension: 2,
        };
        let c = NonOverlapping::new().with_dimensions(vec![0, 3]);
        assert_eq!(c.validate(&model), Err(GeostError::InvalidDimension(3)));
    }

    #[test]
    fn validate_rejects_an_empty_axis_list() {
        let mut store = Store::new();
        let (objects, index) = objects(&mut store);
        let model = ModelView {
            objects: &objects,
            index: &index,
            store: &store,
            dimension: 2,
        };
        let c = NonOverlapping::new().with_dimensions(Vec::new());
        assert_eq!(c.validate(&model), Err(GeostError::InvalidDimension(0)));
        assert!(NonOverlapping::new().with_dimensions(vec![2]).validate(&model).is_ok());
    }
}
