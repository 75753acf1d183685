//! Containment in a box, optionally with forbidden holes.

use super::{covers_object, validate_ids, ExternalConstraint, ModelView};
use crate::error::GeostError;
use crate::geometry::DBox;
use crate::internal::{AllowedArea, ForbiddenArea, Generator};

/// Objects must lie inside `area` and avoid every box of `holes`.
///
/// Only the geometric axes are constrained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InArea {
    area: DBox,
    holes: Vec<DBox>,
    objects: Option<Vec<i32>>,
}

impl InArea {
    /// Applies to every object.
    pub fn new(area: DBox) -> Self {
        Self {
            area,
            holes: Vec::new(),
            objects: None,
        }
    }

    pub fn with_holes(mut self, holes: Vec<DBox>) -> Self {
        self.holes = holes;
        self
    }

    /// Restricts the constraint to the objects with these ids.
    pub fn for_objects(mut self, ids: Vec<i32>) -> Self {
        self.objects = Some(ids);
        self
    }

    pub fn area(&self) -> &DBox {
        &self.area
    }

    pub fn holes(&self) -> &[DBox] {
        &self.holes
    }
}

impl ExternalConstraint for InArea {
    fn objects(&self) -> Option<&[i32]> {
        self.objects.as_deref()
    }

    fn dimensions(&self, dimension: usize) -> Vec<usize> {
        (0..dimension).collect()
    }

    fn validate(&self, model: &ModelView<'_>) -> Result<(), GeostError> {
        validate_ids(self.objects(), model)?;
        for b in std::iter::once(&self.area).chain(&self.holes) {
            b.validate()?;
            if b.dimension() != model.dimension {
                return Err(GeostError::DimensionMismatch {
                    expected: model.dimension,
                    found: b.dimension(),
                });
            }
        }
        Ok(())
    }

    fn generate(&self, _model: &ModelView<'_>) -> Vec<Generator> {
        std::iter::once(Generator::AllowedArea(AllowedArea::new(self.area.clone())))
            .chain(
                self.holes
                    .iter()
                    .map(|h| Generator::ForbiddenArea(ForbiddenArea::new(h.clone()))),
            )
            .collect()
    }

    fn is_applicable(&self, _generator: &Generator, object: usize, model: &ModelView<'_>) -> bool {
        covers_object(self.objects(), object, model)
    }

    fn stringify(&self) -> String {
        let holes: Vec<String> = self.holes.iter().map(DBox::to_string).collect();
        format!("InArea({} minus [{}])", self.area, holes.join(", "))
    }
}
