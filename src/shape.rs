//! Shapes: immutable unions of boxes, and the registry that owns them.

use std::cell::OnceCell;
use std::collections::HashMap;

use crate::error::GeostError;
use crate::geometry::DBox;

/// Union of `k`-dimensional boxes, positioned relative to an object origin.
///
/// Components may overlap. The bounding box and the area of the union are
/// computed once at construction; the holes (bounding box minus components)
/// are computed on first use, since only obstacle frames need them.
#[derive(Debug, Clone)]
pub struct Shape {
    id: i32,
    components: Vec<DBox>,
    bounding_box: DBox,
    area: i64,
    holes: OnceCell<Vec<DBox>>,
}

impl Shape {
    /// Creates a shape from its components.
    ///
    /// # Errors
    ///
    /// - `NegativeShapeId` if `id < 0`
    /// - `EmptyShape` if `components` is empty
    /// - `DimensionMismatch` / `NegativeLength` for malformed components
    pub fn new(id: i32, components: Vec<DBox>) -> Result<Self, GeostError> {
        if id < 0 {
            return Err(GeostError::NegativeShapeId(id));
        }
        let Some(first) = components.first() else {
            return Err(GeostError::EmptyShape(id));
        };
        let dimension = first.dimension();
        for component in &components {
            component.validate()?;
            if component.dimension() != dimension {
                return Err(GeostError::DimensionMismatch {
                    expected: dimension,
                    found: component.dimension(),
                });
            }
        }
        let Some(bounding_box) = DBox::bounding_box(&components) else {
            return Err(GeostError::EmptyShape(id));
        };
        // Union area: each component minus the components before it.
        let area = components
            .iter()
            .enumerate()
            .map(|(i, c)| {
                DBox::subtract_all(std::slice::from_ref(c), &components[..i])
                    .iter()
                    .map(DBox::area)
                    .sum::<i64>()
            })
            .sum();
        Ok(Self {
            id,
            components,
            bounding_box,
            area,
            holes: OnceCell::new(),
        })
    }

    /// Single-box shape of the given lengths, anchored at the origin.
    pub fn rectangle(id: i32, length: Vec<i32>) -> Result<Self, GeostError> {
        let origin = vec![0; length.len()];
        Self::new(id, vec![DBox::new(origin, length)?])
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    pub fn dimension(&self) -> usize {
        self.bounding_box.dimension()
    }

    pub fn components(&self) -> &[DBox] {
        &self.components
    }

    pub fn bounding_box(&self) -> &DBox {
        &self.bounding_box
    }

    /// Number of integer cells covered by the union of the components.
    pub fn area(&self) -> i64 {
        self.area
    }

    /// Disjoint boxes covering `bounding_box \ components`, in shape
    /// units.
    ///
    /// Frame computation moves these to its four-times finer grid itself
    /// (see [`compute_frame`](crate::internal::compute_frame)); they are
    /// stored unscaled so that every other reader sees plain coordinates.
    pub fn holes(&self) -> &[DBox] {
        self.holes.get_or_init(|| {
            DBox::subtract_all(std::slice::from_ref(&self.bounding_box), &self.components)
        })
    }

    pub fn has_holes(&self) -> bool {
        !self.holes().is_empty()
    }

    /// True when the shape placed at `origin` covers `point`.
    pub fn covers(&self, origin: &[i32], point: &[i32]) -> bool {
        self.components.iter().any(|c| {
            (0..c.dimension()).all(|i| {
                let lo = c.origin()[i] + origin[i];
                lo <= point[i] && point[i] < lo + c.length()[i]
            })
        })
    }
}

// =============================================================================
// Shape Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl serde::Serialize for Shape {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Shape", 2)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("components", &self.components)?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Shape {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw {
            id: i32,
            components: Vec<DBox>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Shape::new(raw.id, raw.components).map_err(serde::de::Error::custom)
    }
}

/// Shapes indexed by id.
#[derive(Debug, Clone, Default)]
pub struct ShapeRegistry {
    shapes: HashMap<i32, Shape>,
    dimension: Option<usize>,
}

impl ShapeRegistry {
    /// Builds a registry, rejecting duplicate ids and mixed dimensions.
    pub fn new(shapes: Vec<Shape>) -> Result<Self, GeostError> {
        let mut registry = Self::default();
        for shape in shapes {
            registry.insert(shape)?;
        }
        Ok(registry)
    }

    fn insert(&mut self, shape: Shape) -> Result<(), GeostError> {
        match self.dimension {
            Some(d) if d != shape.dimension() => {
                return Err(GeostError::DimensionMismatch {
                    expected: d,
                    found: shape.dimension(),
                })
            }
            _ => self.dimension = Some(shape.dimension()),
        }
        if self.shapes.contains_key(&shape.id()) {
            return Err(GeostError::DuplicateShapeId(shape.id()));
        }
        self.shapes.insert(shape.id(), shape);
        Ok(())
    }

    pub fn get(&self, id: i32) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn contains(&self, id: i32) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Dimension shared by every shape, `None` for an empty registry.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn iter(&self) -> impl Iterator<Item = &Shape> {
        self.shapes.values()
    }
}
