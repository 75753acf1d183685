//! Objects placed by the engine.

mod time;

pub use time::TimeBoundConstraint;

use crate::geometry::DBox;
use crate::shape::ShapeRegistry;
use crate::store::{Store, VarId};

/// A k-dimensional object with a variable origin, a variable shape and a
/// variable time interval.
///
/// The object only holds handles; domains live in the [`Store`]. Grounding
/// bookkeeping (`ground_count`) is maintained by the engine as variables
/// become singletons and is restored when levels are removed.
#[derive(Debug, Clone)]
pub struct GeostObject {
    id: i32,
    coords: Vec<VarId>,
    shape: VarId,
    start: VarId,
    duration: VarId,
    end: VarId,
    pub(crate) ground_count: usize,
    /// Shape that gave the loosest bound on each axis during the last pass;
    /// tried first next time so that the limit kicks in early.
    pub(crate) best_shape_per_dimension: Vec<Option<i32>>,
}

impl GeostObject {
    pub fn new(
        id: i32,
        coords: Vec<VarId>,
        shape: VarId,
        start: VarId,
        duration: VarId,
        end: VarId,
    ) -> Self {
        let dimension = coords.len();
        Self {
            id,
            coords,
            shape,
            start,
            duration,
            end,
            ground_count: 0,
            best_shape_per_dimension: vec![None; dimension + 1],
        }
    }

    pub fn id(&self) -> i32 {
        self.id
    }

    /// Number of geometric axes `k`.
    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[VarId] {
        &self.coords
    }

    pub fn shape(&self) -> VarId {
        self.shape
    }

    pub fn start(&self) -> VarId {
        self.start
    }

    pub fn duration(&self) -> VarId {
        self.duration
    }

    pub fn end(&self) -> VarId {
        self.end
    }

    /// Variable swept on `axis`: a coordinate, or `start` on the time axis.
    pub fn sweep_var(&self, axis: usize) -> VarId {
        if axis < self.coords.len() {
            self.coords[axis]
        } else {
            self.start
        }
    }

    /// Coordinates, shape, start, duration and end.
    pub fn defining_vars(&self) -> impl Iterator<Item = VarId> + '_ {
        self.coords
            .iter()
            .copied()
            .chain([self.shape, self.start, self.duration, self.end])
    }

    pub fn defining_var_count(&self) -> usize {
        self.coords.len() + 4
    }

    pub fn ground_count(&self) -> usize {
        self.ground_count
    }

    /// Grounded according to the engine's bookkeeping.
    pub fn is_grounded(&self) -> bool {
        self.ground_count == self.defining_var_count()
    }

    pub fn time_constraint(&self) -> TimeBoundConstraint {
        TimeBoundConstraint::new(self.start, self.duration, self.end)
    }

    /// Shape ids still allowed by the shape selector.
    pub fn possible_shapes(&self, store: &Store) -> Vec<i32> {
        store.dom(self.shape).values().collect()
    }

    /// Bounding box (`k + 1` axes) of every cell the object may occupy given
    /// the current domains: origins and shapes on the geometric axes,
    /// `[start.min, end.max)` on the time axis.
    pub fn occupancy_box(&self, store: &Store, shapes: &ShapeRegistry) -> DBox {
        let k = self.dimension();
        let mut b = DBox::zeroed(k + 1);
        let mut lo = vec![i32::MAX; k];
        let mut hi = vec![i32::MIN; k];
        for shape in store.dom(self.shape).values().filter_map(|id| shapes.get(id)) {
            let bb = shape.bounding_box();
            for i in 0..k {
                lo[i] = lo[i].min(bb.origin()[i]);
                hi[i] = hi[i].max(bb.end(i));
            }
        }
        for i in 0..k {
            let var = self.coords[i];
            if lo[i] > hi[i] {
                b.set_span(i, store.min(var), store.min(var));
            } else {
                b.set_span(i, store.min(var) + lo[i], store.max(var) + hi[i]);
            }
        }
        b.set_span(k, store.min(self.start), store.max(self.end));
        b
    }
}
