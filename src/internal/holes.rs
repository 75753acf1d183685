//! Forbidden regions read from the gaps of the object's own domains.

use super::{full_corners, Direction, InternalConstraint, SweepContext};
use crate::geometry::{BoxPool, DBox, FULL_SPAN};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::Shape;
use crate::store::MIN_COORD;

/// Forbids the values missing from the domain of the swept variable on each
/// axis: coordinates on the geometric axes, `start` on the time axis.
///
/// Purely domain driven, so it is queried first by the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainHoles {
    owner: usize,
    abs_min: Vec<i32>,
    abs_max: Vec<i32>,
}

impl DomainHoles {
    /// `owner` is the index of the object, `dimension` its number of
    /// geometric axes.
    pub fn new(owner: usize, dimension: usize) -> Self {
        let (abs_min, abs_max) = full_corners(dimension + 1);
        Self {
            owner,
            abs_min,
            abs_max,
        }
    }

    pub fn owner(&self) -> usize {
        self.owner
    }
}

impl InternalConstraint for DomainHoles {
    fn is_feasible(
        &self,
        _direction: Direction,
        _order: &DimensionOrder,
        object: &GeostObject,
        _shape: &Shape,
        point: &[i32],
        ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox> {
        let dims = object.dimension() + 1;
        for axis in 0..dims {
            let var = object.sweep_var(axis);
            if let Some((lo, hi)) = ctx.store.dom(var).gap_around(point[axis]) {
                let mut outbox = pool.acquire(dims);
                for i in 0..dims {
                    outbox.set_span(i, MIN_COORD, MIN_COORD + FULL_SPAN);
                }
                outbox.set_span(axis, lo, hi + 1);
                return Some(outbox);
            }
        }
        None
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        match direction {
            Direction::Min => &self.abs_min,
            Direction::Max => &self.abs_max,
        }
    }

    fn card_infeasible(&self) -> i64 {
        1
    }

    fn is_static(&self) -> bool {
        false
    }

    fn is_single_use(&self) -> bool {
        true
    }
}
