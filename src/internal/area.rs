//! Containment in an allowed box, avoidance of a forbidden box.

use super::{
    full_corners, keep_better, overlapping_origins, Direction, InternalConstraint, SweepContext,
};
use crate::geometry::{BoxPool, DBox, FULL_SPAN};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::Shape;
use crate::store::{MAX_COORD, MIN_COORD};

/// The bounding box of the placed shape must lie inside `area`.
///
/// Only geometric axes are constrained; the time axis of every outbox spans
/// the whole range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedArea {
    area: DBox,
    abs_min: Vec<i32>,
    abs_max: Vec<i32>,
}

impl AllowedArea {
    /// `area` has the `k` geometric axes.
    pub fn new(area: DBox) -> Self {
        // Anything outside the area is forbidden, so no useful corner exists.
        let (abs_min, abs_max) = full_corners(area.dimension() + 1);
        Self {
            area,
            abs_min,
            abs_max,
        }
    }

    pub fn area(&self) -> &DBox {
        &self.area
    }

    /// Inclusive range of origins keeping `shape` inside the area on `axis`.
    pub fn feasible_origins(&self, shape: &Shape, axis: usize) -> (i32, i32) {
        let bb = shape.bounding_box();
        (
            self.area.origin()[axis] - bb.origin()[axis],
            self.area.end(axis) - bb.end(axis),
        )
    }
}

impl InternalConstraint for AllowedArea {
    fn is_feasible(
        &self,
        _direction: Direction,
        _order: &DimensionOrder,
        _object: &GeostObject,
        shape: &Shape,
        point: &[i32],
        _ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox> {
        let k = self.area.dimension();
        for axis in 0..k {
            let (lo, hi) = self.feasible_origins(shape, axis);
            let span = if lo > hi {
                Some((MIN_COORD, MAX_COORD + 1))
            } else if point[axis] < lo {
                Some((MIN_COORD, lo))
            } else if point[axis] > hi {
                Some((hi + 1, MAX_COORD + 1))
            } else {
                None
            };
            if let Some((from, to)) = span {
                let mut outbox = pool.acquire(k + 1);
                for i in 0..=k {
                    outbox.set_span(i, MIN_COORD, MIN_COORD + FULL_SPAN);
                }
                outbox.set_span(axis, from, to);
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
        i64::MAX
    }

    fn is_static(&self) -> bool {
        true
    }

    fn is_single_use(&self) -> bool {
        false
    }
}

/// No component of the placed shape may overlap `area`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForbiddenArea {
    area: DBox,
    abs_min: Vec<i32>,
    abs_max: Vec<i32>,
}

impl ForbiddenArea {
    /// `area` has the `k` geometric axes.
    pub fn new(area: DBox) -> Self {
        let k = area.dimension();
        let mut abs_min = area.origin().to_vec();
        let mut abs_max: Vec<i32> = (0..k).map(|i| area.end(i) - 1).collect();
        abs_min.push(MIN_COORD);
        abs_max.push(MAX_COORD);
        Self {
            area,
            abs_min,
            abs_max,
        }
    }

    pub fn area(&self) -> &DBox {
        &self.area
    }
}

impl InternalConstraint for ForbiddenArea {
    fn is_feasible(
        &self,
        direction: Direction,
        order: &DimensionOrder,
        _object: &GeostObject,
        shape: &Shape,
        point: &[i32],
        _ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox> {
        if self.area.is_empty() {
            return None;
        }
        let k = self.area.dimension();
        let mut best = None;
        for component in shape.components().iter().filter(|c| !c.is_empty()) {
            let mut candidate = pool.acquire(k + 1);
            for i in 0..k {
                let (lo, hi) = overlapping_origins(
                    component.origin()[i],
                    component.length()[i],
                    self.area.origin()[i],
                    self.area.length()[i],
                );
                candidate.set_span(i, lo, hi);
            }
            candidate.set_span(k, MIN_COORD, MIN_COORD + FULL_SPAN);
            keep_better(direction, order, point, &mut best, candidate, pool);
        }
        best
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        match direction {
            Direction::Min => &self.abs_min,
            Direction::Max => &self.abs_max,
        }
    }

    fn card_infeasible(&self) -> i64 {
        self.area.area()
    }

    fn is_static(&self) -> bool {
        true
    }

    fn is_single_use(&self) -> bool {
        false
    }
}
