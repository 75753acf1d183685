//! Forbidden-region generators.
//!
//! Every generator answers one question for the sweep: is this point of the
//! sweep space feasible for the candidate shape, and if not, which box of
//! points around it is infeasible too? Points of the sweep space have
//! `k + 1` coordinates: the object's origin on the `k` geometric axes
//! followed by its start time.
//!
//! # Contract
//!
//! A box returned by [`InternalConstraint::is_feasible`] must
//! - contain the query point,
//! - contain only points that are infeasible for the candidate shape,
//!   whatever the values later taken by the other variables of the object.
//!
//! The sweep relies on both properties to jump over the box.
//!
//! The set of generators is closed; [`Generator`] dispatches over it.

mod area;
mod holes;
mod obstacle;

pub use area::{AllowedArea, ForbiddenArea};
pub use holes::DomainHoles;
pub use obstacle::{compute_frame, ObstacleFrame, ObstacleObject};

use crate::geometry::{BoxPool, DBox};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::{Shape, ShapeRegistry};
use crate::store::{Store, MAX_COORD, MIN_COORD};

/// Direction of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards smaller values (`prune_min`).
    Min,
    /// Towards larger values (`prune_max`).
    Max,
}

/// Read-only view of the model shared with generators.
#[derive(Debug, Clone, Copy)]
pub struct SweepContext<'a> {
    pub store: &'a Store,
    pub shapes: &'a ShapeRegistry,
    pub objects: &'a [GeostObject],
}

/// Protocol shared by every forbidden-region generator.
pub trait InternalConstraint {
    /// Returns `None` when `point` is feasible for this generator, otherwise
    /// an infeasible box of `k + 1` axes containing `point`, acquired from
    /// `pool`.
    #[allow(clippy::too_many_arguments)]
    fn is_feasible(
        &self,
        direction: Direction,
        order: &DimensionOrder,
        object: &GeostObject,
        shape: &Shape,
        point: &[i32],
        ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox>;

    /// Extreme corner of the absolute region this generator may forbid:
    /// the minimum corner for [`Direction::Min`], the inclusive maximum
    /// corner for [`Direction::Max`].
    fn abs_infeasible(&self, direction: Direction) -> &[i32];

    /// Estimate of the forbidden volume. Non-positive means the generator
    /// cannot forbid anything and is skipped.
    fn card_infeasible(&self) -> i64;

    /// The answer depends only on the candidate shape and the point.
    fn is_static(&self) -> bool;

    /// The generator belongs to exactly one object.
    fn is_single_use(&self) -> bool;

    /// Recomputes cached geometry from the current domains.
    fn refresh(&mut self, _ctx: &SweepContext<'_>) {}
}

/// The closed set of generators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generator {
    AllowedArea(AllowedArea),
    ForbiddenArea(ForbiddenArea),
    DomainHoles(DomainHoles),
    ObstacleObject(ObstacleObject),
    ObstacleFrame(ObstacleFrame),
}

impl Generator {
    /// Index of the object whose domains this generator reads, if any.
    pub fn owner(&self) -> Option<usize> {
        match self {
            Self::AllowedArea(_) | Self::ForbiddenArea(_) => None,
            Self::DomainHoles(g) => Some(g.owner()),
            Self::ObstacleObject(g) => Some(g.owner()),
            Self::ObstacleFrame(g) => Some(g.owner()),
        }
    }

    /// Region of absolute space this generator may forbid.
    pub fn abs_region_intersects(&self, occupancy: &DBox) -> bool {
        let lo = self.abs_infeasible(Direction::Min);
        let hi = self.abs_infeasible(Direction::Max);
        (0..occupancy.dimension())
            .all(|i| lo[i] < occupancy.end(i) && occupancy.origin()[i] <= hi[i])
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::AllowedArea(_) => "allowed-area",
            Self::ForbiddenArea(_) => "forbidden-area",
            Self::DomainHoles(_) => "domain-holes",
            Self::ObstacleObject(_) => "obstacle-object",
            Self::ObstacleFrame(_) => "obstacle-frame",
        }
    }
}

impl InternalConstraint for Generator {
    fn is_feasible(
        &self,
        direction: Direction,
        order: &DimensionOrder,
        object: &GeostObject,
        shape: &Shape,
        point: &[i32],
        ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox> {
        match self {
            Self::AllowedArea(g) => g.is_feasible(direction, order, object, shape, point, ctx, pool),
            Self::ForbiddenArea(g) => {
                g.is_feasible(direction, order, object, shape, point, ctx, pool)
            }
            Self::DomainHoles(g) => g.is_feasible(direction, order, object, shape, point, ctx, pool),
            Self::ObstacleObject(g) => {
                g.is_feasible(direction, order, object, shape, point, ctx, pool)
            }
            Self::ObstacleFrame(g) => {
                g.is_feasible(direction, order, object, shape, point, ctx, pool)
            }
        }
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        match self {
            Self::AllowedArea(g) => g.abs_infeasible(direction),
            Self::ForbiddenArea(g) => g.abs_infeasible(direction),
            Self::DomainHoles(g) => g.abs_infeasible(direction),
            Self::ObstacleObject(g) => g.abs_infeasible(direction),
            Self::ObstacleFrame(g) => g.abs_infeasible(direction),
        }
    }

    fn card_infeasible(&self) -> i64 {
        match self {
            Self::AllowedArea(g) => g.card_infeasible(),
            Self::ForbiddenArea(g) => g.card_infeasible(),
            Self::DomainHoles(g) => g.card_infeasible(),
            Self::ObstacleObject(g) => g.card_infeasible(),
            Self::ObstacleFrame(g) => g.card_infeasible(),
        }
    }

    fn is_static(&self) -> bool {
        match self {
            Self::AllowedArea(g) => g.is_static(),
            Self::ForbiddenArea(g) => g.is_static(),
            Self::DomainHoles(g) => g.is_static(),
            Self::ObstacleObject(g) => g.is_static(),
            Self::ObstacleFrame(g) => g.is_static(),
        }
    }

    fn is_single_use(&self) -> bool {
        match self {
            Self::AllowedArea(g) => g.is_single_use(),
            Self::ForbiddenArea(g) => g.is_single_use(),
            Self::DomainHoles(g) => g.is_single_use(),
            Self::ObstacleObject(g) => g.is_single_use(),
            Self::ObstacleFrame(g) => g.is_single_use(),
        }
    }

    fn refresh(&mut self, ctx: &SweepContext<'_>) {
        match self {
            Self::AllowedArea(g) => g.refresh(ctx),
            Self::ForbiddenArea(g) => g.refresh(ctx),
            Self::DomainHoles(g) => g.refresh(ctx),
            Self::ObstacleObject(g) => g.refresh(ctx),
            Self::ObstacleFrame(g) => g.refresh(ctx),
        }
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

/// Inclusive corners of the whole coordinate space.
pub(crate) fn full_corners(dimension: usize) -> (Vec<i32>, Vec<i32>) {
    (vec![MIN_COORD; dimension], vec![MAX_COORD; dimension])
}

/// Origins `c` for which a component `[c + ao, c + ao + al)` overlaps
/// `[fo, fo + fl)`, as a half-open `[lo, hi)`.
pub(crate) fn overlapping_origins(ao: i32, al: i32, fo: i32, fl: i32) -> (i32, i32) {
    (fo - ao - al + 1, fo + fl - ao)
}

/// True when `candidate` lets the sweep jump further than `best` along the
/// least significant axis of `order`.
pub(crate) fn jumps_further(
    direction: Direction,
    order: &DimensionOrder,
    candidate: &DBox,
    best: &DBox,
) -> bool {
    let axis = order.dimension_at(order.dimension() - 1);
    match direction {
        Direction::Min => candidate.end(axis) > best.end(axis),
        Direction::Max => candidate.origin()[axis] < best.origin()[axis],
    }
}

/// Keeps in `best` whichever of `best` and `candidate` contains `point` and
/// jumps further; the other box goes back to the pool.
pub(crate) fn keep_better(
    direction: Direction,
    order: &DimensionOrder,
    point: &[i32],
    best: &mut Option<DBox>,
    candidate: DBox,
    pool: &mut BoxPool,
) {
    if !candidate.contains_point(point) {
        pool.release(candidate);
        return;
    }
    let replace = best
        .as_ref()
        .map_or(true, |b| jumps_further(direction, order, &candidate, b));
    if !replace {
        pool.release(candidate);
    } else if let Some(old) = best.replace(candidate) {
        pool.release(old);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// A 2-D object whose variables are created in `store`.
    pub fn object(
        store: &mut Store,
        x: (i32, i32),
        y: (i32, i32),
        shapes: &[i32],
        start: (i32, i32),
        duration: i32,
    ) -> GeostObject {
        let cx = store.new_var(x.0, x.1).unwrap();
        let cy = store.new_var(y.0, y.1).unwrap();
        let s = store.new_var_from_values(shapes).unwrap();
        let st = store.new_var(start.0, start.1).unwrap();
        let d = store.constant(duration).unwrap();
        let e = store.new_var(start.0 + duration, start.1 + duration).unwrap();
        GeostObject::new(0, vec![cx, cy], s, st, d, e)
    }

    pub fn bx(origin: &[i32], length: &[i32]) -> DBox {
        DBox::new(origin.to_vec(), length.to_vec()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_support::bx;

    #[test]
    fn overlapping_origins_for_unit_component() {
        // A unit square overlaps [3, 5) when its origin is 3 or 4.
        assert_eq!(overlapping_origins(0, 1, 3, 2), (3, 5));
        // A 2-wide component offset by 1 overlaps [3, 5) from origin 1.
        assert_eq!(overlapping_origins(1, 2, 3, 2), (1, 4));
    }

    #[test]
    fn keep_better_prefers_longer_jump() {
        let mut pool = BoxPool::new();
        let order = DimensionOrder::identity(2);
        let mut best = None;
        keep_better(Direction::Min, &order, &[1, 1], &mut best, bx(&[0, 0], &[3, 2]), &mut pool);
        keep_better(Direction::Min, &order, &[1, 1], &mut best, bx(&[1, 1], &[1, 5]), &mut pool);
        keep_better(Direction::Min, &order, &[1, 1], &mut best, bx(&[5, 5], &[9, 9]), &mut pool);
        assert_eq!(best, Some(bx(&[1, 1], &[1, 5])));
        assert_eq!(pool.available(2), 2);
    }

    #[test]
    fn keep_better_max_direction_uses_origin() {
        let mut pool = BoxPool::new();
        let order = DimensionOrder::identity(2);
        let mut best = None;
        keep_better(Direction::Max, &order, &[4, 4], &mut best, bx(&[3, 3], &[2, 2]), &mut pool);
        keep_better(Direction::Max, &order, &[4, 4], &mut best, bx(&[0, 0], &[5, 5]), &mut pool);
        assert_eq!(best, Some(bx(&[0, 0], &[5, 5])));
    }
}
