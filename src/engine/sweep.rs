//! Sweep-point search for the tightest feasible bound of one axis.
//!
//! The sweep walks the domain box of an object in the lexicographic order
//! given by the dimension order, most significant axis first. Whenever the
//! current point is forbidden it records, per axis, how far the forbidden
//! boxes seen so far extend (the jump vector `n`) and moves to the next
//! candidate point by incrementing the least significant axis to its jump
//! value, carrying into more significant axes when an axis runs out of
//! domain. The first point no generator forbids gives the bound.

use crate::geometry::{BoxPool, DBox};
use crate::internal::{Direction, Generator, InternalConstraint, SweepContext};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::Shape;

use super::GeostStats;

/// Result of one sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    /// Tightest feasible value of the swept axis.
    Feasible(i32),
    /// No point of the domain box is feasible for the shape.
    Infeasible,
    /// The sweep stopped as it could no longer beat the given limit.
    Limited,
}

/// One object and candidate shape, with everything the sweep reads.
///
/// `order` must have the swept axis as its most significant dimension.
/// `cache` holds boxes returned by static generators for this object and
/// shape; they stay valid for the whole pruning pass of the object.
pub(crate) struct Sweep<'a> {
    pub object: &'a GeostObject,
    pub shape: &'a Shape,
    pub ctx: SweepContext<'a>,
    pub holes: &'a Generator,
    pub generators: &'a [Generator],
    pub active: &'a [usize],
    pub order: &'a DimensionOrder,
    pub pool: &'a mut BoxPool,
    pub cache: &'a mut Vec<DBox>,
    pub stats: &'a mut GeostStats,
    pub cache_static: bool,
}

impl Sweep<'_> {
    /// Smallest feasible value of `axis`, or `Limited` once every value
    /// left is `>= limit`.
    pub fn prune_min(&mut self, axis: usize, limit: Option<i32>) -> SweepOutcome {
        self.run(axis, Direction::Min, limit)
    }

    /// Largest feasible value of `axis`, or `Limited` once every value left
    /// is `<= limit`.
    pub fn prune_max(&mut self, axis: usize, limit: Option<i32>) -> SweepOutcome {
        self.run(axis, Direction::Max, limit)
    }

    fn run(&mut self, axis: usize, direction: Direction, limit: Option<i32>) -> SweepOutcome {
        debug_assert_eq!(self.order.most_significant(), axis);
        self.stats.sweeps += 1;
        let dims = self.object.dimension() + 1;
        let store = self.ctx.store;
        let lo: Vec<i32> = (0..dims)
            .map(|j| store.min(self.object.sweep_var(j)))
            .collect();
        let hi: Vec<i32> = (0..dims)
            .map(|j| store.max(self.object.sweep_var(j)))
            .collect();
        let (mut c, mut n) = match direction {
            Direction::Min => (lo.clone(), hi.iter().map(|v| v + 1).collect::<Vec<_>>()),
            Direction::Max => (hi.clone(), lo.iter().map(|v| v - 1).collect::<Vec<_>>()),
        };

        loop {
            let beaten = match (direction, limit) {
                (Direction::Min, Some(l)) => c[axis] >= l,
                (Direction::Max, Some(l)) => c[axis] <= l,
                (_, None) => false,
            };
            if beaten {
                return SweepOutcome::Limited;
            }
            if !self.find_forbidden(direction, &c, &mut n) {
                log::trace!(
                    "object {} shape {} axis {axis} {direction:?}: feasible at {c:?}",
                    self.object.id(),
                    self.shape.id()
                );
                return SweepOutcome::Feasible(c[axis]);
            }

            let mut advanced = false;
            for j in self.order.least_significant_first() {
                c[j] = n[j];
                match direction {
                    Direction::Min => {
                        n[j] = hi[j] + 1;
                        if c[j] <= hi[j] {
                            advanced = true;
                            break;
                        }
                        c[j] = lo[j];
                    }
                    Direction::Max => {
                        n[j] = lo[j] - 1;
                        if c[j] >= lo[j] {
                            advanced = true;
                            break;
                        }
                        c[j] = hi[j];
                    }
                }
            }
            if !advanced {
                log::trace!(
                    "object {} shape {} axis {axis} {direction:?}: infeasible",
                    self.object.id(),
                    self.shape.id()
                );
                return SweepOutcome::Infeasible;
            }
        }
    }

    /// Looks for a forbidden box containing `c` and tightens `n` with it.
    ///
    /// Domain holes are asked first, then cached static boxes, then the
    /// active generators in priority order.
    fn find_forbidden(&mut self, direction: Direction, c: &[i32], n: &mut [i32]) -> bool {
        let ctx = self.ctx;
        self.stats.generator_queries += 1;
        if let Some(b) = self.holes.is_feasible(
            direction,
            self.order,
            self.object,
            self.shape,
            c,
            &ctx,
            self.pool,
        ) {
            self.stats.forbidden_boxes += 1;
            tighten(direction, n, &b);
            self.pool.release(b);
            return true;
        }

        if let Some(b) = self.cache.iter().find(|b| b.contains_point(c)) {
            self.stats.cached_box_hits += 1;
            tighten(direction, n, b);
            return true;
        }

        for &g in self.active {
            let generator = &self.generators[g];
            self.stats.generator_queries += 1;
            let Some(b) = generator.is_feasible(
                direction,
                self.order,
                self.object,
                self.shape,
                c,
                &ctx,
                self.pool,
            ) else {
                continue;
            };
            debug_assert!(b.contains_point(c), "{} box {b} misses {c:?}", generator.kind());
            self.stats.forbidden_boxes += 1;
            tighten(direction, n, &b);
            if self.cache_static && generator.is_static() {
                self.cache.push(b);
            } else {
                self.pool.release(b);
            }
            return true;
        }
        false
    }
}

/// Pulls the jump vector to the far side of `b`.
fn tighten(direction: Direction, n: &mut [i32], b: &DBox) {
    for (j, nj) in n.iter_mut().enumerate() {
        *nj = match direction {
            Direction::Min => (*nj).min(b.end(j)),
            Direction::Max => (*nj).max(b.origin()[j] - 1),
        };
    }
}
