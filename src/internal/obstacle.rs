//! Non-overlap against the guaranteed coverage ("frame") of an obstacle.
//!
//! The frame of an obstacle is the region it covers whatever origin and
//! shape it eventually takes, given the current domains. An object placed
//! so that one of its components meets a frame piece on every selected axis
//! overlaps the obstacle in every solution, so such origins are forbidden.

use super::{full_corners, keep_better, overlapping_origins, Direction, InternalConstraint, SweepContext};
use crate::geometry::{BoxPool, DBox, FULL_SPAN};
use crate::object::GeostObject;
use crate::order::DimensionOrder;
use crate::shape::{Shape, ShapeRegistry};
use crate::store::{Store, MAX_COORD, MIN_COORD};

/// Scale used to separate real one-unit slivers from boundary artifacts.
const SCALE: i32 = 4;

/// Guaranteed time window `[start.max, end.min)` of `object`, if non-empty.
fn time_window(object: &GeostObject, store: &Store) -> Option<(i32, i32)> {
    let (from, to) = (store.max(object.start()), store.min(object.end()));
    (from < to).then_some((from, to))
}

/// Computes the frame of `object` as boxes of `k + 1` axes.
///
/// Axes with `selected[axis] == false` span the whole range. The result is
/// empty when no region is guaranteed to be covered.
///
/// On the geometric axes the frame is the core shared by the bounding boxes
/// of every possible shape at every possible origin, minus every hole of
/// those shapes enlarged by the origin domain. When holes are involved the
/// subtraction runs on a four-times finer grid with holes grown by one
/// quarter unit per side: pieces one quarter wide are artifacts of holes
/// flush with the core and are dropped, pieces two quarters wide are real
/// one-unit slivers between holes and are kept.
pub fn compute_frame(
    object: &GeostObject,
    store: &Store,
    shapes: &ShapeRegistry,
    selected: &[bool],
) -> Vec<DBox> {
    let k = object.dimension();
    debug_assert_eq!(selected.len(), k + 1);
    let window = if selected[k] {
        match time_window(object, store) {
            Some(w) => w,
            None => return Vec::new(),
        }
    } else {
        (MIN_COORD, MIN_COORD + FULL_SPAN)
    };
    let possible: Vec<&Shape> = store
        .dom(object.shape())
        .values()
        .filter_map(|id| shapes.get(id))
        .collect();
    if possible.is_empty() {
        return Vec::new();
    }
    let x_min: Vec<i32> = object.coords().iter().map(|&v| store.min(v)).collect();
    let x_max: Vec<i32> = object.coords().iter().map(|&v| store.max(v)).collect();

    let mut core = DBox::full(k + 1);
    for axis in (0..k).filter(|&a| selected[a]) {
        let lo = possible
            .iter()
            .map(|s| x_max[axis] + s.bounding_box().origin()[axis])
            .max()
            .unwrap_or(MIN_COORD);
        let hi = possible
            .iter()
            .map(|s| x_min[axis] + s.bounding_box().end(axis))
            .min()
            .unwrap_or(MIN_COORD);
        if lo >= hi {
            return Vec::new();
        }
        core.set_span(axis, lo, hi);
    }
    core.set_span(k, window.0, window.1);

    let holes: Vec<DBox> = possible
        .iter()
        .flat_map(|s| s.holes())
        .map(|h| {
            let mut enlarged = DBox::full(k + 1);
            for axis in (0..k).filter(|&a| selected[a]) {
                let origin = x_min[axis] + h.origin()[axis];
                let end = x_max[axis] + h.end(axis);
                enlarged.set_span(axis, origin, end);
            }
            enlarged
        })
        .collect();
    if holes.is_empty() {
        return vec![core];
    }

    let scaled_core = scale_selected(&core, selected, k);
    let scaled_holes: Vec<DBox> = holes
        .iter()
        .map(|h| {
            let mut b = scale_selected(h, selected, k);
            for axis in (0..k).filter(|&a| selected[a]) {
                let (o, e) = (b.origin()[axis], b.end(axis));
                b.set_span(axis, o - 1, e + 1);
            }
            b
        })
        .collect();

    DBox::subtract_all(std::slice::from_ref(&scaled_core), &scaled_holes)
        .into_iter()
        .filter(|p| (0..k).all(|axis| !selected[axis] || p.length()[axis] != 1))
        .filter_map(|mut p| {
            for axis in (0..k).filter(|&a| selected[a]) {
                let origin = (p.origin()[axis] + SCALE / 2).div_euclid(SCALE);
                let end = (p.end(axis) + SCALE / 2).div_euclid(SCALE);
                if end <= origin {
                    return None;
                }
                p.set_span(axis, origin, end);
            }
            Some(p)
        })
        .collect()
}

/// Scales the selected geometric axes of `b`, leaving the others untouched.
fn scale_selected(b: &DBox, selected: &[bool], k: usize) -> DBox {
    let mut out = b.clone();
    for axis in (0..k).filter(|&a| selected[a]) {
        out.set_span(axis, b.origin()[axis] * SCALE, b.end(axis) * SCALE);
    }
    out
}

// =============================================================================
// Frame shared by both obstacle generators
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Frame {
    /// Selected axes, `k + 1` entries, the last one for time.
    selected: Vec<bool>,
    pieces: Vec<DBox>,
    abs_min: Vec<i32>,
    abs_max: Vec<i32>,
    card: i64,
}

impl Frame {
    fn new(selected: Vec<bool>) -> Self {
        let dims = selected.len();
        Self {
            selected,
            pieces: Vec::new(),
            abs_min: vec![MAX_COORD; dims],
            abs_max: vec![MIN_COORD; dims],
            card: 0,
        }
    }

    fn set(&mut self, pieces: Vec<DBox>) {
        match DBox::bounding_box(&pieces) {
            Some(bb) => {
                let (lo, hi) = full_corners(bb.dimension());
                for axis in 0..bb.dimension() {
                    self.abs_min[axis] = bb.origin()[axis].max(lo[axis]);
                    self.abs_max[axis] = (bb.end(axis) - 1).min(hi[axis]);
                }
            }
            None => {
                self.abs_min.fill(MAX_COORD);
                self.abs_max.fill(MIN_COORD);
            }
        }
        self.card = pieces
            .iter()
            .map(|p| {
                (0..p.dimension())
                    .filter(|&a| self.selected[a])
                    .fold(1i64, |acc, a| acc.saturating_mul(p.length()[a] as i64))
            })
            .fold(0i64, i64::saturating_add);
        self.pieces = pieces;
    }

    #[allow(clippy::too_many_arguments)]
    fn forbidden(
        &self,
        direction: Direction,
        order: &DimensionOrder,
        object: &GeostObject,
        shape: &Shape,
        point: &[i32],
        ctx: &SweepContext<'_>,
        pool: &mut BoxPool,
    ) -> Option<DBox> {
        let k = object.dimension();
        let d_min = ctx.store.min(object.duration());
        if self.selected[k] && d_min <= 0 {
            return None;
        }
        let span = |piece: &DBox, component: &DBox, axis: usize| -> (i32, i32) {
            if !self.selected[axis] {
                (MIN_COORD, MIN_COORD + FULL_SPAN)
            } else if axis == k {
                (piece.origin()[k] - d_min + 1, piece.end(k))
            } else {
                overlapping_origins(
                    component.origin()[axis],
                    component.length()[axis],
                    piece.origin()[axis],
                    piece.length()[axis],
                )
            }
        };
        let mut best = None;
        for piece in &self.pieces {
            for component in shape.components().iter().filter(|c| !c.is_empty()) {
                let hit = (0..=k).all(|axis| {
                    let (lo, hi) = span(piece, component, axis);
                    lo <= point[axis] && point[axis] < hi
                });
                if !hit {
                    continue;
                }
                let mut candidate = pool.acquire(k + 1);
                for axis in 0..=k {
                    let (lo, hi) = span(piece, component, axis);
                    candidate.set_span(axis, lo, hi);
                }
                keep_better(direction, order, point, &mut best, candidate, pool);
            }
        }
        best
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        match direction {
            Direction::Min => &self.abs_min,
            Direction::Max => &self.abs_max,
        }
    }
}

fn selected_axes(dimension: usize, selected: &[usize]) -> Vec<bool> {
    let mut mask = vec![false; dimension + 1];
    for &axis in selected {
        mask[axis] = true;
    }
    mask
}

// =============================================================================
// Generators
// =============================================================================

/// Obstacle with a fixed shape: its frame is the set of its components
/// shrunk by the origin domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleObject {
    owner: usize,
    frame: Frame,
}

impl ObstacleObject {
    /// `owner` is the obstacle's index, `selected` the axes (time is
    /// `dimension`) on which objects must not overlap it.
    pub fn new(owner: usize, dimension: usize, selected: &[usize]) -> Self {
        Self {
            owner,
            frame: Frame::new(selected_axes(dimension, selected)),
        }
    }

    pub fn owner(&self) -> usize {
        self.owner
    }

    /// Current frame pieces.
    pub fn frame(&self) -> &[DBox] {
        &self.frame.pieces
    }
}

impl InternalConstraint for ObstacleObject {
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
        self.frame
            .forbidden(direction, order, object, shape, point, ctx, pool)
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        self.frame.abs_infeasible(direction)
    }

    fn card_infeasible(&self) -> i64 {
        self.frame.card
    }

    fn is_static(&self) -> bool {
        false
    }

    fn is_single_use(&self) -> bool {
        false
    }

    fn refresh(&mut self, ctx: &SweepContext<'_>) {
        let obstacle = &ctx.objects[self.owner];
        let k = obstacle.dimension();
        let selected = self.frame.selected.clone();
        let Some(shape) = ctx
            .store
            .value(obstacle.shape())
            .and_then(|id| ctx.shapes.get(id))
        else {
            self.frame.set(Vec::new());
            return;
        };
        let window = if selected[k] {
            time_window(obstacle, ctx.store)
        } else {
            Some((MIN_COORD, MIN_COORD + FULL_SPAN))
        };
        let Some(window) = window else {
            self.frame.set(Vec::new());
            return;
        };
        let pieces = shape
            .components()
            .iter()
            .filter_map(|c| {
                let mut piece = DBox::full(k + 1);
                for axis in (0..k).filter(|&a| selected[a]) {
                    let var = obstacle.coords()[axis];
                    let lo = ctx.store.max(var) + c.origin()[axis];
                    let hi = ctx.store.min(var) + c.end(axis);
                    if lo >= hi {
                        return None;
                    }
                    piece.set_span(axis, lo, hi);
                }
                piece.set_span(k, window.0, window.1);
                Some(piece)
            })
            .collect();
        self.frame.set(pieces);
    }
}

/// Obstacle whose shape is still open: its frame is computed by
/// [`compute_frame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObstacleFrame {
    owner: usize,
    frame: Frame,
}

impl ObstacleFrame {
    /// Same arguments as [`ObstacleObject::new`].
    pub fn new(owner: usize, dimension: usize, selected: &[usize]) -> Self {
        Self {
            owner,
            frame: Frame::new(selected_axes(dimension, selected)),
        }
    }

    pub fn owner(&self) -> usize {
        self.owner
    }

    pub fn frame(&self) -> &[DBox] {
        &self.frame.pieces
    }
}

impl InternalConstraint for ObstacleFrame {
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
        self.frame
            .forbidden(direction, order, object, shape, point, ctx, pool)
    }

    fn abs_infeasible(&self, direction: Direction) -> &[i32] {
        self.frame.abs_infeasible(direction)
    }

    fn card_infeasible(&self) -> i64 {
        self.frame.card
    }

    fn is_static(&self) -> bool {
        false
    }

    fn is_single_use(&self) -> bool {
        false
    }

    fn refresh(&mut self, ctx: &SweepContext<'_>) {
        let obstacle = &ctx.objects[self.owner];
        let pieces = compute_frame(obstacle, ctx.store, ctx.shapes, &self.frame.selected);
        self.frame.set(pieces);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::test_support::{bx, object};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const ALL: [usize; 3] = [0, 1, 2];

    fn registry() -> ShapeRegistry {
        ShapeRegistry::new(vec![
            Shape::rectangle(0, vec![1, 1]).unwrap(),
            // L: 2x1 bar plus a block on its left end.
            Shape::new(1, vec![bx(&[0, 0], &[2, 1]), bx(&[0, 1], &[1, 1])]).unwrap(),
            // U: 3x3 with the middle of the top row missing.
            Shape::new(
                2,
                vec![
                    bx(&[0, 0], &[3, 2]),
                    bx(&[0, 2], &[1, 1]),
                    bx(&[2, 2], &[1, 1]),
                ],
            )
            .unwrap(),
            Shape::rectangle(3, vec![3, 3]).unwrap(),
        ])
        .unwrap()
    }

    fn geometric(frame: &[DBox]) -> Vec<DBox> {
        frame
            .iter()
            .map(|p| bx(&p.origin()[..2], &p.length()[..2]))
            .collect()
    }

    // ── compute_frame ─────────────────────────────────────────────────

    #[test]
    fn grounded_rectangle_frame_is_itself() {
        let mut store = Store::new();
        let o = object(&mut store, (2, 2), (1, 1), &[3], (0, 0), 1);
        let frame = compute_frame(&o, &store, &registry(), &[true; 3]);
        assert_eq!(geometric(&frame), vec![bx(&[2, 1], &[3, 3])]);
        assert_eq!((frame[0].origin()[2], frame[0].end(2)), (0, 1));
    }

    #[test]
    fn moving_rectangle_frame_is_the_core() {
        let mut store = Store::new();
        let o = object(&mut store, (0, 1), (0, 2), &[3], (0, 0), 1);
        let frame = compute_frame(&o, &store, &registry(), &[true; 3]);
        assert_eq!(geometric(&frame), vec![bx(&[1, 2], &[2, 1])]);
    }

    #[test]
    fn frame_is_empty_when_core_vanishes() {
        let mut store = Store::new();
        let o = object(&mut store, (0, 5), (0, 0), &[3], (0, 0), 1);
        assert!(compute_frame(&o, &store, &registry(), &[true; 3]).is_empty());
    }

    #[test]
    fn frame_is_empty_without_guaranteed_time() {
        let mut store = Store::new();
        let o = object(&mut store, (0, 0), (0, 0), &[3], (0, 2), 1);
        assert!(compute_frame(&o, &store, &registry(), &[true; 3]).is_empty());
        // Ignoring time, the rectangle is still guaranteed.
        let frame = compute_frame(&o, &store, &registry(), &[true, true, false]);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame[0].length()[2], FULL_SPAN);
    }

    #[test]
    fn grounded_u_frame_excludes_its_notch() {
        let mut store = Store::new();
        let o = object(&mut store, (0, 0), (0, 0), &[2], (0, 0), 1);
        let frame = geometric(&compute_frame(&o, &store, &registry(), &[true; 3]));
        let covered: i64 = frame.iter().map(DBox::area).sum();
        assert_eq!(covered, 8);
        assert!(frame.iter().all(|p| !p.contains_point(&[1, 2])));
    }

    #[test]
    fn unit_sliver_between_holes_is_kept() {
        // Shape with two holes separated by a one-unit column:
        // row 1 reads "# . # . #" and only column 2 survives between holes.
        let shapes = ShapeRegistry::new(vec![Shape::new(
            0,
            vec![
                bx(&[0, 0], &[5, 1]),
                bx(&[0, 1], &[1, 1]),
                bx(&[2, 1], &[1, 1]),
                bx(&[4, 1], &[1, 1]),
                bx(&[0, 2], &[5, 1]),
            ],
        )
        .unwrap()])
        .unwrap();
        let mut store = Store::new();
        let o = object(&mut store, (0, 0), (0, 0), &[0], (0, 0), 1);
        let frame = geometric(&compute_frame(&o, &store, &shapes, &[true; 3]));
        assert_eq!(frame.iter().map(DBox::area).sum::<i64>(), 13);
        assert!(frame.iter().any(|p| p.contains_point(&[2, 1])));
    }

    /// Every frame cell is covered by every placement the domains allow.
    #[test]
    fn frame_containment_random() {
        let shapes = registry();
        let mut rng = StdRng::seed_from_u64(17);
        for _ in 0..300 {
            let mut store = Store::new();
            let x0 = rng.gen_range(0..3);
            let y0 = rng.gen_range(0..3);
            let x = (x0, x0 + rng.gen_range(0..2));
            let y = (y0, y0 + rng.gen_range(0..2));
            let mut ids: Vec<i32> = (0..4).filter(|_| rng.gen_bool(0.5)).collect();
            if ids.is_empty() {
                ids.push(rng.gen_range(0..4));
            }
            let o = object(&mut store, x, y, &ids, (0, 0), 1);
            let frame = geometric(&compute_frame(&o, &store, &shapes, &[true; 3]));
            for piece in &frame {
                for px in piece.origin()[0]..piece.end(0) {
                    for py in piece.origin()[1]..piece.end(1) {
                        for ox in x.0..=x.1 {
                            for oy in y.0..=y.1 {
                                for &id in &ids {
                                    let s = shapes.get(id).unwrap();
                                    assert!(
                                        s.covers(&[ox, oy], &[px, py]),
                                        "cell ({px}, {py}) of shape {id} at ({ox}, {oy}), x={x:?} y={y:?}"
                                    );
                                }
                            }
                        }
                    }
                }
            }
        }
    }

    // ── Generators ────────────────────────────────────────────────────

    fn setup_obstacle(store: &mut Store) -> Vec<GeostObject> {
        let obstacle = object(store, (1, 1), (1, 1), &[0], (0, 0), 1);
        let mover = object(store, (0, 3), (0, 3), &[0, 1], (0, 0), 1);
        vec![obstacle, mover]
    }

    #[test]
    fn obstacle_object_forbids_exactly_the_overlapping_origins() {
        let mut store = Store::new();
        let objects = setup_obstacle(&mut store);
        let shapes = registry();
        let ctx = SweepContext {
            store: &store,
            shapes: &shapes,
            objects: &objects,
        };
        let mut g = ObstacleObject::new(0, 2, &ALL);
        g.refresh(&ctx);
        assert_eq!(geometric(g.frame()), vec![bx(&[1, 1], &[1, 1])]);
        assert_eq!(g.card_infeasible(), 1);
        assert_eq!(g.abs_infeasible(Direction::Min), &[1, 1, 0]);
        assert_eq!(g.abs_infeasible(Direction::Max), &[1, 1, 0]);

        let mut pool = BoxPool::new();
        let order = DimensionOrder::identity(3);
        let l_shape = shapes.get(1).unwrap();
        for cx in 0..4 {
            for cy in 0..4 {
                let expected = l_shape.covers(&[cx, cy], &[1, 1]);
                let b = g.is_feasible(
                    Direction::Min,
                    &order,
                    &objects[1],
                    l_shape,
                    &[cx, cy, 0],
                    &ctx,
                    &mut pool,
                );
                assert_eq!(b.is_some(), expected, "origin ({cx}, {cy})");
                if let Some(b) = b {
                    assert!(b.contains_point(&[cx, cy, 0]));
                }
            }
        }
    }

    #[test]
    fn disjoint_time_windows_do_not_conflict() {
        let mut store = Store::new();
        let mut objects = setup_obstacle(&mut store);
        let shapes = registry();
        // Move the mover to start at 1, after the obstacle's [0, 1) window.
        let late = store.new_var(1, 1).unwrap();
        let d = store.constant(1).unwrap();
        let e = store.new_var(2, 2).unwrap();
        let coords = objects[1].coords().to_vec();
        objects[1] = GeostObject::new(1, coords, objects[1].shape(), late, d, e);
        let ctx = SweepContext {
            store: &store,
            shapes: &shapes,
            objects: &objects,
        };
        let mut g = ObstacleObject::new(0, 2, &ALL);
        g.refresh(&ctx);
        let mut pool = BoxPool::new();
        let order = DimensionOrder::identity(3);
        let square = shapes.get(0).unwrap();
        assert!(g
            .is_feasible(Direction::Min, &order, &objects[1], square, &[1, 1, 1], &ctx, &mut pool)
            .is_none());
        assert!(g
            .is_feasible(Direction::Min, &order, &objects[1], square, &[1, 1, 0], &ctx, &mut pool)
            .is_some());

        // Without the time axis the same placement conflicts.
        let mut g = ObstacleObject::new(0, 2, &[0, 1]);
        g.refresh(&ctx);
        assert!(g
            .is_feasible(Direction::Min, &order, &objects[1], square, &[1, 1, 1], &ctx, &mut pool)
            .is_some());
    }

    #[test]
    fn obstacle_frame_refresh_tracks_domains() {
        let mut store = Store::new();
        let obstacle = object(&mut store, (0, 1), (0, 0), &[0, 3], (0, 0), 1);
        let objects = vec![obstacle];
        let shapes = registry();
        let mut g = ObstacleFrame::new(0, 2, &ALL);
        g.refresh(&SweepContext {
            store: &store,
            shapes: &shapes,
            objects: &objects,
        });
        // The unit square at x = 0 and x = 1 share nothing.
        assert!(g.frame().is_empty());
        assert_eq!(g.card_infeasible(), 0);

        store.in_value(objects[0].coords()[0], 1).unwrap();
        g.refresh(&SweepContext {
            store: &store,
            shapes: &shapes,
            objects: &objects,
        });
        assert_eq!(geometric(g.frame()), vec![bx(&[1, 0], &[1, 1])]);
    }
}
