//! Axis-aligned half-open boxes and their algebra.

use std::fmt::Display;

use crate::error::GeostError;
use crate::store::{MAX_COORD, MIN_COORD};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Length of an axis spanning the whole coordinate range.
pub const FULL_SPAN: i32 = MAX_COORD - MIN_COORD + 1;

/// Axis-aligned box `[origin_i, origin_i + length_i)` on every axis.
///
/// Boxes of the engine have `k + 1` axes: the `k` geometric axes followed by
/// time. Shape components and areas have `k` axes.
///
/// # Invariants
///
/// - `origin.len() == length.len()`
/// - every length is non-negative
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DBox {
    origin: Vec<i32>,
    length: Vec<i32>,
}

impl DBox {
    /// Creates a box, checking arity and lengths.
    pub fn new(origin: Vec<i32>, length: Vec<i32>) -> Result<Self, GeostError> {
        let b = Self { origin, length };
        b.validate()?;
        Ok(b)
    }

    /// Box at the origin with zero lengths.
    pub fn zeroed(dimension: usize) -> Self {
        Self {
            origin: vec![0; dimension],
            length: vec![0; dimension],
        }
    }

    /// Box covering the whole coordinate range on every axis.
    pub fn full(dimension: usize) -> Self {
        Self {
            origin: vec![MIN_COORD; dimension],
            length: vec![FULL_SPAN; dimension],
        }
    }

    /// Checks the structural invariants.
    pub fn validate(&self) -> Result<(), GeostError> {
        if self.origin.len() != self.length.len() {
            return Err(GeostError::DimensionMismatch {
                expected: self.origin.len(),
                found: self.length.len(),
            });
        }
        if self.origin.is_empty() {
            return Err(GeostError::InvalidDimension(0));
        }
        if let Some(axis) = self.length.iter().position(|&l| l < 0) {
            return Err(GeostError::NegativeLength {
                axis,
                length: self.length[axis],
            });
        }
        // Origins and ends stay inside [MIN_COORD, MAX_COORD + 1].
        for (&o, &l) in self.origin.iter().zip(&self.length) {
            let end = o as i64 + l as i64;
            if o < MIN_COORD {
                return Err(GeostError::CoordinateOutOfRange(o as i64));
            }
            if end > MAX_COORD as i64 + 1 {
                return Err(GeostError::CoordinateOutOfRange(end));
            }
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.origin.len()
    }

    pub fn origin(&self) -> &[i32] {
        &self.origin
    }

    pub fn length(&self) -> &[i32] {
        &self.length
    }

    /// Exclusive end on `axis`.
    pub fn end(&self, axis: usize) -> i32 {
        self.origin[axis] + self.length[axis]
    }

    /// Overwrites one axis with `[origin, end)`.
    ///
    /// A negative span is clamped to an empty axis.
    pub fn set_span(&mut self, axis: usize, origin: i32, end: i32) {
        self.origin[axis] = origin;
        self.length[axis] = (end - origin).max(0);
    }

    /// Copies `other` into `self`, reusing the allocation.
    pub fn copy_from(&mut self, other: &DBox) {
        self.origin.clone_from(&other.origin);
        self.length.clone_from(&other.length);
    }

    /// True when some axis has zero length.
    pub fn is_empty(&self) -> bool {
        self.length.iter().any(|&l| l == 0)
    }

    /// Half-open point membership.
    pub fn contains_point(&self, point: &[i32]) -> bool {
        debug_assert_eq!(point.len(), self.dimension());
        point
            .iter()
            .enumerate()
            .all(|(i, &p)| self.origin[i] <= p && p < self.end(i))
    }

    /// True when `other` lies entirely inside `self`.
    pub fn contains_box(&self, other: &DBox) -> bool {
        debug_assert_eq!(other.dimension(), self.dimension());
        (0..self.dimension())
            .all(|i| self.origin[i] <= other.origin[i] && other.end(i) <= self.end(i))
    }

    /// Intersection, or `None` when no integer point is shared.
    pub fn intersect(&self, other: &DBox) -> Option<DBox> {
        let mut out = DBox::zeroed(self.dimension());
        self.intersect_into(other, &mut out).then_some(out)
    }

    /// Writes the intersection into `out`; returns `false` (leaving `out`
    /// unspecified) when the boxes do not intersect.
    pub fn intersect_into(&self, other: &DBox, out: &mut DBox) -> bool {
        debug_assert_eq!(other.dimension(), self.dimension());
        debug_assert_eq!(out.dimension(), self.dimension());
        for i in 0..self.dimension() {
            let lo = self.origin[i].max(other.origin[i]);
            let hi = self.end(i).min(other.end(i));
            if hi <= lo {
                return false;
            }
            out.origin[i] = lo;
            out.length[i] = hi - lo;
        }
        true
    }

    /// Intersection of `self` translated by `offset` with `other`.
    pub fn intersect_offset(&self, offset: &[i32], other: &DBox) -> Option<DBox> {
        debug_assert_eq!(offset.len(), self.dimension());
        let mut out = DBox::zeroed(self.dimension());
        for i in 0..self.dimension() {
            let lo = (self.origin[i] + offset[i]).max(other.origin[i]);
            let hi = (self.end(i) + offset[i]).min(other.end(i));
            if hi <= lo {
                return None;
            }
            out.origin[i] = lo;
            out.length[i] = hi - lo;
        }
        Some(out)
    }

    /// True when the boxes share at least one integer point.
    pub fn intersects(&self, other: &DBox) -> bool {
        (0..self.dimension())
            .all(|i| self.origin[i].max(other.origin[i]) < self.end(i).min(other.end(i)))
    }

    /// Decomposes `self \ hole` into at most `2 * dimension` disjoint boxes.
    pub fn subtract(&self, hole: &DBox) -> Vec<DBox> {
        let mut out = Vec::with_capacity(2 * self.dimension());
        self.subtract_into(hole, &mut out);
        out
    }

    /// Appends the pieces of `self \ hole` to `out`.
    ///
    /// The working box `[lower, upper)` starts as `self` and shrinks towards
    /// the hole one axis at a time; the slices cut off on each side are the
    /// emitted pieces.
    pub fn subtract_into(&self, hole: &DBox, out: &mut Vec<DBox>) {
        debug_assert_eq!(hole.dimension(), self.dimension());
        if !self.intersects(hole) {
            out.push(self.clone());
            return;
        }
        let dimension = self.dimension();
        let mut lower = self.origin.clone();
        let mut upper: Vec<i32> = (0..dimension).map(|i| self.end(i)).collect();
        for axis in 0..dimension {
            if hole.origin[axis] > lower[axis] {
                let mut before = self.working_box(&lower, &upper);
                before.set_span(axis, lower[axis], hole.origin[axis]);
                out.push(before);
                lower[axis] = hole.origin[axis];
            }
            if hole.end(axis) < upper[axis] {
                let mut after = self.working_box(&lower, &upper);
                after.set_span(axis, hole.end(axis), upper[axis]);
                out.push(after);
                upper[axis] = hole.end(axis);
            }
        }
    }

    fn working_box(&self, lower: &[i32], upper: &[i32]) -> DBox {
        let mut b = DBox::zeroed(self.dimension());
        for i in 0..self.dimension() {
            b.set_span(i, lower[i], upper[i]);
        }
        b
    }

    /// Subtracts every hole from every box.
    ///
    /// Each round subtracts one hole from the whole working collection,
    /// swapping between two buffers; stops early once nothing is left.
    /// Pieces of one input box are disjoint; the decomposition is not
    /// minimal.
    pub fn subtract_all(boxes: &[DBox], holes: &[DBox]) -> Vec<DBox> {
        let mut current: Vec<DBox> = boxes.to_vec();
        let mut next: Vec<DBox> = Vec::with_capacity(current.len());
        for hole in holes {
            if current.is_empty() {
                break;
            }
            next.clear();
            for b in current.drain(..) {
                if b.intersects(hole) {
                    b.subtract_into(hole, &mut next);
                } else {
                    next.push(b);
                }
            }
            std::mem::swap(&mut current, &mut next);
        }
        current
    }

    /// Smallest box containing every box of `boxes`.
    pub fn bounding_box(boxes: &[DBox]) -> Option<DBox> {
        let (first, rest) = boxes.split_first()?;
        let dimension = first.dimension();
        let mut lo = first.origin.clone();
        let mut hi: Vec<i32> = (0..dimension).map(|i| first.end(i)).collect();
        for b in rest {
            debug_assert_eq!(b.dimension(), dimension);
            for i in 0..dimension {
                lo[i] = lo[i].min(b.origin[i]);
                hi[i] = hi[i].max(b.end(i));
            }
        }
        let length = lo.iter().zip(&hi).map(|(l, h)| h - l).collect();
        Some(DBox { origin: lo, length })
    }

    /// Product of the lengths.
    pub fn area(&self) -> i64 {
        self.length.iter().map(|&l| l as i64).product()
    }

    /// Multiplies origin and length by `factor`.
    pub fn scaled(&self, factor: i32) -> DBox {
        DBox {
            origin: self.origin.iter().map(|o| o * factor).collect(),
            length: self.length.iter().map(|l| l * factor).collect(),
        }
    }

    /// Shifts the box by `offset`.
    pub fn translated(&self, offset: &[i32]) -> DBox {
        debug_assert_eq!(offset.len(), self.dimension());
        DBox {
            origin: self.origin.iter().zip(offset).map(|(o, d)| o + d).collect(),
            length: self.length.clone(),
        }
    }
}

impl Display for DBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.dimension() {
            if i > 0 {
                write!(f, "x")?;
            }
            write!(f, "[{}, {})", self.origin[i], self.end(i))?;
        }
        Ok(())
    }
}

// =============================================================================
// DBox Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for DBox {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            origin: Vec<i32>,
            length: Vec<i32>,
        }

        let raw = Raw::deserialize(deserializer)?;
        DBox::new(raw.origin, raw.length).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn bx(origin: &[i32], length: &[i32]) -> DBox {
        DBox::new(origin.to_vec(), length.to_vec()).unwrap()
    }

    fn grid_points(lo: i32, hi: i32) -> impl Iterator<Item = [i32; 2]> {
        (lo..hi).flat_map(move |x| (lo..hi).map(move |y| [x, y]))
    }

    fn random_box(rng: &mut StdRng) -> DBox {
        bx(
            &[rng.gen_range(0..6), rng.gen_range(0..6)],
            &[rng.gen_range(0..5), rng.gen_range(0..5)],
        )
    }

    // ── Construction ──────────────────────────────────────────────────

    #[test]
    fn new_rejects_negative_length() {
        assert_eq!(
            DBox::new(vec![0, 0], vec![1, -2]),
            Err(GeostError::NegativeLength { axis: 1, length: -2 })
        );
    }

    #[test]
    fn new_rejects_arity_mismatch() {
        assert_eq!(
            DBox::new(vec![0, 0], vec![1]),
            Err(GeostError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn new_rejects_boxes_outside_the_coordinate_range() {
        assert_eq!(
            DBox::new(vec![0, i32::MAX - 1], vec![1, 5]),
            Err(GeostError::CoordinateOutOfRange(i32::MAX as i64 + 4))
        );
        assert_eq!(
            DBox::new(vec![MIN_COORD - 1], vec![1]),
            Err(GeostError::CoordinateOutOfRange(MIN_COORD as i64 - 1))
        );
        assert!(DBox::full(2).validate().is_ok());
        assert!(DBox::new(vec![MAX_COORD], vec![1]).is_ok());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn deserialize_validates() {
        let ok: DBox = serde_json::from_str(r#"{"origin": [1, 2], "length": [3, 4]}"#).unwrap();
        assert_eq!(ok, bx(&[1, 2], &[3, 4]));
        let far = serde_json::from_str::<DBox>(r#"{"origin": [2147483000], "length": [1]}"#);
        assert!(far.is_err());
        let negative = serde_json::from_str::<DBox>(r#"{"origin": [0], "length": [-1]}"#);
        assert!(negative.is_err());
    }

    #[test]
    fn contains_point_is_half_open() {
        let b = bx(&[1, 1], &[2, 1]);
        assert!(b.contains_point(&[1, 1]));
        assert!(b.contains_point(&[2, 1]));
        assert!(!b.contains_point(&[3, 1]));
        assert!(!b.contains_point(&[1, 2]));
    }

    #[test]
    fn area_and_bounding_box() {
        let boxes = [bx(&[0, 0], &[2, 1]), bx(&[3, 2], &[1, 2])];
        let bb = DBox::bounding_box(&boxes).unwrap();
        assert_eq!(bb, bx(&[0, 0], &[4, 4]));
        assert_eq!(bb.area(), 16);
        assert!(DBox::bounding_box(&[]).is_none());
    }

    // ── Intersection ──────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let a = bx(&[0, 0], &[3, 3]);
        let b = bx(&[2, 1], &[3, 1]);
        assert_eq!(a.intersect(&b), Some(bx(&[2, 1], &[1, 1])));
    }

    #[test]
    fn intersect_touching_is_none() {
        let a = bx(&[0, 0], &[2, 2]);
        let b = bx(&[2, 0], &[2, 2]);
        assert_eq!(a.intersect(&b), None);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn intersect_offset_translates_first_box() {
        let component = bx(&[0, 0], &[1, 1]);
        let area = bx(&[3, 3], &[2, 2]);
        assert_eq!(component.intersect_offset(&[0, 0], &area), None);
        assert_eq!(
            component.intersect_offset(&[3, 4], &area),
            Some(bx(&[3, 4], &[1, 1]))
        );
    }

    #[test]
    fn intersection_is_symmetric_and_exact() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let a = random_box(&mut rng);
            let b = random_box(&mut rng);
            let ab = a.intersect(&b);
            assert_eq!(ab, b.intersect(&a));
            let shared = grid_points(-1, 12)
                .any(|p| a.contains_point(&p) && b.contains_point(&p));
            assert_eq!(ab.is_some(), shared, "a={a} b={b}");
        }
    }

    // ── Subtraction ───────────────────────────────────────────────────

    #[test]
    fn subtract_disjoint_hole_returns_self() {
        let b = bx(&[0, 0], &[2, 2]);
        assert_eq!(b.subtract(&bx(&[5, 5], &[1, 1])), vec![b.clone()]);
    }

    #[test]
    fn subtract_center_hole_yields_four_pieces() {
        let b = bx(&[0, 0], &[3, 3]);
        let pieces = b.subtract(&bx(&[1, 1], &[1, 1]));
        assert_eq!(pieces.len(), 4);
        assert_eq!(pieces.iter().map(DBox::area).sum::<i64>(), 8);
    }

    #[test]
    fn subtract_covering_hole_is_empty() {
        let b = bx(&[1, 1], &[1, 1]);
        assert!(b.subtract(&bx(&[0, 0], &[3, 3])).is_empty());
    }

    #[test]
    fn subtract_pieces_partition_difference() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..300 {
            let b = random_box(&mut rng);
            let hole = random_box(&mut rng);
            let pieces = b.subtract(&hole);
            assert!(pieces.len() <= 4);
            for p in grid_points(-1, 12) {
                let expected = b.contains_point(&p) && !hole.contains_point(&p);
                let covering = pieces.iter().filter(|q| q.contains_point(&p)).count();
                assert_eq!(covering, usize::from(expected), "b={b} hole={hole} p={p:?}");
            }
        }
    }

    #[test]
    fn subtract_all_covers_difference_of_unions() {
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..100 {
            let boxes = vec![random_box(&mut rng)];
            let holes: Vec<DBox> = (0..3).map(|_| random_box(&mut rng)).collect();
            let pieces = DBox::subtract_all(&boxes, &holes);
            for p in grid_points(-1, 12) {
                let expected = boxes.iter().any(|b| b.contains_point(&p))
                    && !holes.iter().any(|h| h.contains_point(&p));
                let covering = pieces.iter().filter(|q| q.contains_point(&p)).count();
                assert_eq!(covering, usize::from(expected));
            }
        }
    }

    #[test]
    fn subtract_all_stops_when_empty() {
        let boxes = [bx(&[0, 0], &[1, 1])];
        let holes = [bx(&[0, 0], &[2, 2]), bx(&[0, 0], &[1, 1])];
        assert!(DBox::subtract_all(&boxes, &holes).is_empty());
    }

    // ── Helpers ───────────────────────────────────────────────────────

    #[test]
    fn scaled_and_translated() {
        let b = bx(&[1, -1], &[2, 3]);
        assert_eq!(b.scaled(4), bx(&[4, -4], &[8, 12]));
        assert_eq!(b.translated(&[2, 2]), bx(&[3, 1], &[2, 3]));
    }

    #[test]
    fn display_format() {
        assert_eq!(bx(&[0, 1], &[2, 3]).to_string(), "[0, 2)x[1, 4)");
    }
}
