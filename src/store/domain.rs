//! Integer domains as canonical sets of closed intervals.
//!
//! [`IntDomain`] wraps a `Vec<Interval>` and keeps the **canonical invariant**
//! at all times: intervals are sorted by `min`, disjoint, and never adjacent
//! (`[1, 2]` and `[3, 4]` are stored as `[1, 4]`).

use std::fmt::Display;
use std::ops::Deref;

use super::{MAX_COORD, MIN_COORD};

/// Closed integer range `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub min: i32,
    pub max: i32,
}

impl Interval {
    /// Creates `[min, max]`.
    ///
    /// # Panics
    ///
    /// Panics if `min > max`.
    pub const fn new(min: i32, max: i32) -> Self {
        assert!(min <= max, "Interval min must be <= max");
        Self { min, max }
    }

    pub const fn contains(&self, value: i32) -> bool {
        self.min <= value && value <= self.max
    }

    pub const fn size(&self) -> u64 {
        (self.max as i64 - self.min as i64 + 1) as u64
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

/// Finite integer domain.
///
/// Read access to the underlying intervals goes through
/// `Deref<Target = [Interval]>`. Every operation returns a new domain so that
/// the store can keep the previous one on its trail.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IntDomain(Vec<Interval>);

impl IntDomain {
    /// The empty domain.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// `[min, max]`, or the empty domain when `min > max`.
    pub fn from_range(min: i32, max: i32) -> Self {
        if min > max {
            Self::empty()
        } else {
            Self(vec![Interval::new(min, max)])
        }
    }

    /// Builds a domain from arbitrary values (duplicates allowed).
    pub fn from_values(values: &[i32]) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let mut intervals: Vec<Interval> = Vec::new();
        for v in sorted {
            if let Some(last) = intervals.last_mut() {
                if last.max.checked_add(1) == Some(v) {
                    last.max = v;
                    continue;
                }
            }
            intervals.push(Interval::new(v, v));
        }
        Self(intervals)
    }

    /// Wraps intervals that are **already canonical**.
    ///
    /// In debug builds this asserts the invariant.
    fn from_canonical(intervals: Vec<Interval>) -> Self {
        debug_assert!(
            is_canonical(&intervals),
            "IntDomain::from_canonical called with non-canonical input"
        );
        Self(intervals)
    }

    /// Smallest value.
    ///
    /// # Panics
    ///
    /// Panics on the empty domain. The store never holds one.
    pub fn min(&self) -> i32 {
        self.0[0].min
    }

    /// Largest value.
    ///
    /// # Panics
    ///
    /// Panics on the empty domain.
    pub fn max(&self) -> i32 {
        self.0[self.0.len() - 1].max
    }

    /// Number of values.
    pub fn size(&self) -> u64 {
        self.0.iter().map(Interval::size).sum()
    }

    pub fn is_singleton(&self) -> bool {
        self.0.len() == 1 && self.0[0].min == self.0[0].max
    }

    /// The value of a singleton domain.
    pub fn value(&self) -> Option<i32> {
        self.is_singleton().then(|| self.0[0].min)
    }

    /// Binary search for membership, O(log n).
    pub fn contains(&self, value: i32) -> bool {
        let idx = self.0.partition_point(|i| i.max < value);
        self.0.get(idx).is_some_and(|i| i.contains(value))
    }

    /// Iterates over every value in increasing order.
    pub fn values(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().flat_map(|i| i.min..=i.max)
    }

    /// Restricts the domain to `[min, max]`.
    pub fn restrict(&self, min: i32, max: i32) -> Self {
        if min > max {
            return Self::empty();
        }
        let intervals = self
            .0
            .iter()
            .filter(|i| i.max >= min && i.min <= max)
            .map(|i| Interval::new(i.min.max(min), i.max.min(max)))
            .collect();
        Self::from_canonical(intervals)
    }

    /// Removes one value.
    pub fn remove(&self, value: i32) -> Self {
        let mut intervals = Vec::with_capacity(self.0.len() + 1);
        for i in &self.0 {
            if !i.contains(value) {
                intervals.push(*i);
                continue;
            }
            if i.min < value {
                intervals.push(Interval::new(i.min, value - 1));
            }
            if value < i.max {
                intervals.push(Interval::new(value + 1, i.max));
            }
        }
        Self::from_canonical(intervals)
    }

    /// Intersection of two domains, by a linear merge.
    pub fn intersection(&self, other: &IntDomain) -> Self {
        let (a, b) = (&self.0, &other.0);
        let (mut i, mut j) = (0, 0);
        let mut intervals = Vec::new();
        while i < a.len() && j < b.len() {
            let lo = a[i].min.max(b[j].min);
            let hi = a[i].max.min(b[j].max);
            if lo <= hi {
                intervals.push(Interval::new(lo, hi));
            }
            if a[i].max < b[j].max {
                i += 1;
            } else {
                j += 1;
            }
        }
        Self::from_canonical(intervals)
    }

    /// Returns the maximal gap `[lo, hi]` of missing values around `value`.
    ///
    /// `None` when `value` belongs to the domain. Below the minimum the gap
    /// starts at [`MIN_COORD`], above the maximum it ends at [`MAX_COORD`].
    pub fn gap_around(&self, value: i32) -> Option<(i32, i32)> {
        let idx = self.0.partition_point(|i| i.max < value);
        if self.0.get(idx).is_some_and(|i| i.contains(value)) {
            return None;
        }
        let lo = if idx == 0 {
            MIN_COORD
        } else {
            self.0[idx - 1].max + 1
        };
        let hi = self.0.get(idx).map_or(MAX_COORD, |i| i.min - 1);
        Some((lo.min(value), hi.max(value)))
    }

    pub fn as_slice(&self) -> &[Interval] {
        &self.0
    }
}

impl Deref for IntDomain {
    type Target = [Interval];

    fn deref(&self) -> &[Interval] {
        &self.0
    }
}

impl Display for IntDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, interval) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", interval)?;
        }
        write!(f, "}}")
    }
}

/// Sorted, disjoint and non-adjacent.
fn is_canonical(intervals: &[Interval]) -> bool {
    intervals
        .windows(2)
        .all(|w| (w[0].max as i64) + 1 < w[1].min as i64)
}
