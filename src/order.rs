//! Lexicographic orders over the axes of the sweep space.

use std::cmp::Ordering;

/// Permutation of the `k + 1` axes driving the sweep.
///
/// `master` is the order chosen at construction. Setting a most significant
/// dimension moves that axis to the front and keeps the relative order of
/// the others, which is how the sweep focuses on the axis being pruned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DimensionOrder {
    master: Vec<usize>,
    current: Vec<usize>,
    /// `rank[axis]` is the position of `axis` in `current`.
    rank: Vec<usize>,
}

impl DimensionOrder {
    /// Identity order `0, 1, ..., dimension - 1`.
    pub fn identity(dimension: usize) -> Self {
        Self::from_master((0..dimension).collect())
    }

    /// Order from an explicit permutation, or `None` if `master` is not a
    /// permutation of `0..master.len()`.
    pub fn new(master: Vec<usize>) -> Option<Self> {
        let mut seen = vec![false; master.len()];
        for &axis in &master {
            if axis >= master.len() || std::mem::replace(&mut seen[axis], true) {
                return None;
            }
        }
        Some(Self::from_master(master))
    }

    fn from_master(master: Vec<usize>) -> Self {
        let current = master.clone();
        let mut rank = vec![0; master.len()];
        for (pos, &axis) in current.iter().enumerate() {
            rank[axis] = pos;
        }
        Self {
            master,
            current,
            rank,
        }
    }

    pub fn dimension(&self) -> usize {
        self.master.len()
    }

    /// Makes `axis` the most significant one.
    pub fn set_most_significant(&mut self, axis: usize) {
        debug_assert!(axis < self.dimension());
        self.current.clear();
        self.current.push(axis);
        self.current
            .extend(self.master.iter().copied().filter(|&a| a != axis));
        for (pos, &a) in self.current.iter().enumerate() {
            self.rank[a] = pos;
        }
    }

    pub fn most_significant(&self) -> usize {
        self.current[0]
    }

    /// Axis at `position`, 0 being the most significant.
    pub fn dimension_at(&self, position: usize) -> usize {
        self.current[position]
    }

    /// Position of `axis` in the current order.
    pub fn precedence_of(&self, axis: usize) -> usize {
        self.rank[axis]
    }

    /// Axes from the least significant to the most significant.
    pub fn least_significant_first(&self) -> impl Iterator<Item = usize> + '_ {
        self.current.iter().rev().copied()
    }

    pub fn master(&self) -> &[usize] {
        &self.master
    }

    /// Lexicographic comparison of two points under the current order.
    pub fn compare(&self, a: &[i32], b: &[i32]) -> Ordering {
        self.current
            .iter()
            .map(|&axis| a[axis].cmp(&b[axis]))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}
