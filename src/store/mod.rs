//! Minimal finite-domain store: integer variables, a per-level trail and
//! change events.
//!
//! The store plays the role of the host solver's variable layer. It only
//! offers what the geometric engine relies on:
//!
//! - domain reads (`min`, `max`, gaps, singleton checks),
//! - monotone domain reductions that fail on wipe-out,
//! - decision levels whose removal restores every domain touched since,
//! - a queue of changed variables the host forwards to its propagators.

mod domain;

pub use domain::{IntDomain, Interval};

use std::fmt::Display;

use crate::error::{GeostError, Inconsistency};

/// Smallest coordinate a variable may take.
pub const MIN_COORD: i32 = -10_000_000;

/// Largest coordinate a variable may take.
pub const MAX_COORD: i32 = 10_000_000;

/// Handle to a variable of a [`Store`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Domains plus the trail that undoes their reductions level by level.
///
/// # Invariants
///
/// - No stored domain is ever empty: a reduction that would empty a domain
///   returns [`Inconsistency::EmptyDomain`] and leaves the domain unchanged.
/// - `trail[l - 1]` holds the domains saved before their first change at
///   level `l`; level 0 changes are permanent.
#[derive(Debug, Clone, Default)]
pub struct Store {
    domains: Vec<IntDomain>,
    trail: Vec<Vec<(VarId, IntDomain)>>,
    /// Level at which each variable was last saved on the trail.
    saved_at: Vec<usize>,
    events: Vec<VarId>,
    queued: Vec<bool>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a variable with domain `[min, max]`.
    pub fn new_var(&mut self, min: i32, max: i32) -> Result<VarId, GeostError> {
        if min > max {
            return Err(GeostError::EmptyDomain);
        }
        self.push_domain(IntDomain::from_range(min, max))
    }

    /// Creates a variable whose domain is exactly `values`.
    pub fn new_var_from_values(&mut self, values: &[i32]) -> Result<VarId, GeostError> {
        let domain = IntDomain::from_values(values);
        if domain.is_empty() {
            return Err(GeostError::EmptyDomain);
        }
        self.push_domain(domain)
    }

    /// Creates a variable fixed to `value`.
    pub fn constant(&mut self, value: i32) -> Result<VarId, GeostError> {
        self.new_var(value, value)
    }

    fn push_domain(&mut self, domain: IntDomain) -> Result<VarId, GeostError> {
        for bound in [domain.min(), domain.max()] {
            if !(MIN_COORD..=MAX_COORD).contains(&bound) {
                return Err(GeostError::CoordinateOutOfRange(bound as i64));
            }
        }
        let id = VarId(self.domains.len());
        self.domains.push(domain);
        self.saved_at.push(0);
        self.queued.push(false);
        Ok(id)
    }

    pub fn var_count(&self) -> usize {
        self.domains.len()
    }

    pub fn dom(&self, var: VarId) -> &IntDomain {
        &self.domains[var.0]
    }

    pub fn min(&self, var: VarId) -> i32 {
        self.domains[var.0].min()
    }

    pub fn max(&self, var: VarId) -> i32 {
        self.domains[var.0].max()
    }

    pub fn is_singleton(&self, var: VarId) -> bool {
        self.domains[var.0].is_singleton()
    }

    pub fn value(&self, var: VarId) -> Option<i32> {
        self.domains[var.0].value()
    }

    /// Current decision level (0 is the root).
    pub fn level(&self) -> usize {
        self.trail.len()
    }

    /// Opens a new decision level.
    pub fn increase_level(&mut self) {
        self.trail.push(Vec::new());
    }

    /// Restores every domain changed at the current level and drops pending
    /// events. Returns the level that was removed, or `None` at the root.
    pub fn remove_level(&mut self) -> Option<usize> {
        let level = self.level();
        let saved = self.trail.pop()?;
        for (var, domain) in saved.into_iter().rev() {
            self.domains[var.0] = domain;
            self.saved_at[var.0] = 0;
        }
        for var in self.events.drain(..) {
            self.queued[var.0] = false;
        }
        Some(level)
    }

    /// Restricts `var` to `[min, max]`. Returns whether the domain changed.
    pub fn in_interval(&mut self, var: VarId, min: i32, max: i32) -> Result<bool, Inconsistency> {
        let current = &self.domains[var.0];
        if current.min() >= min && current.max() <= max {
            return Ok(false);
        }
        let reduced = current.restrict(min, max);
        self.update(var, reduced)
    }

    /// Fixes `var` to `value`.
    pub fn in_value(&mut self, var: VarId, value: i32) -> Result<bool, Inconsistency> {
        self.in_interval(var, value, value)
    }

    /// Removes `value` from the domain of `var`.
    pub fn remove_value(&mut self, var: VarId, value: i32) -> Result<bool, Inconsistency> {
        if !self.domains[var.0].contains(value) {
            return Ok(false);
        }
        let reduced = self.domains[var.0].remove(value);
        self.update(var, reduced)
    }

    fn update(&mut self, var: VarId, reduced: IntDomain) -> Result<bool, Inconsistency> {
        if reduced.is_empty() {
            return Err(Inconsistency::EmptyDomain { var });
        }
        if reduced == self.domains[var.0] {
            return Ok(false);
        }
        let level = self.level();
        if level > 0 && self.saved_at[var.0] != level {
            let old = std::mem::replace(&mut self.domains[var.0], reduced);
            self.trail[level - 1].push((var, old));
            self.saved_at[var.0] = level;
        } else {
            self.domains[var.0] = reduced;
        }
        if !self.queued[var.0] {
            self.queued[var.0] = true;
            self.events.push(var);
        }
        Ok(true)
    }

    /// Drains the variables changed since the last call, in change order.
    pub fn take_events(&mut self) -> Vec<VarId> {
        let events = std::mem::take(&mut self.events);
        for var in &events {
            self.queued[var.0] = false;
        }
        events
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_var_rejects_empty_and_out_of_range() {
        let mut store = Store::new();
        assert_eq!(store.new_var(3, 1), Err(GeostError::EmptyDomain));
        assert_eq!(
            store.new_var(0, MAX_COORD + 1),
            Err(GeostError::CoordinateOutOfRange(MAX_COORD as i64 + 1))
        );
        assert_eq!(store.new_var_from_values(&[]), Err(GeostError::EmptyDomain));
    }

    #[test]
    fn in_interval_reports_change_and_event() {
        let mut store = Store::new();
        let x = store.new_var(0, 10).unwrap();
        assert_eq!(store.in_interval(x, 2, 20), Ok(true));
        assert_eq!(store.in_interval(x, 0, 10), Ok(false));
        assert_eq!((store.min(x), store.max(x)), (2, 10));
        assert_eq!(store.take_events(), vec![x]);
        assert!(store.take_events().is_empty());
    }

    #[test]
    fn wipe_out_fails_without_mutation() {
        let mut store = Store::new();
        let x = store.new_var(0, 3).unwrap();
        assert_eq!(
            store.in_interval(x, 5, 6),
            Err(Inconsistency::EmptyDomain { var: x })
        );
        assert_eq!(store.dom(x).size(), 4);
    }

    #[test]
    fn remove_value_keeps_bounds() {
        let mut store = Store::new();
        let x = store.new_var(0, 3).unwrap();
        assert_eq!(store.remove_value(x, 1), Ok(true));
        assert_eq!(store.remove_value(x, 1), Ok(false));
        assert_eq!((store.min(x), store.max(x)), (0, 3));
        assert!(!store.dom(x).contains(1));
    }

    #[test]
    fn remove_level_restores_domains() {
        let mut store = Store::new();
        let x = store.new_var(0, 9).unwrap();
        let y = store.new_var(0, 9).unwrap();
        store.in_interval(x, 1, 9).unwrap();

        store.increase_level();
        store.in_interval(x, 3, 9).unwrap();
        store.in_interval(x, 3, 5).unwrap();
        store.in_value(y, 4).unwrap();

        store.increase_level();
        store.in_value(x, 5).unwrap();

        assert_eq!(store.remove_level(), Some(2));
        assert_eq!((store.min(x), store.max(x)), (3, 5));
        assert_eq!(store.remove_level(), Some(1));
        assert_eq!((store.min(x), store.max(x)), (1, 9));
        assert_eq!((store.min(y), store.max(y)), (0, 9));
        assert_eq!(store.remove_level(), None);
        assert_eq!(store.level(), 0);
    }

    #[test]
    fn level_can_be_reopened_after_removal() {
        let mut store = Store::new();
        let x = store.new_var(0, 9).unwrap();
        store.increase_level();
        store.in_value(x, 2).unwrap();
        store.remove_level();
        store.increase_level();
        store.in_value(x, 7).unwrap();
        store.remove_level();
        assert_eq!((store.min(x), store.max(x)), (0, 9));
    }

    #[test]
    fn remove_level_drops_pending_events() {
        let mut store = Store::new();
        let x = store.new_var(0, 9).unwrap();
        store.increase_level();
        store.in_value(x, 2).unwrap();
        assert!(store.has_events());
        store.remove_level();
        assert!(!store.has_events());
    }
}
