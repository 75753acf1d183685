//! The per-object time relation `start + duration = end`.

use crate::error::Inconsistency;
use crate::store::{Store, VarId};

/// Bounds propagation of `start + duration = end` with `duration >= 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBoundConstraint {
    start: VarId,
    duration: VarId,
    end: VarId,
}

impl TimeBoundConstraint {
    pub const fn new(start: VarId, duration: VarId, end: VarId) -> Self {
        Self {
            start,
            duration,
            end,
        }
    }

    /// Narrows the three bounds until nothing changes or `max_iterations`
    /// rounds have run. Returns whether any domain changed.
    pub fn consistency(&self, store: &mut Store, max_iterations: usize) -> Result<bool, Inconsistency> {
        let mut changed = store.in_interval(self.duration, 0, i32::MAX)?;
        for _ in 0..max_iterations.max(1) {
            let (s_min, s_max) = (store.min(self.start), store.max(self.start));
            let (d_min, d_max) = (store.min(self.duration), store.max(self.duration));
            let mut round = store.in_interval(self.end, s_min + d_min, s_max + d_max)?;

            let (e_min, e_max) = (store.min(self.end), store.max(self.end));
            round |= store.in_interval(self.start, e_min - d_max, e_max - d_min)?;

            let (s_min, s_max) = (store.min(self.start), store.max(self.start));
            round |= store.in_interval(self.duration, e_min - s_max, e_max - s_min)?;

            changed |= round;
            if !round {
                break;
            }
        }
        Ok(changed)
    }

    /// True when all three variables are fixed and the relation holds.
    pub fn satisfied(&self, store: &Store) -> bool {
        match (
            store.value(self.start),
            store.value(self.duration),
            store.value(self.end),
        ) {
            (Some(s), Some(d), Some(e)) => s + d == e,
            _ => false,
        }
    }
}
