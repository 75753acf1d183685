//! Counters of the propagation engine.

use std::fmt::Display;

/// Work done by a [`Geost`](super::Geost) instance since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeostStats {
    pub consistency_calls: u64,
    pub objects_pruned: u64,
    pub sweeps: u64,
    pub generator_queries: u64,
    pub forbidden_boxes: u64,
    pub cached_box_hits: u64,
    pub shapes_eliminated: u64,
    pub bound_updates: u64,
    pub failures: u64,
    pub frame_refreshes: u64,
}

impl Display for GeostStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "calls={} objects={} sweeps={} queries={} boxes={} cached={} eliminated={} updates={} failures={} refreshes={}",
            self.consistency_calls,
            self.objects_pruned,
            self.sweeps,
            self.generator_queries,
            self.forbidden_boxes,
            self.cached_box_hits,
            self.shapes_eliminated,
            self.bound_updates,
            self.failures,
            self.frame_refreshes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_one_line() {
        let stats = GeostStats {
            sweeps: 4,
            failures: 1,
            ..Default::default()
        };
        let line = stats.to_string();
        assert!(!line.contains('\n'));
        assert!(line.contains("sweeps=4"));
        assert!(line.contains("failures=1"));
    }
}
