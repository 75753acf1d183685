//! Tuning knobs of the propagation engine.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Options of [`Geost`](super::Geost).
///
/// None of them changes what is pruned at fixpoint; they trade work between
/// generator filtering, early exits and caching.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GeostOptions {
    /// Skip generators whose forbidden region cannot meet the object's
    /// occupancy box.
    pub filter_generators: bool,
    /// Stop a sweep once it cannot improve on the bound another shape gave.
    pub use_limit: bool,
    /// Reuse boxes of static generators across sweeps of one object and
    /// shape.
    pub cache_static_boxes: bool,
    /// Rounds of `start + duration = end` bound propagation per absorb.
    pub max_time_iterations: usize,
    /// Master order of the `k + 1` sweep axes; identity when `None`.
    pub dimension_order: Option<Vec<usize>>,
}

impl Default for GeostOptions {
    fn default() -> Self {
        Self {
            filter_generators: true,
            use_limit: true,
            cache_static_boxes: true,
            max_time_iterations: 8,
            dimension_order: None,
        }
    }
}
