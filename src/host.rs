//! Minimal solver loop driving a [`Geost`] engine over a [`Store`].
//!
//! The host owns both sides and plays the role a full solver would: it
//! forwards domain events to the engine, runs consistency to a fixpoint,
//! opens a level per decision and replays the backtracking hooks in the
//! order the engine expects.

use crate::engine::Geost;
use crate::error::Inconsistency;
use crate::store::{Store, VarId};

#[derive(Debug)]
pub struct Host {
    store: Store,
    geost: Geost,
}

impl Host {
    pub fn new(store: Store, geost: Geost) -> Self {
        Self { store, geost }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Direct access for callers posting their own restrictions; call
    /// [`Host::propagate`] afterwards.
    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn geost(&self) -> &Geost {
        &self.geost
    }

    /// Forwards pending store events to the engine and runs it to its
    /// fixpoint.
    ///
    /// Events raised by the engine's own narrowing are dropped: the engine
    /// has already absorbed them, and it is the only propagator here.
    pub fn propagate(&mut self) -> Result<(), Inconsistency> {
        let level = self.store.level();
        for var in self.store.take_events() {
            self.geost.on_variable_changed(level, var);
        }
        self.geost.consistency(&mut self.store)?;
        let own = self.store.take_events();
        log::trace!("host: level {level} fixpoint, {} variables narrowed", own.len());
        Ok(())
    }

    /// Opens a level, fixes `var` to `value` and propagates.
    ///
    /// On failure the level stays open; the caller backtracks.
    pub fn decide(&mut self, var: VarId, value: i32) -> Result<(), Inconsistency> {
        self.store.increase_level();
        log::trace!("host: level {} decides {var} = {value}", self.store.level());
        self.store.in_value(var, value)?;
        self.propagate()
    }

    /// Removes the current level. Returns the removed level, or `None` at
    /// the root.
    pub fn backtrack(&mut self) -> Option<usize> {
        let level = self.store.level();
        if level == 0 {
            return None;
        }
        self.geost.on_remove_level(level);
        let removed = self.store.remove_level();
        self.geost.on_remove_level_late(level, &self.store);
        removed
    }

    pub fn is_solved(&self) -> bool {
        self.geost.satisfied(&self.store)
    }

    pub fn into_parts(self) -> (Store, Geost) {
        (self.store, self.geost)
    }
}
