//! Per-level record of what the engine must undo on backtracking.

use crate::store::VarId;

/// Changes absorbed at one decision level.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct LevelDelta {
    level: usize,
    /// Objects whose generators were refreshed, in update order.
    objects: Vec<usize>,
    /// Variables counted as grounded.
    grounded: Vec<VarId>,
}

/// Stack of level deltas, most recent level on top.
///
/// Level 0 is never removed, so nothing is recorded for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Trail {
    deltas: Vec<LevelDelta>,
}

/// What removing a level hands back to the engine.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Undo {
    /// Updated objects, most recent first.
    pub objects: Vec<usize>,
    pub grounded: Vec<VarId>,
}

impl Trail {
    fn top(&mut self, level: usize) -> &mut LevelDelta {
        debug_assert!(self.deltas.last().map_or(true, |d| d.level <= level));
        if self.deltas.last().map_or(true, |d| d.level != level) {
            self.deltas.push(LevelDelta {
                level,
                ..Default::default()
            });
        }
        let last = self.deltas.len() - 1;
        &mut self.deltas[last]
    }

    pub fn record_update(&mut self, level: usize, object: usize) {
        if level == 0 {
            return;
        }
        let delta = self.top(level);
        if !delta.objects.contains(&object) {
            delta.objects.push(object);
        }
    }

    pub fn record_grounded(&mut self, level: usize, var: VarId) {
        if level == 0 {
            return;
        }
        self.top(level).grounded.push(var);
    }

    /// Pops every delta recorded at `level` or above.
    pub fn remove_from(&mut self, level: usize) -> Undo {
        let mut undo = Undo::default();
        while self.deltas.last().is_some_and(|d| d.level >= level) {
            let Some(delta) = self.deltas.pop() else {
                break;
            };
            undo.objects.extend(delta.objects.into_iter().rev());
            undo.grounded.extend(delta.grounded);
        }
        undo
    }

    pub fn depth(&self) -> usize {
        self.deltas.len()
    }
}
