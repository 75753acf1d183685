//! Per-dimension arena of reusable boxes.
//!
//! The sweep asks its generators for many short-lived forbidden boxes. The
//! pool keeps retired allocations around so that steady-state sweeping does
//! not allocate.
//!
//! Ownership is carried by the type system: [`BoxPool::acquire`] moves a box
//! out of the pool and [`BoxPool::release`] consumes it, so a released box
//! can never be read again. Scratch boxes are only reachable inside the
//! closure passed to [`BoxPool::with_scratch`].

use super::DBox;

/// Free lists of boxes indexed by dimension, plus one scratch box per
/// dimension.
#[derive(Debug, Default)]
pub struct BoxPool {
    free: Vec<Vec<DBox>>,
    scratch: Vec<Option<DBox>>,
    allocated: usize,
    reused: usize,
}

impl BoxPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands out a box of `dimension` axes. Its contents are unspecified;
    /// callers overwrite every axis before reading.
    pub fn acquire(&mut self, dimension: usize) -> DBox {
        match self.free.get_mut(dimension).and_then(Vec::pop) {
            Some(b) => {
                self.reused += 1;
                b
            }
            None => {
                self.allocated += 1;
                DBox::zeroed(dimension)
            }
        }
    }

    /// Hands out a copy of `source`, reusing a pooled allocation if any.
    pub fn acquire_copy(&mut self, source: &DBox) -> DBox {
        let mut b = self.acquire(source.dimension());
        b.copy_from(source);
        b
    }

    /// Takes ownership of `b` back.
    pub fn release(&mut self, b: DBox) {
        let dimension = b.dimension();
        if self.free.len() <= dimension {
            self.free.resize_with(dimension + 1, Vec::new);
        }
        self.free[dimension].push(b);
    }

    /// Releases every box of `boxes`, leaving it empty.
    pub fn release_all(&mut self, boxes: &mut Vec<DBox>) {
        for b in boxes.drain(..) {
            self.release(b);
        }
    }

    /// Lends the scratch box of `dimension` to `f`.
    ///
    /// The contents left by a previous call are unspecified.
    pub fn with_scratch<R>(&mut self, dimension: usize, f: impl FnOnce(&mut DBox) -> R) -> R {
        if self.scratch.len() <= dimension {
            self.scratch.resize_with(dimension + 1, || None);
        }
        let mut b = self.scratch[dimension]
            .take()
            .unwrap_or_else(|| DBox::zeroed(dimension));
        let result = f(&mut b);
        self.scratch[dimension] = Some(b);
        result
    }

    /// Boxes created because the free list was empty.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Boxes served from the free list.
    pub fn reused(&self) -> usize {
        self.reused
    }

    /// Boxes currently pooled for `dimension`.
    pub fn available(&self, dimension: usize) -> usize {
        self.free.get(dimension).map_or(0, Vec::len)
    }
}
