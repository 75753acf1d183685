//! Box algebra: [`DBox`] and the [`BoxPool`] arena.

mod dbox;
mod pool;

pub use dbox::{DBox, FULL_SPAN};
pub use pool::BoxPool;
