//! geost - sweep-based geometric placement constraint
//!
//! Keeps objects of `k`-dimensional polymorphic shapes inside allowed areas
//! and apart from each other, over time, inside a finite-domain solver.
//!
//! Each object owns integer variables for its origin coordinates, the id of
//! its shape, and its start, duration and end. External constraints such as
//! [`NonOverlapping`] and [`InArea`] are compiled into internal generators of
//! forbidden boxes, and the [`Geost`] engine narrows the bounds of every
//! object with a lexicographic sweep over the `k + 1` dimensional placement
//! space. Shapes that cannot be placed anywhere are removed from the shape
//! selector.
//!
//! The [`Store`] is a small trailed domain store standing in for the host
//! solver; [`Host`] shows the event and backtracking protocol the engine
//! expects from it.

pub mod engine;
pub mod error;
pub mod external;
pub mod geometry;
pub mod host;
pub mod internal;
pub mod object;
pub mod order;
pub mod shape;
pub mod store;

pub use engine::{Geost, GeostOptions, GeostStats, SweepOutcome};
pub use error::{GeostError, Inconsistency};
pub use external::{ExternalConstraint, InArea, NonOverlapping};
pub use geometry::{BoxPool, DBox};
pub use host::Host;
pub use object::GeostObject;
pub use order::DimensionOrder;
pub use shape::{Shape, ShapeRegistry};
pub use store::{Store, VarId};
