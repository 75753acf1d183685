//! User-level relations and their translation into generators.
//!
//! An [`ExternalConstraint`] names the objects and axes it constrains,
//! produces the internal generators that enforce it, and decides for each
//! object which of those generators apply to it.

mod in_area;
mod non_overlapping;

pub use in_area::InArea;
pub use non_overlapping::NonOverlapping;

use std::collections::HashMap;
use std::fmt::Debug;

use crate::error::GeostError;
use crate::internal::Generator;
use crate::object::GeostObject;
use crate::store::Store;

/// Model data available while generating internal constraints.
#[derive(Debug, Clone, Copy)]
pub struct ModelView<'a> {
    pub objects: &'a [GeostObject],
    /// Object index by object id.
    pub index: &'a HashMap<i32, usize>,
    pub store: &'a Store,
    /// Number of geometric axes `k`.
    pub dimension: usize,
}

/// A geometric relation over a subset of the objects.
///
/// # Contract
///
/// - `validate` is called once before `generate`.
/// - `is_applicable` is only asked about generators this constraint
///   produced.
pub trait ExternalConstraint: Debug {
    /// Ids of the objects constrained, or `None` for every object.
    fn objects(&self) -> Option<&[i32]>;

    /// Axes constrained; `dimension` (`k`) denotes time.
    fn dimensions(&self, dimension: usize) -> Vec<usize>;

    /// Checks object references and arities against the model.
    fn validate(&self, model: &ModelView<'_>) -> Result<(), GeostError>;

    /// Produces the internal generators enforcing this constraint.
    fn generate(&self, model: &ModelView<'_>) -> Vec<Generator>;

    /// True when `generator` restricts the object at index `object`.
    fn is_applicable(&self, generator: &Generator, object: usize, model: &ModelView<'_>) -> bool;

    /// Returns a string representation of this constraint.
    fn stringify(&self) -> String;
}

/// Shared validation of an optional object id list.
pub(crate) fn validate_ids(ids: Option<&[i32]>, model: &ModelView<'_>) -> Result<(), GeostError> {
    for &id in ids.unwrap_or_default() {
        if !model.index.contains_key(&id) {
            return Err(GeostError::UnknownObject(id));
        }
    }
    Ok(())
}

/// True when `object` is one of `ids` (every object when `ids` is `None`).
pub(crate) fn covers_object(ids: Option<&[i32]>, object: usize, model: &ModelView<'_>) -> bool {
    match ids {
        None => true,
        Some(ids) => ids.contains(&model.objects[object].id()),
    }
}
