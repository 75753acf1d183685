//! Error types for model construction and propagation.

use thiserror::Error;

use crate::store::VarId;

/// Errors raised while building boxes, shapes, variables or the engine.
///
/// These are rejected constructions and are not recoverable: the model has
/// to be fixed by the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeostError {
    #[error("Dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Box length must be non-negative, found {length} on axis {axis}")]
    NegativeLength { axis: usize, length: i32 },

    #[error("Invalid dimension: {0}")]
    InvalidDimension(usize),

    #[error("Shape {0} has no components")]
    EmptyShape(i32),

    #[error("Shape id already exists: {0}")]
    DuplicateShapeId(i32),

    #[error("Shape id must be non-negative, found {0}")]
    NegativeShapeId(i32),

    #[error("Object {object} references unknown shape {shape}")]
    UnknownShape { object: i32, shape: i32 },

    #[error("Object id already exists: {0}")]
    DuplicateObjectId(i32),

    #[error("Object id must be non-negative, found {0}")]
    NegativeObjectId(i32),

    #[error("Unknown object id: {0}")]
    UnknownObject(i32),

    #[error("Cannot create a variable with an empty domain")]
    EmptyDomain,

    #[error("Value {0} is outside the supported coordinate range")]
    CoordinateOutOfRange(i64),
}

/// Propagation failure: the current branch has no solution.
///
/// This is the normal way the engine reports a dead end; the host is
/// expected to backtrack.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Inconsistency {
    #[error("Domain of {var} became empty")]
    EmptyDomain { var: VarId },

    #[error("Object {object} has no feasible shape on axis {axis}")]
    NoFeasibleShape { object: i32, axis: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_display() {
        let e = GeostError::DimensionMismatch {
            expected: 2,
            found: 3,
        };
        assert_eq!(e.to_string(), "Dimension mismatch: expected 2, found 3");
    }

    #[test]
    fn unknown_shape_display() {
        let e = GeostError::UnknownShape {
            object: 4,
            shape: 9,
        };
        assert_eq!(e.to_string(), "Object 4 references unknown shape 9");
    }

    #[test]
    fn duplicate_ids_display() {
        assert_eq!(
            GeostError::DuplicateShapeId(1).to_string(),
            "Shape id already exists: 1"
        );
        assert_eq!(
            GeostError::DuplicateObjectId(7).to_string(),
            "Object id already exists: 7"
        );
    }

    #[test]
    fn inconsistency_display() {
        let e = Inconsistency::NoFeasibleShape { object: 3, axis: 1 };
        assert_eq!(e.to_string(), "Object 3 has no feasible shape on axis 1");
    }

    #[test]
    fn error_equality() {
        assert_eq!(GeostError::EmptyDomain, GeostError::EmptyDomain);
        assert_ne!(GeostError::EmptyDomain, GeostError::InvalidDimension(0));
    }
}
