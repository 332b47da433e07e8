//! Error types for the editor

use thiserror::Error;

/// Failure of a single document mutation.
///
/// A mutation that fails leaves the document untouched and is never
/// recorded in history.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Component not found: {0}")]
    NotFound(String),

    #[error("Parent not found: {0}")]
    InvalidParent(String),

    #[error("Moving {id} under {parent} would create a cycle")]
    CycleDetected { id: String, parent: String },

    #[error("Geometry for {0} is not finite")]
    InvalidGeometry(String),

    #[error("No component ids left for this session")]
    IdsExhausted,
}

/// A component collection that violates the document invariants.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Duplicate component id: {0}")]
    DuplicateId(String),

    #[error("Component {id} references missing parent {parent}")]
    DanglingParent { id: String, parent: String },

    #[error("Parent cycle through component {0}")]
    CycleDetected(String),

    #[error("Components {first} and {second} share a sibling order")]
    OrderTie { first: String, second: String },
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Mutation error: {0}")]
    Mutation(#[from] MutationError),

    #[error("Invalid document: {0}")]
    Document(#[from] DocumentError),

    #[error("Could not decode shared document: {0}")]
    Decode(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
