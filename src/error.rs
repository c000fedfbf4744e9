//! Error types for tessera

use crate::model::{NodeId, NodeKind};
use thiserror::Error;

/// Result type alias for tessera operations
pub type Result<T> = std::result::Result<T, Error>;

/// Recoverable errors surfaced by node submission.
///
/// Contract violations — submitting an id that is already registered,
/// referencing a dependency that was never submitted, releasing a handle
/// that holds no external reference — are not errors. They are bugs in the
/// caller's get-or-make protocol and panic immediately.
#[derive(Error, Debug)]
pub enum Error {
    #[error("payload decode error: {0}")]
    Decode(#[from] bincode::Error),

    #[error("malformed node: {0}")]
    MalformedNode(String),

    #[error("dependency {id} has wrong kind: expected {expected}, found {found}")]
    WrongKind {
        id: NodeId,
        expected: NodeKind,
        found: NodeKind,
    },
}
