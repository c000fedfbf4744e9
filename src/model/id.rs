//! Content-derived node identity

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 64-bit content-derived identity for a node.
///
/// Equal node content always yields an equal `NodeId`; distinct content
/// colliding is an accepted hash-function risk, not checked in software.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw 64-bit identity
    pub fn from_raw(raw: u64) -> Self {
        NodeId(raw)
    }

    /// The raw 64-bit value
    pub fn as_raw(&self) -> u64 {
        self.0
    }

    /// Hex form, zero-padded to 16 digits
    pub fn to_hex(&self) -> String {
        format!("{:016x}", self.0)
    }

    /// Short prefix for display (first 7 hex digits, like git)
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.short())
    }
}
