//! Core data model: node identities, content hashing, node kinds

mod hash;
mod id;
mod node;

pub use hash::ContentHasher;
pub use id::NodeId;
pub use node::{Buffer, Composite, Node, NodeKind, NodePayload, Pipeline, Shader, ShaderStage};
