//! # tessera
//!
//! A content-addressed node registry with hybrid reference-counted garbage
//! collection.
//!
//! Producers describe an acyclic graph of typed nodes (shaders, buffers,
//! pipelines, composites) as immutable, content-addressed records, submit
//! each one once, and from then on refer to it by a 64-bit identity. The
//! registry keeps the single authoritative store of materialized nodes,
//! deduplicates identical content, and reclaims entries exactly when
//! neither an external caller nor another registered node still needs them.
//!
//! ## Core Concepts
//!
//! - **NodeId**: 64-bit identity derived from a node's content and its
//!   dependencies' identities
//! - **Registry**: the id-keyed store with create-or-reuse submission and a
//!   two-phase snapshot collector
//! - **Materializer**: the pluggable seam that decodes payloads into typed
//!   objects and tears them down in batches
//! - **Blueprint**: the producer-side description graph, submitted
//!   bottom-up with a get-or-make check per node
//!
//! ## Example
//!
//! ```
//! use tessera::{Blueprint, Registry, ShaderStage, TreeMaterializer, submit_graph};
//!
//! let mut registry = Registry::new(TreeMaterializer::new());
//! let vertex = Blueprint::shader(ShaderStage::Vertex, "void main() { v(); }");
//! let fragment = Blueprint::shader(ShaderStage::Fragment, "void main() { f(); }");
//! let pipeline = Blueprint::pipeline(vertex, fragment);
//!
//! let root = submit_graph(&mut registry, &pipeline)?;
//! // ... use the root, then at the next checkpoint:
//! registry.release(root);
//! registry.collect();
//! # Ok::<(), tessera::Error>(())
//! ```

pub mod materialize;
pub mod model;
pub mod registry;
pub mod submit;

mod error;

pub use error::{Error, Result};
pub use materialize::{Materializer, ParseOutput, Resolver, TreeMaterializer};
pub use model::{ContentHasher, Node, NodeId, NodeKind, NodePayload, ShaderStage};
pub use registry::{Handle, Registry};
pub use submit::{submit_graph, Blueprint};
