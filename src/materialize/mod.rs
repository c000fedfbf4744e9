//! Materializer SPI
//!
//! The registry is agnostic to what a node materializes into. A
//! [`Materializer`] turns an encoded payload plus already-registered
//! dependencies into a typed object, and tears objects down when the
//! collector hands it a batch. Concrete backends (a GPU renderer, say) plug
//! in behind this trait; the crate ships [`TreeMaterializer`] for the
//! built-in node kinds.

mod tree;

pub use tree::TreeMaterializer;

use crate::model::NodeId;
use crate::Result;
use std::rc::Rc;

/// Output of a successful parse: the materialized object plus the ids of
/// the dependencies it resolved (one entry per embedded reference, in
/// payload order).
#[derive(Debug)]
pub struct ParseOutput<T> {
    pub object: Rc<T>,
    pub dependencies: Vec<NodeId>,
}

impl<T> ParseOutput<T> {
    /// A node with no dependencies
    pub fn leaf(object: Rc<T>) -> Self {
        ParseOutput {
            object,
            dependencies: Vec::new(),
        }
    }

    pub fn with_dependencies(object: Rc<T>, dependencies: Vec<NodeId>) -> Self {
        ParseOutput {
            object,
            dependencies,
        }
    }
}

/// Dependency lookup handed to [`Materializer::parse`], scoped to the
/// registry's entries at the time of the submit.
pub struct Resolver<'a, T> {
    lookup: &'a dyn Fn(NodeId) -> Option<Rc<T>>,
}

impl<'a, T> Resolver<'a, T> {
    pub fn new(lookup: &'a dyn Fn(NodeId) -> Option<Rc<T>>) -> Self {
        Resolver { lookup }
    }

    pub fn get(&self, id: NodeId) -> Option<Rc<T>> {
        (self.lookup)(id)
    }

    /// Resolve a dependency that the submission protocol guarantees exists.
    ///
    /// Panics if the id is unregistered: dependencies must be submitted
    /// before their dependents, and a missing one is a protocol bug in the
    /// producer, not a recoverable parse failure.
    pub fn resolve(&self, id: NodeId) -> Rc<T> {
        self.get(id).unwrap_or_else(|| {
            panic!("dependency {id} is not registered: nodes must be submitted in dependency order")
        })
    }
}

/// The contract nodes are built and destroyed through.
pub trait Materializer {
    /// The materialized object type stored in the registry.
    type Object;

    /// Decode a payload, resolving embedded dependency ids through `deps`
    /// and holding strong references to the resolved objects inside the
    /// result. Malformed payloads are recoverable errors.
    fn parse(&mut self, deps: &Resolver<'_, Self::Object>, payload: &[u8])
        -> Result<ParseOutput<Self::Object>>;

    /// Tear down a batch of objects detached by a collection pass.
    ///
    /// Called once per pass so that backends needing a resource context for
    /// destruction pay at most one context transition per collection.
    fn release(&mut self, batch: Vec<Rc<Self::Object>>);
}
