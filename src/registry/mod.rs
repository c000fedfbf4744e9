//! The identity-keyed node registry
//!
//! One authoritative map from [`NodeId`] to materialized node. Producers
//! submit encoded payloads keyed by precomputed content identities;
//! consumers acquire and release entries by id; a synchronous two-phase
//! collector reclaims entries once neither an external caller nor another
//! registered node still needs them.
//!
//! The registry is single-threaded by design: no operation blocks, no
//! internal locks are held, and callers serialize access themselves (in a
//! renderer, everything runs on the thread owning the graphics context).

mod entry;

pub use entry::Handle;

use entry::Entry;

use crate::materialize::{Materializer, Resolver};
use crate::model::NodeId;
use crate::Result;
use std::collections::HashMap;
use std::rc::Rc;

/// Identity-keyed store of materialized nodes with create-or-reuse
/// submission and hybrid refcount/reachability collection.
pub struct Registry<M: Materializer> {
    materializer: M,
    entries: HashMap<NodeId, Entry<M::Object>>,
    /// Message of the most recent failed submit; cleared at the start of
    /// every submit attempt.
    last_error: Option<String>,
}

impl<M: Materializer> Registry<M> {
    pub fn new(materializer: M) -> Self {
        Registry {
            materializer,
            entries: HashMap::new(),
            last_error: None,
        }
    }

    /// The materializer backing this registry
    pub fn materializer(&self) -> &M {
        &self.materializer
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Outstanding external references on a registered node
    pub fn external_count(&self, id: NodeId) -> Option<u32> {
        self.entries.get(&id).map(|entry| entry.external_count)
    }

    /// Strong references into a registered node held by other registered
    /// nodes
    pub fn internal_alias_count(&self, id: NodeId) -> Option<u32> {
        self.entries
            .get(&id)
            .map(|entry| entry.internal_alias_count)
    }

    /// Look up a node by id, taking an external reference on a hit.
    ///
    /// No side effect on a miss. Producers call this before every submit;
    /// a hit means the content is already materialized and must be reused.
    pub fn try_acquire(&mut self, id: NodeId) -> Option<Handle> {
        let entry = self.entries.get_mut(&id)?;
        entry.external_count += 1;
        Some(Handle::new(id))
    }

    /// Materialize and register a payload under a precomputed identity.
    ///
    /// The caller must have seen `try_acquire(id)` miss; submitting an id
    /// that is already registered is a protocol violation and panics.
    /// Embedded dependency ids are resolved against the current entries,
    /// so dependencies must have been submitted first.
    ///
    /// On success the node is registered with one external reference and
    /// the last-error slot is clear. On failure the registry is untouched
    /// and the error message is mirrored into the last-error slot.
    pub fn submit(&mut self, id: NodeId, payload: &[u8]) -> Result<Handle> {
        assert!(
            !self.entries.contains_key(&id),
            "duplicate submit for node {id}: call try_acquire before submit"
        );
        self.last_error = None;

        let entries = &self.entries;
        let lookup = |dep: NodeId| entries.get(&dep).map(|entry| Rc::clone(&entry.object));
        let resolver = Resolver::new(&lookup);
        let output = match self.materializer.parse(&resolver, payload) {
            Ok(output) => output,
            Err(err) => {
                self.last_error = Some(err.to_string());
                return Err(err);
            }
        };

        for dep in &output.dependencies {
            let entry = self
                .entries
                .get_mut(dep)
                .unwrap_or_else(|| panic!("dependency {dep} resolved by parse but not registered"));
            entry.internal_alias_count += 1;
        }

        log::debug!(
            "registered node {id} with {} dependencies",
            output.dependencies.len()
        );
        self.entries
            .insert(id, Entry::new(output.object, output.dependencies));
        Ok(Handle::new(id))
    }

    /// Take one more external reference on an already-held node.
    ///
    /// Panics if the handle's node is not registered.
    pub fn acquire(&mut self, handle: Handle) {
        let id = handle.id();
        let entry = self
            .entries
            .get_mut(&id)
            .unwrap_or_else(|| panic!("acquire on unregistered node {id}"));
        entry.external_count += 1;
    }

    /// Drop one external reference.
    ///
    /// Never destroys the node; it only updates the count the next
    /// collection pass consults. Panics if the node is not registered or
    /// has no outstanding external references.
    pub fn release(&mut self, handle: Handle) {
        let id = handle.id();
        let entry = self
            .entries
            .get_mut(&id)
            .unwrap_or_else(|| panic!("release on unregistered node {id}"));
        assert!(
            entry.external_count > 0,
            "release on node {id} with no outstanding external references"
        );
        entry.external_count -= 1;
    }

    /// Reclaim every entry that nothing still needs. Returns the number of
    /// entries collected.
    ///
    /// Two phases over a snapshot: classify victims (no external
    /// references, no aliases from registered nodes), then detach them
    /// from the map — dropping the aliases they held on their own
    /// dependencies — and hand the batch to the materializer for teardown
    /// in one call.
    ///
    /// Classification is a snapshot: a node kept alive only by a victim
    /// parent survives this pass and becomes eligible on the next one, so
    /// reclaiming a chain takes one pass per level. Callers run a pass per
    /// checkpoint, which drains garbage incrementally.
    pub fn collect(&mut self) -> usize {
        let victims: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_reachable())
            .map(|(id, _)| *id)
            .collect();

        let mut batch = Vec::with_capacity(victims.len());
        for id in &victims {
            // Present by construction: victims were keys a moment ago, and
            // no victim depends on another victim (a victim's dependency
            // always carries at least this entry's alias).
            let entry = self
                .entries
                .remove(id)
                .unwrap_or_else(|| panic!("victim {id} vanished during collection"));
            for dep in &entry.dependencies {
                let dep_entry = self
                    .entries
                    .get_mut(dep)
                    .unwrap_or_else(|| panic!("dependency {dep} removed before its dependent"));
                dep_entry.internal_alias_count -= 1;
            }
            batch.push(entry.object);
        }

        let collected = batch.len();
        if collected > 0 {
            log::debug!(
                "collected {collected} nodes, {} remain registered",
                self.entries.len()
            );
        }
        self.materializer.release(batch);
        collected
    }

    /// Diagnostic message from the most recent failed submit, if any.
    ///
    /// Reading does not clear it; the next submit attempt does.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
