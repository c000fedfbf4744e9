//! Registry entries and the handle token callers hold

use crate::model::NodeId;
use std::rc::Rc;

/// A caller's claim on a registered node.
///
/// Returned by `try_acquire` and `submit` with the external count already
/// incremented; pass it back to `release` when done. Handles are plain
/// tokens — copying one does not acquire anything.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Handle {
    id: NodeId,
}

impl Handle {
    pub(crate) fn new(id: NodeId) -> Self {
        Handle { id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// One registered node: the materialized object plus the two counts that
/// decide reachability.
///
/// `external_count` is the number of outstanding acquire calls.
/// `internal_alias_count` is the number of strong references into this
/// object held by other still-registered nodes, maintained incrementally:
/// +1 per referencing dependency at submit, -1 when a referencing entry is
/// detached by the collector. An entry is garbage exactly when both are
/// zero.
pub(crate) struct Entry<T> {
    pub(crate) object: Rc<T>,
    pub(crate) external_count: u32,
    pub(crate) internal_alias_count: u32,
    /// Dependency ids recorded at submit, one per embedded reference;
    /// consulted when this entry is collected to drop its aliases.
    pub(crate) dependencies: Vec<NodeId>,
}

impl<T> Entry<T> {
    /// A freshly submitted entry starts with the submitter's one external
    /// reference and no aliases.
    pub(crate) fn new(object: Rc<T>, dependencies: Vec<NodeId>) -> Self {
        Entry {
            object,
            external_count: 1,
            internal_alias_count: 0,
            dependencies,
        }
    }

    pub(crate) fn is_reachable(&self) -> bool {
        self.external_count > 0 || self.internal_alias_count > 0
    }
}
