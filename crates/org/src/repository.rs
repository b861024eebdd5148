use std::sync::Arc;

use orgscope_core::NodeId;

use crate::OrgNode;

/// Read-only access to the org tree, backed by any persistent store.
///
/// Lookups are idempotent and may be issued concurrently. Implementations derive
/// `children` from parent pointers (a filter-by-parent query or a precomputed
/// adjacency index); they must never keep a second, independently-written list.
pub trait NodeRepository: Send + Sync {
    /// Fetch a node by id.
    fn node(&self, id: &NodeId) -> Option<OrgNode>;

    /// Direct children of `id`, in no particular order. Empty for leaves and
    /// for unknown ids.
    fn children(&self, id: &NodeId) -> Vec<NodeId>;

    /// Parent of `id`; `None` for the root and for unknown ids.
    fn parent(&self, id: &NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent_id)
    }

    fn exists(&self, id: &NodeId) -> bool {
        self.node(id).is_some()
    }
}

impl<S> NodeRepository for Arc<S>
where
    S: NodeRepository + ?Sized,
{
    fn node(&self, id: &NodeId) -> Option<OrgNode> {
        (**self).node(id)
    }

    fn children(&self, id: &NodeId) -> Vec<NodeId> {
        (**self).children(id)
    }

    fn parent(&self, id: &NodeId) -> Option<NodeId> {
        (**self).parent(id)
    }

    fn exists(&self, id: &NodeId) -> bool {
        (**self).exists(id)
    }
}

impl<S> NodeRepository for &S
where
    S: NodeRepository + ?Sized,
{
    fn node(&self, id: &NodeId) -> Option<OrgNode> {
        (**self).node(id)
    }

    fn children(&self, id: &NodeId) -> Vec<NodeId> {
        (**self).children(id)
    }

    fn parent(&self, id: &NodeId) -> Option<NodeId> {
        (**self).parent(id)
    }

    fn exists(&self, id: &NodeId) -> bool {
        (**self).exists(id)
    }
}
