//! Permitted node sets: everywhere an identity may act.

use std::collections::HashSet;

use serde::Serialize;

use orgscope_core::NodeId;
use orgscope_org::{DescendantResolver, NodeError, NodeRepository};

use crate::{Identity, Role};

/// The org nodes an identity may operate within.
///
/// Admins get [`PermittedNodeSet::Unrestricted`], which matches every node
/// without enumerating the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "nodes", rename_all = "snake_case")]
pub enum PermittedNodeSet {
    Unrestricted,
    Nodes(HashSet<NodeId>),
}

impl PermittedNodeSet {
    pub fn contains(&self, node_id: &NodeId) -> bool {
        match self {
            PermittedNodeSet::Unrestricted => true,
            PermittedNodeSet::Nodes(nodes) => nodes.contains(node_id),
        }
    }

    pub fn contains_all<'a>(&self, node_ids: impl IntoIterator<Item = &'a NodeId>) -> bool {
        match self {
            PermittedNodeSet::Unrestricted => true,
            PermittedNodeSet::Nodes(nodes) => node_ids.into_iter().all(|id| nodes.contains(id)),
        }
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, PermittedNodeSet::Unrestricted)
    }

    /// The enumerated nodes, or `None` for the unrestricted sentinel.
    pub fn nodes(&self) -> Option<&HashSet<NodeId>> {
        match self {
            PermittedNodeSet::Unrestricted => None,
            PermittedNodeSet::Nodes(nodes) => Some(nodes),
        }
    }
}

/// Computes [`PermittedNodeSet`]s from identities.
#[derive(Debug, Clone)]
pub struct ScopeCalculator<R> {
    resolver: DescendantResolver<R>,
}

impl<R> ScopeCalculator<R>
where
    R: NodeRepository,
{
    pub fn new(resolver: DescendantResolver<R>) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &DescendantResolver<R> {
        &self.resolver
    }

    pub fn repository(&self) -> &R {
        self.resolver.repository()
    }

    /// Admin: unrestricted. Manager/employee: home node plus its descendants.
    ///
    /// An identity whose home node cannot be resolved gets no scope at all;
    /// the resolver error is returned instead.
    pub fn permitted_nodes(&self, identity: &Identity) -> Result<PermittedNodeSet, NodeError> {
        match identity.role {
            Role::Admin => Ok(PermittedNodeSet::Unrestricted),
            Role::Manager | Role::Employee => self
                .resolver
                .descendants(&identity.home_node_id)
                .map(PermittedNodeSet::Nodes),
        }
    }
}
