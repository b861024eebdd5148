use serde::{Deserialize, Serialize};

use orgscope_core::NodeId;

/// Kind of organisational unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Office,
    Store,
}

impl core::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            NodeKind::Office => f.write_str("office"),
            NodeKind::Store => f.write_str("store"),
        }
    }
}

/// A unit in the organisational hierarchy.
///
/// Only the parent pointer is stored. Children are derived by the repository,
/// so the two directions of the relation can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgNode {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// `None` only for the root.
    pub parent_id: Option<NodeId>,
}

impl OrgNode {
    pub fn root(id: NodeId, name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            parent_id: None,
        }
    }

    pub fn child(id: NodeId, name: impl Into<String>, kind: NodeKind, parent_id: NodeId) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            parent_id: Some(parent_id),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
