use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use orgscope_core::{DomainError, DomainResult, NodeId};

use crate::{NodeRepository, OrgNode};

#[derive(Debug, Default)]
struct Arena {
    nodes: HashMap<NodeId, OrgNode>,
    /// Derived from `nodes[*].parent_id`; never written from any other source.
    children: HashMap<NodeId, Vec<NodeId>>,
}

impl Arena {
    fn link(&mut self, node: &OrgNode) {
        if let Some(parent) = node.parent_id {
            self.children.entry(parent).or_default().push(node.id);
        }
    }

    fn root_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.values().filter(|n| n.is_root()).map(|n| &n.id)
    }
}

/// In-memory org tree for tests/dev.
///
/// Nodes live in an arena keyed by id; the adjacency index is maintained from
/// parent pointers as nodes are inserted.
#[derive(Debug, Default)]
pub struct InMemoryNodeRepository {
    inner: RwLock<Arena>,
}

impl InMemoryNodeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load nodes exactly as persisted, without validating the tree shape.
    ///
    /// This mirrors what a real store hands back, including corrupt data. Use
    /// [`check_integrity`](Self::check_integrity) to inspect the result.
    pub fn from_snapshot(nodes: impl IntoIterator<Item = OrgNode>) -> Self {
        let mut arena = Arena::default();
        for node in nodes {
            arena.link(&node);
            arena.nodes.insert(node.id, node);
        }
        Self {
            inner: RwLock::new(arena),
        }
    }

    /// Provision a node, enforcing the single-rooted-tree invariant.
    pub fn insert(&self, node: OrgNode) -> DomainResult<()> {
        if node.name.trim().is_empty() {
            return Err(DomainError::validation("node name cannot be empty"));
        }

        let mut arena = self
            .inner
            .write()
            .map_err(|_| DomainError::invariant("node repository lock poisoned"))?;

        if arena.nodes.contains_key(&node.id) {
            return Err(DomainError::conflict(format!("node {} already exists", node.id)));
        }

        match node.parent_id {
            Some(parent) if !arena.nodes.contains_key(&parent) => {
                return Err(DomainError::not_found(format!("parent node {parent}")));
            }
            None if arena.root_ids().next().is_some() => {
                return Err(DomainError::invariant("org tree already has a root"));
            }
            _ => {}
        }

        arena.link(&node);
        arena.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|a| a.nodes.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> Option<NodeId> {
        let arena = self.inner.read().ok()?;
        arena.root_ids().next().copied()
    }

    /// Report the first violation of the tree invariant: every parent exists,
    /// exactly one root, and every node reaches the root in finitely many steps.
    pub fn check_integrity(&self) -> DomainResult<()> {
        let arena = self
            .inner
            .read()
            .map_err(|_| DomainError::invariant("node repository lock poisoned"))?;

        let roots: Vec<&NodeId> = arena.root_ids().collect();
        match roots.len() {
            0 if !arena.nodes.is_empty() => {
                return Err(DomainError::invariant("org tree has no root"));
            }
            0 | 1 => {}
            n => return Err(DomainError::invariant(format!("org tree has {n} roots"))),
        }

        // Nodes already proven to reach the root.
        let mut grounded: HashSet<NodeId> = HashSet::new();
        for start in arena.nodes.keys() {
            let mut path: HashSet<NodeId> = HashSet::new();
            let mut cursor = *start;
            loop {
                if grounded.contains(&cursor) {
                    break;
                }
                if !path.insert(cursor) {
                    return Err(DomainError::invariant(format!(
                        "parent chain of node {start} loops back through {cursor}"
                    )));
                }
                let Some(node) = arena.nodes.get(&cursor) else {
                    return Err(DomainError::invariant(format!(
                        "node {start} references missing ancestor {cursor}"
                    )));
                };
                match node.parent_id {
                    Some(parent) => cursor = parent,
                    None => break,
                }
            }
            grounded.extend(path);
        }

        Ok(())
    }
}

impl NodeRepository for InMemoryNodeRepository {
    fn node(&self, id: &NodeId) -> Option<OrgNode> {
        let arena = self.inner.read().ok()?;
        arena.nodes.get(id).cloned()
    }

    fn children(&self, id: &NodeId) -> Vec<NodeId> {
        match self.inner.read() {
            Ok(arena) => arena.children.get(id).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    fn exists(&self, id: &NodeId) -> bool {
        self.inner
            .read()
            .map(|a| a.nodes.contains_key(id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeKind;

    #[test]
    fn children_are_derived_from_parent_pointers() {
        let repo = InMemoryNodeRepository::new();
        let root = NodeId::new();
        let a = NodeId::new();
        let b = NodeId::new();
        repo.insert(OrgNode::root(root, "Srbija", NodeKind::Office)).unwrap();
        repo.insert(OrgNode::child(a, "Vojvodina", NodeKind::Office, root)).unwrap();
        repo.insert(OrgNode::child(b, "Radnja 1", NodeKind::Store, a)).unwrap();

        let mut kids = repo.children(&root);
        kids.sort();
        assert_eq!(kids, vec![a]);
        assert_eq!(repo.children(&a), vec![b]);
        assert!(repo.children(&b).is_empty());
        assert_eq!(repo.parent(&b), Some(a));
        assert_eq!(repo.parent(&root), None);
        assert_eq!(repo.root(), Some(root));
        assert!(repo.check_integrity().is_ok());
    }

    #[test]
    fn insert_rejects_unknown_parent() {
        let repo = InMemoryNodeRepository::new();
        let err = repo
            .insert(OrgNode::child(NodeId::new(), "Orphan", NodeKind::Store, NodeId::new()))
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound(_)));
        assert!(repo.is_empty());
    }

    #[test]
    fn insert_rejects_second_root() {
        let repo = InMemoryNodeRepository::new();
        repo.insert(OrgNode::root(NodeId::new(), "One", NodeKind::Office)).unwrap();
        let err = repo
            .insert(OrgNode::root(NodeId::new(), "Two", NodeKind::Office))
            .unwrap_err();
        assert!(err.to_string().contains("root"));
    }

    #[test]
    fn insert_rejects_blank_name_and_duplicate_id() {
        let repo = InMemoryNodeRepository::new();
        let root = NodeId::new();
        assert!(matches!(
            repo.insert(OrgNode::root(root, "  ", NodeKind::Office)),
            Err(DomainError::Validation(_))
        ));
        repo.insert(OrgNode::root(root, "Root", NodeKind::Office)).unwrap();
        assert!(matches!(
            repo.insert(OrgNode::child(root, "Again", NodeKind::Store, root)),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn integrity_check_flags_parent_cycle() {
        let root = NodeId::new();
        let x = NodeId::new();
        let y = NodeId::new();
        let repo = InMemoryNodeRepository::from_snapshot([
            OrgNode::root(root, "Root", NodeKind::Office),
            OrgNode::child(x, "X", NodeKind::Office, y),
            OrgNode::child(y, "Y", NodeKind::Office, x),
        ]);

        let err = repo.check_integrity().unwrap_err();
        assert!(err.to_string().contains("loops"));
    }

    #[test]
    fn integrity_check_flags_missing_ancestor_and_multiple_roots() {
        let orphan = InMemoryNodeRepository::from_snapshot([
            OrgNode::root(NodeId::new(), "Root", NodeKind::Office),
            OrgNode::child(NodeId::new(), "Lost", NodeKind::Store, NodeId::new()),
        ]);
        assert!(orphan.check_integrity().unwrap_err().to_string().contains("missing"));

        let forest = InMemoryNodeRepository::from_snapshot([
            OrgNode::root(NodeId::new(), "A", NodeKind::Office),
            OrgNode::root(NodeId::new(), "B", NodeKind::Office),
        ]);
        assert!(forest.check_integrity().unwrap_err().to_string().contains("2 roots"));
    }
}
