//! Descendant resolution: a node plus everything below it.
//!
//! Traversal is breadth-first, one `children` lookup per visited node. A node
//! reached twice means the stored parent pointers form a loop; the walk stops
//! with [`NodeError::CycleDetected`] instead of returning a partial set.

use std::collections::{HashSet, VecDeque};
use std::time::{Duration, Instant};

use orgscope_core::NodeId;

use crate::{NodeError, NodeRepository};

/// Limits applied to a single traversal.
///
/// Both are opt-in. The default walks any well-formed tree to completion;
/// cycles are caught by the visited set, not by these limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResolverConfig {
    /// Maximum depth below the start node (`None` = unbounded).
    pub max_depth: Option<usize>,
    /// Wall-clock budget for one traversal (`None` = no deadline).
    pub deadline: Option<Duration>,
}

impl ResolverConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Computes descendant sets against a [`NodeRepository`].
#[derive(Debug, Clone)]
pub struct DescendantResolver<R> {
    repo: R,
    config: ResolverConfig,
}

impl<R> DescendantResolver<R>
where
    R: NodeRepository,
{
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, ResolverConfig::default())
    }

    pub fn with_config(repo: R, config: ResolverConfig) -> Self {
        Self { repo, config }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> ResolverConfig {
        self.config
    }

    /// `start` and every node reachable below it.
    ///
    /// Fails with [`NodeError::NodeNotFound`] if `start` is unknown.
    pub fn descendants(&self, start: &NodeId) -> Result<HashSet<NodeId>, NodeError> {
        if !self.repo.exists(start) {
            return Err(NodeError::NodeNotFound(*start));
        }

        let started_at = Instant::now();
        let mut visited: HashSet<NodeId> = HashSet::from([*start]);
        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::from([(*start, 0)]);

        while let Some((current, depth)) = queue.pop_front() {
            if let Some(deadline) = self.config.deadline {
                if started_at.elapsed() > deadline {
                    tracing::warn!(
                        start = %start,
                        visited = visited.len(),
                        "descendant resolution deadline exceeded"
                    );
                    return Err(NodeError::DeadlineExceeded(deadline));
                }
            }

            for child in self.repo.children(&current) {
                if !visited.insert(child) {
                    tracing::error!(
                        start = %start,
                        node = %child,
                        "org tree integrity violation: node reached twice during traversal"
                    );
                    return Err(NodeError::CycleDetected(child));
                }

                let child_depth = depth + 1;
                if let Some(max_depth) = self.config.max_depth {
                    if child_depth > max_depth {
                        return Err(NodeError::DepthExceeded { max_depth });
                    }
                }
                queue.push_back((child, child_depth));
            }
        }

        tracing::trace!(start = %start, count = visited.len(), "resolved descendants");
        Ok(visited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryNodeRepository, NodeKind, OrgNode};

    /// R → V → S, R → B
    fn sample_tree() -> (InMemoryNodeRepository, [NodeId; 4]) {
        let repo = InMemoryNodeRepository::new();
        let [r, v, s, b] = [NodeId::new(), NodeId::new(), NodeId::new(), NodeId::new()];
        repo.insert(OrgNode::root(r, "R", NodeKind::Office)).unwrap();
        repo.insert(OrgNode::child(v, "V", NodeKind::Office, r)).unwrap();
        repo.insert(OrgNode::child(s, "S", NodeKind::Store, v)).unwrap();
        repo.insert(OrgNode::child(b, "B", NodeKind::Office, r)).unwrap();
        (repo, [r, v, s, b])
    }

    #[test]
    fn includes_start_and_everything_below() {
        let (repo, [r, v, s, b]) = sample_tree();
        let resolver = DescendantResolver::new(&repo);

        assert_eq!(resolver.descendants(&v).unwrap(), HashSet::from([v, s]));
        assert_eq!(resolver.descendants(&s).unwrap(), HashSet::from([s]));
        assert_eq!(resolver.descendants(&r).unwrap(), HashSet::from([r, v, s, b]));
    }

    #[test]
    fn never_contains_ancestors_or_siblings() {
        let (repo, [r, v, _s, b]) = sample_tree();
        let set = DescendantResolver::new(&repo).descendants(&v).unwrap();
        assert!(!set.contains(&r));
        assert!(!set.contains(&b));
    }

    #[test]
    fn unknown_start_is_not_found() {
        let (repo, _) = sample_tree();
        let ghost = NodeId::new();
        let err = DescendantResolver::new(&repo).descendants(&ghost).unwrap_err();
        assert_eq!(err, NodeError::NodeNotFound(ghost));
    }

    #[test]
    fn parent_loop_is_reported_not_followed() {
        let root = NodeId::new();
        let x = NodeId::new();
        let y = NodeId::new();
        let repo = InMemoryNodeRepository::from_snapshot([
            OrgNode::root(root, "Root", NodeKind::Office),
            OrgNode::child(x, "X", NodeKind::Office, y),
            OrgNode::child(y, "Y", NodeKind::Office, x),
        ]);

        let err = DescendantResolver::with_config(&repo, ResolverConfig::unbounded())
            .descendants(&x)
            .unwrap_err();
        assert_eq!(err, NodeError::CycleDetected(x));
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn self_parented_node_is_a_cycle() {
        let x = NodeId::new();
        let repo =
            InMemoryNodeRepository::from_snapshot([OrgNode::child(x, "X", NodeKind::Office, x)]);
        let err = DescendantResolver::new(&repo).descendants(&x).unwrap_err();
        assert_eq!(err, NodeError::CycleDetected(x));
    }

    #[test]
    fn depth_limit_is_enforced() {
        let (repo, [r, ..]) = sample_tree();
        let config = ResolverConfig {
            max_depth: Some(1),
            deadline: None,
        };
        let err = DescendantResolver::with_config(&repo, config)
            .descendants(&r)
            .unwrap_err();
        assert_eq!(err, NodeError::DepthExceeded { max_depth: 1 });
    }

    #[test]
    fn default_config_walks_deep_chains() {
        let repo = InMemoryNodeRepository::new();
        let root = NodeId::new();
        repo.insert(OrgNode::root(root, "Root", NodeKind::Office)).unwrap();
        let mut parent = root;
        for i in 0..70 {
            let id = NodeId::new();
            repo.insert(OrgNode::child(id, format!("Level {i}"), NodeKind::Office, parent))
                .unwrap();
            parent = id;
        }
        repo.check_integrity().unwrap();

        let resolver = DescendantResolver::new(&repo);
        assert_eq!(resolver.config(), ResolverConfig::unbounded());
        assert_eq!(resolver.descendants(&root).unwrap().len(), 71);
        assert_eq!(resolver.descendants(&parent).unwrap(), HashSet::from([parent]));
    }

    #[test]
    fn zero_deadline_aborts() {
        let (repo, [r, ..]) = sample_tree();
        let config = ResolverConfig {
            max_depth: None,
            deadline: Some(Duration::ZERO),
        };
        // elapsed() > 0 holds by the time the first node is popped on any real clock,
        // but a coarse clock may read zero; accept either outcome without a partial set.
        match DescendantResolver::with_config(&repo, config).descendants(&r) {
            Err(NodeError::DeadlineExceeded(d)) => assert_eq!(d, Duration::ZERO),
            Ok(set) => assert_eq!(set.len(), 4),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        /// Random well-formed tree: node `i + 1` hangs under one of nodes `0..=i`.
        fn build(
            parents: &[prop::sample::Index],
        ) -> (InMemoryNodeRepository, Vec<NodeId>, Vec<Option<usize>>) {
            let repo = InMemoryNodeRepository::new();
            let mut ids = vec![NodeId::new()];
            let mut parent_of = vec![None];
            repo.insert(OrgNode::root(ids[0], "n0", NodeKind::Office)).unwrap();
            for (i, pick) in parents.iter().enumerate() {
                let parent = pick.index(i + 1);
                let id = NodeId::new();
                repo.insert(OrgNode::child(id, format!("n{}", i + 1), NodeKind::Store, ids[parent]))
                    .unwrap();
                ids.push(id);
                parent_of.push(Some(parent));
            }
            (repo, ids, parent_of)
        }

        fn chain_passes_through(
            parent_of: &[Option<usize>],
            mut node: usize,
            target: usize,
        ) -> bool {
            loop {
                if node == target {
                    return true;
                }
                match parent_of[node] {
                    Some(p) => node = p,
                    None => return false,
                }
            }
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 200,
                ..ProptestConfig::default()
            })]

            /// Property: descendants(N) is exactly the nodes whose parent chain passes through N.
            #[test]
            fn descendant_set_matches_parent_chains(
                parents in prop::collection::vec(any::<prop::sample::Index>(), 0..40)
            ) {
                let (repo, ids, parent_of) = build(&parents);
                let resolver = DescendantResolver::with_config(&repo, ResolverConfig::unbounded());

                for (n, id) in ids.iter().enumerate() {
                    let set = resolver.descendants(id).unwrap();
                    prop_assert!(set.contains(id));
                    for (m, other) in ids.iter().enumerate() {
                        prop_assert_eq!(
                            set.contains(other),
                            chain_passes_through(&parent_of, m, n)
                        );
                    }
                }
            }
        }
    }
}
