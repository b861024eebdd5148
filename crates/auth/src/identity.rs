use serde::{Deserialize, Serialize};

use orgscope_core::{NodeId, UserId};

use crate::Role;

/// The acting user, produced fresh per request from verified credentials.
///
/// Trusted completely: this crate performs no credential checks. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub role: Role,
    /// The org node the user is assigned to.
    pub home_node_id: NodeId,
}

impl Identity {
    pub fn new(user_id: UserId, role: Role, home_node_id: NodeId) -> Self {
        Self {
            user_id,
            role,
            home_node_id,
        }
    }

    /// The identity's own record, viewed as a target.
    pub fn as_target(&self) -> TargetUser {
        TargetUser::new(self.user_id, self.role, self.home_node_id)
    }
}

/// The user record being acted on.
///
/// For create and reassignment checks, `node_id` is the *destination* node
/// rather than the record's current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetUser {
    pub user_id: UserId,
    pub role: Role,
    pub node_id: NodeId,
}

impl TargetUser {
    pub fn new(user_id: UserId, role: Role, node_id: NodeId) -> Self {
        Self {
            user_id,
            role,
            node_id,
        }
    }

    /// Same record, placed on another node.
    pub fn placed_on(self, node_id: NodeId) -> Self {
        Self { node_id, ..self }
    }
}
