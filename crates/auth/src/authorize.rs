//! The authorization decision: one ordered sequence of gates applied to every
//! protected operation.
//!
//! Gate order for a single target (short-circuits at the first deny):
//!
//! ```text
//! existence ─▶ role ─▶ scope ─▶ self-or-elevated (password changes only) ─▶ allow
//! ```
//!
//! Under [`ExistencePolicy::Conceal`] the existence gate moves after the scope
//! gate, so a requester who could not act on the target anyway never learns
//! whether it exists. Whichever policy is chosen applies to every call site
//! served by the same [`AccessDecision`].
//!
//! Listing requests run the same gates over the requested node set instead of a
//! single record; see [`AccessDecision::decide_listing`].
//!
//! - No IO beyond [`NodeRepository`] reads
//! - No panics
//! - Deterministic for an unchanged tree

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use orgscope_core::{NodeId, UserId};
use orgscope_org::{NodeError, NodeRepository};

use crate::policy::{
    can_see_role, listed_roles, listing_role_gate, may_change_password, target_role_gate,
};
use crate::{Action, Identity, PermittedNodeSet, Role, ScopeCalculator, TargetUser};

/// Why a request was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The target lies outside the requester's permitted nodes.
    OutOfScope,
    /// The requester's role may not perform this action on this role.
    RoleNotPermitted,
    /// Only the record's owner (or an admin) may do this.
    SelfOnly,
    /// The target does not exist.
    NotFound,
}

impl core::fmt::Display for DenyReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DenyReason::OutOfScope => f.write_str("target is outside the permitted org scope"),
            DenyReason::RoleNotPermitted => f.write_str("role not permitted for this action"),
            DenyReason::SelfOnly => f.write_str("only permitted on one's own record"),
            DenyReason::NotFound => f.write_str("target not found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum Verdict {
    Allow,
    Deny(DenyReason),
}

impl Verdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Verdict::Allow)
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            Verdict::Allow => None,
            Verdict::Deny(reason) => Some(*reason),
        }
    }
}

/// Where the existence gate sits relative to the role and scope gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistencePolicy {
    /// Missing targets are reported as `NotFound` before anything else.
    #[default]
    Reveal,
    /// Missing targets are reported as `NotFound` only to requesters that pass
    /// the role and scope gates; everyone else sees `OutOfScope`.
    Conceal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    Existence,
    Role,
    Scope,
    SelfOrElevated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub gate: Gate,
    pub passed: bool,
}

/// Audit record of one decision: which gates ran, in order, and why it ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecisionTrace {
    pub user_id: UserId,
    pub role: Role,
    pub action: Action,
    pub target_user_id: Option<UserId>,
    pub target_node_id: Option<NodeId>,
    pub gates: Vec<GateOutcome>,
    pub verdict: Verdict,
    pub reason: String,
}

impl DecisionTrace {
    fn start(
        identity: &Identity,
        action: Action,
        target_user_id: Option<UserId>,
        target_node_id: Option<NodeId>,
    ) -> Self {
        Self {
            user_id: identity.user_id,
            role: identity.role,
            action,
            target_user_id,
            target_node_id,
            gates: Vec::new(),
            verdict: Verdict::Allow,
            reason: String::new(),
        }
    }

    fn pass(&mut self, gate: Gate) {
        self.gates.push(GateOutcome { gate, passed: true });
    }

    fn deny(mut self, gate: Gate, reason: DenyReason, message: impl Into<String>) -> Self {
        self.gates.push(GateOutcome { gate, passed: false });
        self.verdict = Verdict::Deny(reason);
        self.reason = message.into();
        self
    }

    fn allow(mut self, message: impl Into<String>) -> Self {
        self.verdict = Verdict::Allow;
        self.reason = message.into();
        self
    }

    fn log(self) -> Self {
        match self.verdict {
            Verdict::Allow => tracing::debug!(
                user_id = %self.user_id,
                action = %self.action,
                "access allowed"
            ),
            Verdict::Deny(reason) => tracing::info!(
                user_id = %self.user_id,
                action = %self.action,
                reason = ?reason,
                detail = %self.reason,
                "access denied"
            ),
        }
        self
    }
}

/// A listing request: a node (optionally with its subtree) plus an optional
/// role filter. `node_id: None` means the requester's whole permitted scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingRequest {
    pub action: Action,
    pub node_id: Option<NodeId>,
    pub recursive: bool,
    pub role_filter: Option<Role>,
}

impl ListingRequest {
    pub fn users(role_filter: Option<Role>) -> Self {
        Self {
            action: Action::ListUsers,
            node_id: None,
            recursive: true,
            role_filter,
        }
    }

    pub fn employees(node_id: NodeId, recursive: bool) -> Self {
        Self {
            action: Action::ViewEmployees,
            node_id: Some(node_id),
            recursive,
            role_filter: None,
        }
    }

    pub fn managers(node_id: NodeId, recursive: bool) -> Self {
        Self {
            action: Action::ViewManagers,
            node_id: Some(node_id),
            recursive,
            role_filter: None,
        }
    }
}

/// What an allowed listing may return: records on `nodes` holding one of `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingScope {
    pub nodes: PermittedNodeSet,
    pub roles: BTreeSet<Role>,
}

impl ListingScope {
    pub fn admits(&self, node_id: &NodeId, role: Role) -> bool {
        self.roles.contains(&role) && self.nodes.contains(node_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", content = "scope", rename_all = "snake_case")]
pub enum ListingVerdict {
    Allow(ListingScope),
    Deny(DenyReason),
}

impl ListingVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ListingVerdict::Allow(_))
    }

    pub fn deny_reason(&self) -> Option<DenyReason> {
        match self {
            ListingVerdict::Allow(_) => None,
            ListingVerdict::Deny(reason) => Some(*reason),
        }
    }
}

/// The authorization core: composes scope resolution with the role policy.
///
/// Holds no mutable state; share it freely across threads.
#[derive(Debug, Clone)]
pub struct AccessDecision<R> {
    scope: ScopeCalculator<R>,
    existence: ExistencePolicy,
}

impl<R> AccessDecision<R>
where
    R: NodeRepository,
{
    pub fn new(scope: ScopeCalculator<R>) -> Self {
        Self {
            scope,
            existence: ExistencePolicy::default(),
        }
    }

    pub fn with_existence_policy(mut self, existence: ExistencePolicy) -> Self {
        self.existence = existence;
        self
    }

    pub fn existence_policy(&self) -> ExistencePolicy {
        self.existence
    }

    pub fn scope(&self) -> &ScopeCalculator<R> {
        &self.scope
    }

    pub fn permitted_nodes(&self, identity: &Identity) -> Result<PermittedNodeSet, NodeError> {
        self.scope.permitted_nodes(identity)
    }

    /// Decide a single-target action. `target: None` means the lookup found nothing.
    ///
    /// Resolver failures (unknown home node, corrupt tree) are returned as
    /// errors; they never turn into an allow.
    pub fn decide(
        &self,
        identity: &Identity,
        target: Option<&TargetUser>,
        action: Action,
    ) -> Result<Verdict, NodeError> {
        self.explain(identity, target, action).map(|trace| trace.verdict)
    }

    /// Same as [`decide`](Self::decide), returning the full gate trace.
    pub fn explain(
        &self,
        identity: &Identity,
        target: Option<&TargetUser>,
        action: Action,
    ) -> Result<DecisionTrace, NodeError> {
        let trace = DecisionTrace::start(
            identity,
            action,
            target.map(|t| t.user_id),
            target.map(|t| t.node_id),
        );

        if action.is_listing() {
            return Ok(trace
                .deny(
                    Gate::Role,
                    DenyReason::RoleNotPermitted,
                    format!("'{action}' is a listing action and has no single target"),
                )
                .log());
        }

        // A record placed on a node the tree does not know is as good as missing.
        let target = target.filter(|t| self.scope.repository().exists(&t.node_id));
        self.evaluate(trace, identity, target, action).map(DecisionTrace::log)
    }

    fn evaluate(
        &self,
        mut trace: DecisionTrace,
        identity: &Identity,
        target: Option<&TargetUser>,
        action: Action,
    ) -> Result<DecisionTrace, NodeError> {
        let Some(target) = target else {
            return Ok(self.missing_target(trace, identity));
        };
        if self.existence == ExistencePolicy::Reveal {
            trace.pass(Gate::Existence);
        }

        if !target_role_gate(identity.role, target.role, action) {
            return Ok(trace.deny(
                Gate::Role,
                DenyReason::RoleNotPermitted,
                format!("role '{}' may not {action} a '{}' record", identity.role, target.role),
            ));
        }
        trace.pass(Gate::Role);

        let permitted = self.scope.permitted_nodes(identity)?;
        if !permitted.contains(&target.node_id) {
            return Ok(trace.deny(
                Gate::Scope,
                DenyReason::OutOfScope,
                format!(
                    "node {} is outside the subtree of home node {}",
                    target.node_id, identity.home_node_id
                ),
            ));
        }
        trace.pass(Gate::Scope);

        if self.existence == ExistencePolicy::Conceal {
            trace.pass(Gate::Existence);
        }

        if action == Action::ChangePassword {
            let is_self = identity.user_id == target.user_id;
            if !may_change_password(identity.role, is_self) {
                return Ok(trace.deny(
                    Gate::SelfOrElevated,
                    DenyReason::SelfOnly,
                    "only admins may change another user's password",
                ));
            }
            trace.pass(Gate::SelfOrElevated);
        }

        Ok(trace.allow(format!("'{}' may {action} this record", identity.role)))
    }

    fn missing_target(&self, mut trace: DecisionTrace, identity: &Identity) -> DecisionTrace {
        match self.existence {
            ExistencePolicy::Reveal => {
                trace.deny(Gate::Existence, DenyReason::NotFound, "target does not exist")
            }
            // Only an admin would pass every scope gate, so only an admin learns the truth.
            ExistencePolicy::Conceal if identity.role.is_admin() => {
                trace.pass(Gate::Role);
                trace.pass(Gate::Scope);
                trace.deny(Gate::Existence, DenyReason::NotFound, "target does not exist")
            }
            ExistencePolicy::Conceal => trace.deny(
                Gate::Scope,
                DenyReason::OutOfScope,
                "target is not within the permitted org scope",
            ),
        }
    }

    /// Decide a listing request over the requested node set.
    ///
    /// Every requested node must be permitted; there are no partial results.
    /// On allow, the returned scope says which records may be returned.
    pub fn decide_listing(
        &self,
        identity: &Identity,
        request: &ListingRequest,
    ) -> Result<ListingVerdict, NodeError> {
        let verdict = self.evaluate_listing(identity, request)?;
        match &verdict {
            ListingVerdict::Allow(scope) => tracing::debug!(
                user_id = %identity.user_id,
                action = %request.action,
                roles = ?scope.roles,
                "listing allowed"
            ),
            ListingVerdict::Deny(reason) => tracing::info!(
                user_id = %identity.user_id,
                action = %request.action,
                node_id = ?request.node_id,
                reason = ?reason,
                "listing denied"
            ),
        }
        Ok(verdict)
    }

    fn evaluate_listing(
        &self,
        identity: &Identity,
        request: &ListingRequest,
    ) -> Result<ListingVerdict, NodeError> {
        let requested_exists = request
            .node_id
            .map(|id| self.scope.repository().exists(&id))
            .unwrap_or(true);

        if !requested_exists && self.existence == ExistencePolicy::Reveal {
            return Ok(ListingVerdict::Deny(DenyReason::NotFound));
        }

        if !request.action.is_listing() || !listing_role_gate(identity.role, request.action) {
            return Ok(ListingVerdict::Deny(DenyReason::RoleNotPermitted));
        }

        let mut roles = listed_roles(identity.role, request.action);
        if let Some(filter) = request.role_filter {
            if !can_see_role(identity.role, filter) {
                return Ok(ListingVerdict::Deny(DenyReason::RoleNotPermitted));
            }
            roles.retain(|r| *r == filter);
        }

        let permitted = self.scope.permitted_nodes(identity)?;
        let Some(node_id) = request.node_id else {
            return Ok(ListingVerdict::Allow(ListingScope {
                nodes: permitted,
                roles,
            }));
        };

        if !requested_exists {
            // Conceal: a non-admin's scope never contains an unknown node.
            return Ok(ListingVerdict::Deny(if permitted.is_unrestricted() {
                DenyReason::NotFound
            } else {
                DenyReason::OutOfScope
            }));
        }

        let requested: HashSet<NodeId> = if request.recursive {
            self.scope.resolver().descendants(&node_id)?
        } else {
            HashSet::from([node_id])
        };

        if !permitted.contains_all(&requested) {
            return Ok(ListingVerdict::Deny(DenyReason::OutOfScope));
        }

        Ok(ListingVerdict::Allow(ListingScope {
            nodes: PermittedNodeSet::Nodes(requested),
            roles,
        }))
    }
}
