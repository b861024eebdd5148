//! User directory: every user-facing operation, authorized the same way.
//!
//! Each operation follows one pipeline:
//!
//! ```text
//! validate input ─▶ load target ─▶ AccessDecision ─▶ store write
//! ```
//!
//! The directory never branches on roles itself. All of that lives in
//! `orgscope-auth`; this module only maps verdicts and store errors into a
//! single [`DirectoryError`].

use thiserror::Error;
use tracing::instrument;

use orgscope_auth::user::validate_password;
use orgscope_auth::{
    AccessDecision, Action, DecisionTrace, DenyReason, Identity, ListingRequest, ListingVerdict,
    NewUser, Role, TargetUser, UserRecord, UserUpdate, Verdict,
};
use orgscope_core::{DomainError, NodeId, UserId};
use orgscope_org::{NodeError, NodeRepository};

use crate::read_model::{CredentialStore, UserStore};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    /// Authorization denied (forbidden).
    #[error("access denied: {0}")]
    Denied(DenyReason),
    /// The user or node does not exist (distinct from a denial).
    #[error("not found")]
    NotFound,
    /// Input failed validation (deterministic).
    #[error("validation failed: {0}")]
    Validation(String),
    /// The write conflicts with existing data.
    #[error("conflict: {0}")]
    Conflict(String),
    /// The org tree could not be resolved.
    #[error(transparent)]
    Node(#[from] NodeError),
    /// A store reported a broken invariant.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<DomainError> for DirectoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => DirectoryError::Validation(msg),
            DomainError::InvalidId(msg) => DirectoryError::Validation(msg),
            DomainError::NotFound(_) => DirectoryError::NotFound,
            DomainError::Conflict(msg) => DirectoryError::Conflict(msg),
            DomainError::InvariantViolation(msg) => DirectoryError::Invariant(msg),
        }
    }
}

impl From<DenyReason> for DirectoryError {
    fn from(value: DenyReason) -> Self {
        match value {
            DenyReason::NotFound => DirectoryError::NotFound,
            other => DirectoryError::Denied(other),
        }
    }
}

impl DirectoryError {
    /// `true` when the caller did something wrong (as opposed to corrupt data
    /// or an aborted traversal).
    pub fn is_client_error(&self) -> bool {
        match self {
            DirectoryError::Node(NodeError::NodeNotFound(_)) => true,
            DirectoryError::Node(_) => false,
            DirectoryError::Invariant(_) => false,
            _ => true,
        }
    }
}

/// User operations over an org tree `N`, a user store `U` and credentials `C`.
pub struct UserDirectory<N, U, C> {
    access: AccessDecision<N>,
    users: U,
    credentials: C,
}

impl<N, U, C> UserDirectory<N, U, C>
where
    N: NodeRepository,
    U: UserStore,
    C: CredentialStore,
{
    pub fn new(access: AccessDecision<N>, users: U, credentials: C) -> Self {
        Self {
            access,
            users,
            credentials,
        }
    }

    pub fn access(&self) -> &AccessDecision<N> {
        &self.access
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    pub fn credentials(&self) -> &C {
        &self.credentials
    }

    fn authorize(
        &self,
        identity: &Identity,
        target: Option<&TargetUser>,
        action: Action,
    ) -> Result<(), DirectoryError> {
        match self.access.decide(identity, target, action)? {
            Verdict::Allow => Ok(()),
            Verdict::Deny(reason) => Err(reason.into()),
        }
    }

    /// Load a record and authorize `action` on it; missing records go through
    /// the same decision so the existence policy applies.
    fn load_authorized(
        &self,
        identity: &Identity,
        user_id: &UserId,
        action: Action,
    ) -> Result<UserRecord, DirectoryError> {
        let record = self.users.get(user_id);
        let target = record.as_ref().map(UserRecord::as_target);
        self.authorize(identity, target.as_ref(), action)?;
        record.ok_or(DirectoryError::NotFound)
    }

    #[instrument(skip(self, identity), fields(requester = %identity.user_id), err)]
    pub fn get_user(
        &self,
        identity: &Identity,
        user_id: UserId,
    ) -> Result<UserRecord, DirectoryError> {
        self.load_authorized(identity, &user_id, Action::View)
    }

    /// Every visible user in the requester's scope, optionally narrowed to one role.
    #[instrument(skip(self, identity), fields(requester = %identity.user_id), err)]
    pub fn list_users(
        &self,
        identity: &Identity,
        role_filter: Option<Role>,
    ) -> Result<Vec<UserRecord>, DirectoryError> {
        self.list(identity, &ListingRequest::users(role_filter))
    }

    /// Employees on `node_id` (and its descendants when `recursive`).
    #[instrument(skip(self, identity), fields(requester = %identity.user_id), err)]
    pub fn list_employees(
        &self,
        identity: &Identity,
        node_id: NodeId,
        recursive: bool,
    ) -> Result<Vec<UserRecord>, DirectoryError> {
        self.list(identity, &ListingRequest::employees(node_id, recursive))
    }

    /// Managers on `node_id` (and its descendants when `recursive`).
    #[instrument(skip(self, identity), fields(requester = %identity.user_id), err)]
    pub fn list_managers(
        &self,
        identity: &Identity,
        node_id: NodeId,
        recursive: bool,
    ) -> Result<Vec<UserRecord>, DirectoryError> {
        self.list(identity, &ListingRequest::managers(node_id, recursive))
    }

    fn list(
        &self,
        identity: &Identity,
        request: &ListingRequest,
    ) -> Result<Vec<UserRecord>, DirectoryError> {
        let scope = match self.access.decide_listing(identity, request)? {
            ListingVerdict::Allow(scope) => scope,
            ListingVerdict::Deny(reason) => return Err(reason.into()),
        };

        let mut users: Vec<UserRecord> = self
            .users
            .list()
            .into_iter()
            .filter(|u| scope.admits(&u.node_id, u.role))
            .collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    /// Provision a user on `new.node_id`. Only admins and managers may, and only
    /// within their scope.
    #[instrument(
        skip(self, identity, new),
        fields(requester = %identity.user_id, node_id = %new.node_id),
        err
    )]
    pub fn create_user(
        &self,
        identity: &Identity,
        new: NewUser,
    ) -> Result<UserRecord, DirectoryError> {
        let (record, password) = new.into_record()?;
        self.authorize(identity, Some(&record.as_target()), Action::Create)?;

        self.users.insert(record.clone())?;
        if let Err(e) = self.credentials.set_password(record.id, &password) {
            self.users.remove(&record.id);
            return Err(e.into());
        }

        tracing::info!(user_id = %record.id, role = %record.role, "user created");
        Ok(record)
    }

    /// Apply a partial update. Moving the user to another node, or giving them
    /// another role, is authorized again against the destination.
    #[instrument(skip(self, identity, update), fields(requester = %identity.user_id), err)]
    pub fn update_user(
        &self,
        identity: &Identity,
        user_id: UserId,
        update: UserUpdate,
    ) -> Result<UserRecord, DirectoryError> {
        let current = self.load_authorized(identity, &user_id, Action::Update)?;
        if update.is_empty() {
            return Ok(current);
        }

        let next = update.apply_to(&current)?;
        if next.node_id != current.node_id || next.role != current.role {
            self.authorize(identity, Some(&next.as_target()), Action::Update)?;
        }

        self.users.update(next.clone())?;
        tracing::info!(user_id = %next.id, "user updated");
        Ok(next)
    }

    #[instrument(skip(self, identity), fields(requester = %identity.user_id), err)]
    pub fn delete_user(&self, identity: &Identity, user_id: UserId) -> Result<(), DirectoryError> {
        self.load_authorized(identity, &user_id, Action::Delete)?;
        self.users.remove(&user_id).ok_or(DirectoryError::NotFound)?;
        self.credentials.remove(&user_id);
        tracing::info!(user_id = %user_id, "user deleted");
        Ok(())
    }

    /// Own password: always. Another user's: admin only.
    #[instrument(skip(self, identity, new_password), fields(requester = %identity.user_id), err)]
    pub fn change_password(
        &self,
        identity: &Identity,
        user_id: UserId,
        new_password: &str,
    ) -> Result<(), DirectoryError> {
        self.load_authorized(identity, &user_id, Action::ChangePassword)?;
        validate_password(new_password)?;
        self.credentials.set_password(user_id, new_password)?;
        tracing::info!(user_id = %user_id, "password changed");
        Ok(())
    }

    /// Why `action` on `user_id` would be allowed or denied, gate by gate.
    pub fn explain(
        &self,
        identity: &Identity,
        user_id: UserId,
        action: Action,
    ) -> Result<DecisionTrace, DirectoryError> {
        let target = self.users.get(&user_id).map(|u| u.as_target());
        Ok(self.access.explain(identity, target.as_ref(), action)?)
    }
}
