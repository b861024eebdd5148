//! User records and the input rules for creating and editing them.
//!
//! Records never carry credentials; secrets travel separately (see
//! [`validate_password`]) and are stored by a credential store elsewhere.

use serde::{Deserialize, Serialize};

use orgscope_core::{DomainError, DomainResult, NodeId, UserId};

use crate::{Role, TargetUser};

/// Minimum accepted password length.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Roles that can be assigned through user provisioning.
pub const ASSIGNABLE_ROLES: [Role; 2] = [Role::Manager, Role::Employee];

/// A user as stored and returned by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub node_id: NodeId,
}

impl UserRecord {
    /// The record as an authorization target.
    pub fn as_target(&self) -> TargetUser {
        TargetUser::new(self.id, self.role, self.node_id)
    }
}

/// Input for creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: Role,
    pub node_id: NodeId,
}

impl NewUser {
    /// Validate and normalise into a record with a fresh id.
    pub fn into_record(self) -> DomainResult<(UserRecord, String)> {
        let email = normalize_email(&self.email)?;
        let name = normalize_name(&self.name)?;
        validate_password(&self.password)?;
        validate_assignable_role(self.role)?;

        let record = UserRecord {
            id: UserId::new(),
            email,
            name,
            role: self.role,
            node_id: self.node_id,
        };
        Ok((record, self.password))
    }
}

/// Partial update of a user. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
    pub node_id: Option<NodeId>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.role.is_none() && self.node_id.is_none()
    }

    /// Apply to `record`, returning the validated result without touching the original.
    pub fn apply_to(&self, record: &UserRecord) -> DomainResult<UserRecord> {
        let mut next = record.clone();
        if let Some(email) = &self.email {
            next.email = normalize_email(email)?;
        }
        if let Some(name) = &self.name {
            next.name = normalize_name(name)?;
        }
        if let Some(role) = self.role {
            validate_assignable_role(role)?;
            next.role = role;
        }
        if let Some(node_id) = self.node_id {
            next.node_id = node_id;
        }
        Ok(next)
    }
}

pub fn normalize_email(email: &str) -> DomainResult<String> {
    let email = email.trim().to_lowercase();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(email)
}

pub fn normalize_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name cannot be empty"));
    }
    Ok(name.to_string())
}

pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_assignable_role(role: Role) -> DomainResult<()> {
    if !ASSIGNABLE_ROLES.contains(&role) {
        return Err(DomainError::validation(format!(
            "role must be one of: manager, employee (got {role})"
        )));
    }
    Ok(())
}
