use serde::{Deserialize, Serialize};

/// Operation an identity wants to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Read a single user record.
    View,
    /// Create a user record placed on a node.
    Create,
    /// Modify a user record (including reassignment to another node).
    Update,
    Delete,
    ChangePassword,
    /// List every visible user within the requester's scope.
    ListUsers,
    /// List employees of a node (optionally with its descendants).
    ViewEmployees,
    /// List managers of a node (optionally with its descendants).
    ViewManagers,
}

impl Action {
    /// Listing actions have no single target; they are decided over a node set.
    pub fn is_listing(&self) -> bool {
        matches!(self, Action::ListUsers | Action::ViewEmployees | Action::ViewManagers)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::View => "view",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::ChangePassword => "change_password",
            Action::ListUsers => "list_users",
            Action::ViewEmployees => "view_employees",
            Action::ViewManagers => "view_managers",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
