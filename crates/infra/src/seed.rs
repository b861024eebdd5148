//! Demo organisation: a regional grocery chain with offices and stores.
//!
//! ```text
//! Srbija
//! ├── Vojvodina
//! │   ├── Severnobački okrug ── Subotica ── Radnja 1
//! │   └── Južnobački okrug ── Novi Sad
//! │       ├── Detelinara ── Radnja 2, Radnja 3
//! │       └── Liman ── Radnja 4, Radnja 5
//! └── Grad Beograd
//!     ├── Novi Beograd ── Bežanija ── Radnja 6
//!     └── Vračar
//!         ├── Neimar ── Radnja 7
//!         └── Crveni krst ── Radnja 8, Radnja 9
//! ```
//!
//! Used by integration tests, benchmarks and local development.

use std::collections::HashMap;
use std::sync::Arc;

use orgscope_auth::user::normalize_email;
use orgscope_auth::{Identity, Role, UserRecord};
use orgscope_core::{DomainError, DomainResult, NodeId, UserId};
use orgscope_org::{InMemoryNodeRepository, NodeKind, OrgNode};

use crate::config::AccessConfig;
use crate::directory::UserDirectory;
use crate::read_model::{CredentialStore, InMemoryCredentialStore, InMemoryUserStore, UserStore};

/// Password given to every seeded user.
pub const DEMO_PASSWORD: &str = "password123";

/// (name, kind, parent name). Parents are listed before their children.
const NODES: &[(&str, NodeKind, Option<&str>)] = &[
    ("Srbija", NodeKind::Office, None),
    ("Vojvodina", NodeKind::Office, Some("Srbija")),
    ("Severnobački okrug", NodeKind::Office, Some("Vojvodina")),
    ("Subotica", NodeKind::Office, Some("Severnobački okrug")),
    ("Radnja 1", NodeKind::Store, Some("Subotica")),
    ("Južnobački okrug", NodeKind::Office, Some("Vojvodina")),
    ("Novi Sad", NodeKind::Office, Some("Južnobački okrug")),
    ("Detelinara", NodeKind::Office, Some("Novi Sad")),
    ("Radnja 2", NodeKind::Store, Some("Detelinara")),
    ("Radnja 3", NodeKind::Store, Some("Detelinara")),
    ("Liman", NodeKind::Office, Some("Novi Sad")),
    ("Radnja 4", NodeKind::Store, Some("Liman")),
    ("Radnja 5", NodeKind::Store, Some("Liman")),
    ("Grad Beograd", NodeKind::Office, Some("Srbija")),
    ("Novi Beograd", NodeKind::Office, Some("Grad Beograd")),
    ("Bežanija", NodeKind::Office, Some("Novi Beograd")),
    ("Radnja 6", NodeKind::Store, Some("Bežanija")),
    ("Vračar", NodeKind::Office, Some("Grad Beograd")),
    ("Neimar", NodeKind::Office, Some("Vračar")),
    ("Radnja 7", NodeKind::Store, Some("Neimar")),
    ("Crveni krst", NodeKind::Office, Some("Vračar")),
    ("Radnja 8", NodeKind::Store, Some("Crveni krst")),
    ("Radnja 9", NodeKind::Store, Some("Crveni krst")),
];

/// (email, name, role, node name).
const USERS: &[(&str, &str, Role, &str)] = &[
    ("admin@example.com", "Admin User", Role::Admin, "Srbija"),
    ("vojvodina.manager@example.com", "Manager Vojvodina", Role::Manager, "Vojvodina"),
    ("beograd.manager@example.com", "Manager Beograd", Role::Manager, "Grad Beograd"),
    ("novisad.manager@example.com", "Manager Novi Sad", Role::Manager, "Novi Sad"),
    ("bezanija.employee@example.com", "Employee Bežanija", Role::Employee, "Bežanija"),
    ("radnja1.employee@example.com", "Employee Radnja 1", Role::Employee, "Radnja 1"),
    ("radnja4.employee@example.com", "Employee Radnja 4", Role::Employee, "Radnja 4"),
    ("radnja9.employee@example.com", "Employee Radnja 9", Role::Employee, "Radnja 9"),
];

pub type DemoDirectory = UserDirectory<
    Arc<InMemoryNodeRepository>,
    Arc<InMemoryUserStore>,
    Arc<InMemoryCredentialStore>,
>;

/// The seeded stores plus a name index over the tree.
#[derive(Debug)]
pub struct DemoOrganisation {
    pub nodes: Arc<InMemoryNodeRepository>,
    pub users: Arc<InMemoryUserStore>,
    pub credentials: Arc<InMemoryCredentialStore>,
    node_ids: HashMap<&'static str, NodeId>,
}

impl DemoOrganisation {
    pub fn node(&self, name: &str) -> Option<NodeId> {
        self.node_ids.get(name).copied()
    }

    pub fn node_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.node_ids.keys().copied()
    }

    pub fn user(&self, email: &str) -> Option<UserRecord> {
        self.users.find_by_email(email)
    }

    /// The identity a verified token for `email` would carry.
    pub fn identity(&self, email: &str) -> Option<Identity> {
        self.user(email).map(|u| Identity::new(u.id, u.role, u.node_id))
    }

    /// A directory over the seeded stores, wired with `config`.
    pub fn directory(&self, config: &AccessConfig) -> DemoDirectory {
        UserDirectory::new(
            config.build_access(Arc::clone(&self.nodes)),
            Arc::clone(&self.users),
            Arc::clone(&self.credentials),
        )
    }
}

/// Build the demo tree and its users in fresh in-memory stores.
pub fn demo_organisation() -> DomainResult<DemoOrganisation> {
    let nodes = Arc::new(InMemoryNodeRepository::new());
    let mut node_ids = HashMap::with_capacity(NODES.len());

    for &(name, kind, parent) in NODES {
        let id = NodeId::new();
        let node = match parent {
            None => OrgNode::root(id, name, kind),
            Some(parent) => {
                let parent_id = *node_ids
                    .get(parent)
                    .ok_or_else(|| DomainError::not_found(format!("seed parent '{parent}'")))?;
                OrgNode::child(id, name, kind, parent_id)
            }
        };
        nodes.insert(node)?;
        node_ids.insert(name, id);
    }

    let users = Arc::new(InMemoryUserStore::new());
    let credentials = Arc::new(InMemoryCredentialStore::new());

    for &(email, name, role, node) in USERS {
        let node_id = *node_ids
            .get(node)
            .ok_or_else(|| DomainError::not_found(format!("seed node '{node}'")))?;
        let record = UserRecord {
            id: UserId::new(),
            email: normalize_email(email)?,
            name: name.to_string(),
            role,
            node_id,
        };
        credentials.set_password(record.id, DEMO_PASSWORD)?;
        users.insert(record)?;
    }

    tracing::debug!(nodes = node_ids.len(), users = USERS.len(), "demo organisation seeded");

    Ok(DemoOrganisation {
        nodes,
        users,
        credentials,
        node_ids,
    })
}
