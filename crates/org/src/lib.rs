//! `orgscope-org` — the organisational tree as seen by the authorization core.
//!
//! The tree is read-only from here: nodes are provisioned elsewhere and consumed
//! through the [`NodeRepository`] abstraction. The parent pointer is the only
//! authoritative relation; children are always derived from it.

pub mod descendants;
pub mod error;
pub mod in_memory;
pub mod node;
pub mod repository;

pub use descendants::{DescendantResolver, ResolverConfig};
pub use error::NodeError;
pub use in_memory::InMemoryNodeRepository;
pub use node::{NodeKind, OrgNode};
pub use repository::NodeRepository;
