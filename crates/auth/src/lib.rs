//! `orgscope-auth` — hierarchical, role-scoped authorization (zero-trust).
//!
//! Given an [`Identity`] and a target (a user record or a listing request),
//! decide whether the action is permitted and compute the exact set of org
//! nodes the requester may act within.
//!
//! This crate is intentionally decoupled from HTTP and storage; the org tree is
//! consumed through [`orgscope_org::NodeRepository`].

pub mod action;
pub mod authorize;
pub mod claims;
pub mod identity;
pub mod policy;
pub mod roles;
pub mod scope;
pub mod user;

pub use action::Action;
pub use authorize::{
    AccessDecision, DecisionTrace, DenyReason, ExistencePolicy, Gate, GateOutcome, ListingRequest,
    ListingScope, ListingVerdict, Verdict,
};
pub use claims::{IdentityClaims, TokenValidationError, validate_claims};
pub use identity::{Identity, TargetUser};
pub use policy::{can_see_role, filter_visible_roles};
pub use roles::Role;
pub use scope::{PermittedNodeSet, ScopeCalculator};
pub use user::{NewUser, UserRecord, UserUpdate};
