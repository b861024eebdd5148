//! Storage abstractions for user records and credentials, with in-memory
//! implementations for tests/dev.

pub mod credentials;
pub mod user_store;

pub use credentials::{CredentialStore, InMemoryCredentialStore};
pub use user_store::{InMemoryUserStore, UserStore};
