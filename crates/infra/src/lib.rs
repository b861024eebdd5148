//! Infrastructure layer: user storage, the user directory service, config and
//! the demo organisation.

pub mod config;
pub mod directory;
pub mod read_model;
pub mod seed;


pub use config::{AccessConfig, ConfigError, bootstrap};
pub use directory::{DirectoryError, UserDirectory};
pub use seed::{DemoOrganisation, demo_organisation};
