//! Core module - domain types and the credential store

pub mod naming;
pub mod secret;
pub mod store;
pub mod types;

pub use naming::{enumeration_filter, names_match, normalize_logical_name, to_physical_key};
pub use secret::SecretBuffer;
pub use store::{CredentialStore, MAX_SECRET_BYTES};
pub use types::*;
