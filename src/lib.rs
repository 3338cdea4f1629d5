//! # PasswordSaver Backend Library
//!
//! Stores per-site passwords in the Windows Credential Manager. Several
//! applications can share the one vault: each prefixes its keys with a short
//! name (`myapp:https://host/`) and only ever enumerates `myapp:*`.
//!
//! ## Architecture
//!
//! - **core**: secret buffer, credential records, key naming, and the
//!   [`CredentialStore`] facade
//! - **adapters**: the [`VaultGateway`] seam and its implementations (Windows
//!   Credential Manager, in-memory)
//! - **errors**: unified error handling with [`AppError`]
//! - **infra**: logging, paths, configuration
//!
//! ## Security Considerations
//!
//! - Secrets live in [`SecretBuffer`], zeroed on drop and never logged
//! - All unsafe code sits in the Windows gateway
//! - Every vault allocation is freed exactly once via [`VaultBlockGuard`]
//!
//! ## Example
//!
//! ```
//! use passwordsaver_lib::{CredentialStore, MemoryVault, SecretBuffer};
//!
//! let store = CredentialStore::new(MemoryVault::new());
//! let secret = SecretBuffer::from_plain("hunter2");
//! store
//!     .write_credential("myapp:https://example.com/", Some("alice"), Some(&secret), None)
//!     .unwrap();
//!
//! let found = store
//!     .try_get_stored_credential("myapp", "myapp:http://EXAMPLE.com")
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(found.secret(), Some(&secret));
//! ```
mod adapters;
mod core;
mod errors;
mod infra;

pub use adapters::{
    MemoryBlock, MemoryVault, NativeEntry, NativeError, VaultBlockGuard, VaultGateway,
    VaultOperation, WriteRequest, ERROR_INVALID_FLAGS, ERROR_NOT_FOUND, PERSIST_LOCAL_MACHINE,
};
pub use crate::core::*;
pub use errors::AppError;
pub use infra::{
    current_user_name, debug_log, init_tracing, is_debug_mode, set_debug_mode, AppConfig,
};

#[cfg(windows)]
pub use adapters::{WindowsBlock, WindowsVault};

/// Applies `config`: sets debug mode and installs tracing
///
/// Call once at startup, before the first store operation.
pub fn init(config: &AppConfig) -> Result<(), AppError> {
    set_debug_mode(config.debug);
    init_tracing(config)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        short_name = %config.short_name,
        debug = config.debug,
        "PasswordSaver initialized"
    );
    if let Ok(settings) = serde_json::to_string(config) {
        debug_log("INFO", "SYSTEM", "Configuration loaded", Some(&settings));
    }
    debug_log(
        "INFO",
        "SYSTEM",
        &format!("Application version: {}", env!("CARGO_PKG_VERSION")),
        Some(&format!(
            "Operating System: {} ({})",
            std::env::consts::OS,
            std::env::consts::ARCH
        )),
    );
    Ok(())
}

/// Store backed by the Windows Credential Manager
#[cfg(windows)]
pub fn windows_store() -> CredentialStore<WindowsVault> {
    CredentialStore::new(WindowsVault::new())
}
