//! Windows-specific adapters
//!
//! This module contains platform-specific implementations for Windows.
//! All Windows API calls are isolated here.

pub mod credential_manager;

pub use credential_manager::{WindowsBlock, WindowsVault};
