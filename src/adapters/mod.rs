//! Vault adapters
//!
//! [`VaultGateway`] is the only seam to native code. The Windows gateway is
//! compiled on Windows only; the in-memory vault is available everywhere.

pub mod gateway;
pub mod memory;
#[cfg(windows)]
pub mod windows;

pub use gateway::{
    NativeEntry, NativeError, VaultBlockGuard, VaultGateway, WriteRequest, ERROR_INVALID_FLAGS,
    ERROR_NOT_FOUND, PERSIST_LOCAL_MACHINE,
};
pub use memory::{MemoryBlock, MemoryVault, VaultOperation};
#[cfg(windows)]
pub use self::windows::{WindowsBlock, WindowsVault};
