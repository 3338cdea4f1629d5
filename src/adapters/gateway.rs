//! Native vault gateway
//!
//! The narrow seam between the credential store and the operating system
//! vault. Implementations keep every unsafe or raw-memory operation behind
//! this trait, so the store above it only deals with owned values.

use crate::core::CredentialType;
use crate::errors::AppError;
use std::fmt;
use thiserror::Error;
use zeroize::Zeroizing;

/// Win32 `ERROR_NOT_FOUND`
pub const ERROR_NOT_FOUND: u32 = 1168;

/// Win32 `ERROR_INVALID_FLAGS`
pub const ERROR_INVALID_FLAGS: u32 = 1004;

/// `CRED_PERSIST_LOCAL_MACHINE`: survives logons on this machine, never roams
pub const PERSIST_LOCAL_MACHINE: u32 = 2;

/// Failure reported by a native vault call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (native error {code})")]
pub struct NativeError {
    pub code: u32,
    pub message: String,
}

impl NativeError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        NativeError {
            code,
            message: message.into(),
        }
    }

    /// True for the codes the vault uses to say "nothing matched"
    pub fn is_no_match(&self) -> bool {
        self.code == ERROR_NOT_FOUND || self.code == ERROR_INVALID_FLAGS
    }
}

/// Owned copy of the native credential fields the store consumes
///
/// Copied out of vault memory while the native block is still live.
#[derive(Clone)]
pub struct NativeEntry {
    pub flags: u32,
    pub credential_type: u32,
    pub target_name: String,
    pub comment: Option<String>,
    pub user_name: Option<String>,
    pub persist: u32,
    /// Raw blob bytes; `None` when the native blob pointer was null
    pub blob: Option<Zeroizing<Vec<u8>>>,
}

impl fmt::Debug for NativeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeEntry")
            .field("flags", &self.flags)
            .field("credential_type", &self.credential_type)
            .field("target_name", &self.target_name)
            .field("comment", &self.comment)
            .field("user_name", &self.user_name)
            .field("persist", &self.persist)
            .field("blob_len", &self.blob.as_ref().map(|blob| blob.len()))
            .finish()
    }
}

/// Everything a vault write needs, borrowed from the caller
pub struct WriteRequest<'a> {
    pub credential_type: CredentialType,
    pub target_name: &'a str,
    pub user_name: &'a str,
    pub comment: Option<&'a str>,
    /// Secret as little-endian UTF-16; empty when there is no secret
    pub blob: &'a [u8],
    pub persist: u32,
}

/// Operations the credential store needs from an OS vault
///
/// Blocks returned by [`read`](VaultGateway::read) and
/// [`enumerate`](VaultGateway::enumerate) belong to the vault and must be
/// handed back through [`free`](VaultGateway::free) exactly once. Wrap them in
/// a [`VaultBlockGuard`] instead of calling `free` directly.
pub trait VaultGateway: Send + Sync {
    /// Native allocation holding one entry (read) or an entry array (enumerate)
    type Block;

    /// Looks up a single entry by exact key and type
    fn read(&self, target: &str, kind: CredentialType) -> Result<Self::Block, NativeError>;

    /// Creates or replaces an entry
    fn write(&self, request: &WriteRequest<'_>, flags: u32) -> Result<(), NativeError>;

    /// Removes an entry by exact key and type
    fn delete(&self, target: &str, kind: CredentialType) -> Result<(), NativeError>;

    /// Lists entries whose key matches `filter` (`prefix*` wildcard)
    fn enumerate(&self, filter: &str) -> Result<Self::Block, NativeError>;

    /// Releases a block obtained from `read` or `enumerate`
    fn free(&self, block: Self::Block);

    /// Copies the entries out of a live block
    fn entries(&self, block: &Self::Block) -> Result<Vec<NativeEntry>, AppError>;
}

/// Scoped ownership of one vault block
///
/// The block is freed when the guard goes out of scope, on success and error
/// paths alike.
pub struct VaultBlockGuard<'g, G: VaultGateway> {
    gateway: &'g G,
    block: Option<G::Block>,
}

impl<'g, G: VaultGateway> VaultBlockGuard<'g, G> {
    pub fn new(gateway: &'g G, block: G::Block) -> Self {
        VaultBlockGuard {
            gateway,
            block: Some(block),
        }
    }

    /// Copies the entries out of the guarded block
    pub fn entries(&self) -> Result<Vec<NativeEntry>, AppError> {
        let block = self.block.as_ref().ok_or_else(|| AppError::InvalidHandle {
            context: "vault block already released".to_string(),
        })?;
        self.gateway.entries(block)
    }

    /// Frees the block now rather than at end of scope
    pub fn release(&mut self) {
        if let Some(block) = self.block.take() {
            self.gateway.free(block);
        }
    }
}

impl<G: VaultGateway> Drop for VaultBlockGuard<'_, G> {
    fn drop(&mut self) {
        self.release();
    }
}
