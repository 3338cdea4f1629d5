//! Credential store
//!
//! The facade callers use to read, write, delete and list credentials. It
//! shapes keys with [`naming`](crate::core::naming), talks to the vault through
//! a [`VaultGateway`], and turns native entries into [`CredentialRecord`]s.
//!
//! # Resource handling
//! Every block the vault hands back is held in a [`VaultBlockGuard`], so it is
//! freed exactly once however the operation ends. Marshalled secret bytes are
//! zeroing buffers dropped at the end of the call.
//!
//! # Concurrency
//! The store keeps no mutable state and does no locking. Each call is a
//! blocking native round trip; callers that share a vault across threads
//! coordinate themselves.

use crate::adapters::{
    NativeEntry, VaultBlockGuard, VaultGateway, WriteRequest, ERROR_NOT_FOUND,
    PERSIST_LOCAL_MACHINE,
};
use crate::core::naming::{enumeration_filter, names_match, normalize_logical_name};
use crate::core::{CredentialRecord, CredentialType, SecretBuffer};
use crate::errors::AppError;
use crate::infra::{current_user_name, debug_log};
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

/// Largest secret the vault accepts, in bytes (UTF-16, two bytes per character)
pub const MAX_SECRET_BYTES: usize = 512 * 5;

/// Credential store over an OS vault
pub struct CredentialStore<G: VaultGateway> {
    gateway: G,
}

impl<G: VaultGateway> CredentialStore<G> {
    /// Creates a store on top of `gateway`
    pub fn new(gateway: G) -> Self {
        CredentialStore { gateway }
    }

    /// The underlying gateway
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Finds the stored credential for an application name
    ///
    /// Both the requested name and every stored name are normalized first, so
    /// `app:https://Host.com/` and `app:http://host.com` are the same entry.
    ///
    /// # Returns
    /// * `Ok(Some(record))` - First matching credential
    /// * `Ok(None)` - Nothing matches (not an error)
    /// * `Err(AppError)` - Enumeration failed
    pub fn try_get_stored_credential(
        &self,
        short_name: &str,
        application_name: &str,
    ) -> Result<Option<CredentialRecord>, AppError> {
        let found = self
            .enumerate_credentials(short_name)?
            .into_iter()
            .find(|record| names_match(record.application_name(), application_name, short_name));

        debug!(
            short_name,
            application_name,
            found = found.is_some(),
            "Looked up stored credential"
        );

        Ok(found)
    }

    /// Reads one generic credential by its exact physical key
    ///
    /// # Returns
    /// * `Ok(Some(record))` - Credential exists
    /// * `Ok(None)` - No entry under this key
    /// * `Err(AppError)` - Any other native failure, with its code
    pub fn read_credential(&self, physical_key: &str) -> Result<Option<CredentialRecord>, AppError> {
        let block = match self.gateway.read(physical_key, CredentialType::Generic) {
            Ok(block) => block,
            Err(e) if e.code == ERROR_NOT_FOUND => {
                debug!(target_name = physical_key, "No credential stored under key");
                return Ok(None);
            }
            Err(e) => {
                error!(
                    target_name = physical_key,
                    native_code = e.code,
                    "Failed to read credential"
                );
                debug_log(
                    "ERROR",
                    "CREDENTIALS",
                    &format!("Failed to read credential '{}'", physical_key),
                    Some(&e.to_string()),
                );
                return Err(AppError::CredentialManagerError {
                    operation: format!("read credential '{}'", physical_key),
                    source: e,
                });
            }
        };

        let guard = VaultBlockGuard::new(&self.gateway, block);
        let entry = guard
            .entries()?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::InvalidHandle {
                context: format!("read of '{}' returned no entry", physical_key),
            })?;
        let record = to_record(entry)?;

        debug!(
            target_name = physical_key,
            has_secret = record.secret().is_some(),
            "Read credential"
        );
        Ok(Some(record))
    }

    /// Stores a generic, machine-local credential
    ///
    /// # Arguments
    /// * `application_name` - Physical key to store under
    /// * `user_name` - Defaults to the current OS user when `None`
    /// * `secret` - At most [`MAX_SECRET_BYTES`]; `None` stores no blob
    /// * `comment` - Optional; an empty comment is stored as none
    ///
    /// # Errors
    /// * `AppError::SecretTooLarge` - Checked before any native call
    /// * `AppError::CredentialManagerError` - The vault rejected the write
    pub fn write_credential(
        &self,
        application_name: &str,
        user_name: Option<&str>,
        secret: Option<&SecretBuffer>,
        comment: Option<&str>,
    ) -> Result<(), AppError> {
        let byte_len = secret.map_or(0, SecretBuffer::byte_len);
        if byte_len > MAX_SECRET_BYTES {
            warn!(
                target_name = application_name,
                byte_len,
                limit = MAX_SECRET_BYTES,
                "Rejected oversized secret"
            );
            return Err(AppError::SecretTooLarge {
                byte_len,
                limit: MAX_SECRET_BYTES,
            });
        }

        let blob = secret
            .map(SecretBuffer::to_utf16_le_bytes)
            .unwrap_or_else(|| Zeroizing::new(Vec::new()));
        let user_name = user_name
            .map(str::to_string)
            .unwrap_or_else(current_user_name);

        let request = WriteRequest {
            credential_type: CredentialType::Generic,
            target_name: application_name,
            user_name: &user_name,
            comment: comment.filter(|c| !c.is_empty()),
            blob: &blob,
            persist: PERSIST_LOCAL_MACHINE,
        };

        self.gateway.write(&request, 0).map_err(|e| {
            error!(
                target_name = application_name,
                native_code = e.code,
                "Failed to write credential"
            );
            debug_log(
                "ERROR",
                "CREDENTIALS",
                &format!("Failed to write credential '{}'", application_name),
                Some(&e.to_string()),
            );
            AppError::CredentialManagerError {
                operation: "Cannot write to credentialManager.".to_string(),
                source: e,
            }
        })?;

        // SECURITY: only the size of the secret is ever logged
        info!(
            target_name = application_name,
            user_name = %user_name,
            byte_len,
            "Credential written"
        );
        Ok(())
    }

    /// Writes a caller-built record under its target name
    ///
    /// The record is always stored as a generic credential.
    pub fn write_record(&self, record: &CredentialRecord) -> Result<(), AppError> {
        self.write_credential(
            record.target_name(),
            record.user_name(),
            record.secret(),
            record.comment(),
        )
    }

    /// Deletes the first stored credential whose name starts with `application_name`
    ///
    /// The prefix is compared against both the full stored name and its
    /// normalized form. This is a prefix match, not equality. `application_name`
    /// is lower-cased first, so `"App:Ma"` matches a stored `app:mail`.
    ///
    /// An empty `application_name` matches nothing and returns
    /// `CredentialsNotFound`; it never deletes the first stored entry.
    ///
    /// # Errors
    /// * `AppError::CredentialsNotFound` - Nothing matched ("No Credential have been found")
    /// * `AppError::CredentialManagerError` - The vault refused the delete;
    ///   `user_message()` gives the native message
    pub fn delete_credential(&self, short_name: &str, application_name: &str) -> Result<(), AppError> {
        let prefix = application_name.to_lowercase();
        let records = if prefix.is_empty() {
            Vec::new()
        } else {
            self.enumerate_credentials(short_name)?
        };

        let Some(record) = records.iter().find(|record| {
            record.application_name().starts_with(&prefix)
                || normalize_logical_name(record.application_name(), short_name)
                    .starts_with(&prefix)
        }) else {
            info!(short_name, application_name, "No credential matched delete request");
            return Err(AppError::CredentialsNotFound {
                target: application_name.to_string(),
            });
        };

        self.gateway
            .delete(record.target_name(), record.credential_type())
            .map_err(|e| {
                error!(
                    target_name = record.target_name(),
                    native_code = e.code,
                    "Failed to delete credential"
                );
                debug_log(
                    "ERROR",
                    "CREDENTIALS",
                    &format!("Failed to delete credential '{}'", record.target_name()),
                    Some(&e.to_string()),
                );
                AppError::CredentialManagerError {
                    operation: format!("delete credential '{}'", record.target_name()),
                    source: e,
                }
            })?;

        info!(target_name = record.target_name(), "Credential deleted");
        Ok(())
    }

    /// Lists every credential owned by `short_name`
    ///
    /// # Returns
    /// * `Ok(records)` - Possibly empty; "not found" and "invalid flags" mean nothing matched
    /// * `Err(AppError)` - Any other native failure
    pub fn enumerate_credentials(&self, short_name: &str) -> Result<Vec<CredentialRecord>, AppError> {
        let filter = enumeration_filter(short_name);

        let block = match self.gateway.enumerate(&filter) {
            Ok(block) => block,
            Err(e) if e.is_no_match() => {
                debug!(filter = %filter, native_code = e.code, "No credentials match filter");
                return Ok(Vec::new());
            }
            Err(e) => {
                error!(filter = %filter, native_code = e.code, "Failed to enumerate credentials");
                debug_log(
                    "ERROR",
                    "CREDENTIALS",
                    &format!("Failed to enumerate credentials with filter '{}'", filter),
                    Some(&e.to_string()),
                );
                return Err(AppError::CredentialManagerError {
                    operation: format!("enumerate credentials '{}'", filter),
                    source: e,
                });
            }
        };

        let mut guard = VaultBlockGuard::new(&self.gateway, block);
        let records = guard
            .entries()?
            .into_iter()
            .map(to_record)
            .collect::<Result<Vec<_>, _>>()?;
        guard.release();

        debug!(filter = %filter, count = records.len(), "Enumerated credentials");
        Ok(records)
    }
}

/// Converts a copied native entry into a record
///
/// The blob is read as exactly `len / 2` UTF-16 characters, so whatever was
/// written comes back unchanged. An empty blob means no secret.
fn to_record(entry: NativeEntry) -> Result<CredentialRecord, AppError> {
    let credential_type =
        CredentialType::from_raw(entry.credential_type).ok_or_else(|| {
            AppError::InvalidCredentials {
                reason: format!(
                    "unknown credential type {} for '{}'",
                    entry.credential_type, entry.target_name
                ),
            }
        })?;

    let secret = entry
        .blob
        .as_ref()
        .map(|bytes| SecretBuffer::from_utf16_le_bytes(bytes))
        .filter(|secret| !secret.is_empty());

    Ok(CredentialRecord::new(
        credential_type,
        entry.target_name,
        entry.user_name,
        secret,
        entry.comment,
    ))
}
