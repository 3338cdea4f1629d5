//! Core domain types for PasswordSaver

use crate::core::SecretBuffer;
use serde::{Deserialize, Serialize};

/// Credential type as defined by the Credential Manager ABI
///
/// Discriminants are fixed by the native API and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum CredentialType {
    Generic = 1,
    DomainPassword = 2,
    DomainCertificate = 3,
    DomainVisiblePassword = 4,
    GenericCertificate = 5,
    DomainExtended = 6,
    Maximum = 7,
    MaximumEx = 1007,
}

impl CredentialType {
    /// Maps a raw native value back to the enum
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            1 => Some(CredentialType::Generic),
            2 => Some(CredentialType::DomainPassword),
            3 => Some(CredentialType::DomainCertificate),
            4 => Some(CredentialType::DomainVisiblePassword),
            5 => Some(CredentialType::GenericCertificate),
            6 => Some(CredentialType::DomainExtended),
            7 => Some(CredentialType::Maximum),
            1007 => Some(CredentialType::MaximumEx),
            _ => None,
        }
    }

    /// Raw value passed to the native API
    pub fn as_raw(self) -> u32 {
        self as u32
    }
}

/// One credential as stored in the vault
///
/// The record exclusively owns its secret; dropping the record scrubs it.
/// Serializing a record emits metadata only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    credential_type: CredentialType,
    /// Physical key exactly as the vault holds it
    target_name: String,
    /// Lower-cased form of `target_name`
    application_name: String,
    user_name: Option<String>,
    comment: Option<String>,
    #[serde(skip)]
    secret: Option<SecretBuffer>,
}

impl CredentialRecord {
    /// Creates a record; `application_name` is exposed lower-cased
    pub fn new(
        credential_type: CredentialType,
        application_name: impl Into<String>,
        user_name: Option<String>,
        secret: Option<SecretBuffer>,
        comment: Option<String>,
    ) -> Self {
        let target_name = application_name.into();
        CredentialRecord {
            credential_type,
            application_name: target_name.to_lowercase(),
            target_name,
            user_name,
            comment,
            secret,
        }
    }

    pub fn credential_type(&self) -> CredentialType {
        self.credential_type
    }

    /// Application name, always lower case
    pub fn application_name(&self) -> &str {
        &self.application_name
    }

    /// Physical key with its original casing
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn user_name(&self) -> Option<&str> {
        self.user_name.as_deref()
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    pub fn secret(&self) -> Option<&SecretBuffer> {
        self.secret.as_ref()
    }

    /// Hands ownership of the secret to the caller
    pub fn into_secret(self) -> Option<SecretBuffer> {
        self.secret
    }
}
