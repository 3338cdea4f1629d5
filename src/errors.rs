//! Error types for PasswordSaver
//!
//! This module defines the error hierarchy for the credential store, keeping
//! "nothing found" results apart from genuine failures.

use crate::adapters::NativeError;
use std::io;
use thiserror::Error;

/// Main error type for PasswordSaver
///
/// Lookups that find nothing are not errors: they come back as `Ok(None)` or an
/// empty list. The variants below are what a caller must actually handle.
///
/// # Architecture Notes
/// - Uses thiserror for automatic Display and Error trait implementations
/// - Native failures keep the Win32 code through [`NativeError`]
/// - Front-ends serialize the error via the `Serialize` impl below
#[derive(Debug, Error)]
pub enum AppError {
    /// Delete found no stored credential matching the application name
    #[error("No Credential have been found")]
    CredentialsNotFound {
        target: String,
    },

    /// Secret exceeds the vault blob limit; raised before any native call
    #[error("The secret message has exceeded {limit} bytes.")]
    SecretTooLarge {
        byte_len: usize,
        limit: usize,
    },

    /// A Credential Manager call failed
    #[error("Windows Credential Manager error: {operation}")]
    CredentialManagerError {
        operation: String,
        #[source]
        source: NativeError,
    },

    /// Attempt to read through a native block that was already released or is null
    #[error("Invalid credential handle: {context}")]
    InvalidHandle {
        context: String,
    },

    /// Native data could not be decoded into a credential
    #[error("Invalid credentials: {reason}")]
    InvalidCredentials {
        reason: String,
    },

    /// File I/O error
    #[error("File I/O error: {path}")]
    IoError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Generic error with context
    #[error("{message}")]
    Other {
        message: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl AppError {
    /// Returns an error code for categorization
    pub fn code(&self) -> &'static str {
        match self {
            AppError::CredentialsNotFound { .. } => "CRED_NOT_FOUND",
            AppError::SecretTooLarge { .. } => "SECRET_TOO_LARGE",
            AppError::CredentialManagerError { .. } => "CRED_MANAGER",
            AppError::InvalidHandle { .. } => "INVALID_HANDLE",
            AppError::InvalidCredentials { .. } => "CRED_INVALID",
            AppError::IoError { .. } => "IO_ERROR",
            AppError::Other { .. } => "GENERAL",
        }
    }

    /// Returns the Win32 error code when the failure came from the vault
    pub fn native_code(&self) -> Option<u32> {
        match self {
            AppError::CredentialManagerError { source, .. } => Some(source.code),
            _ => None,
        }
    }

    /// Returns a user-friendly error message suitable for display
    ///
    /// For vault failures this is the native message text, which is what the
    /// delete operation reports back to its caller.
    pub fn user_message(&self) -> String {
        match self {
            AppError::CredentialsNotFound { .. } => self.to_string(),
            AppError::SecretTooLarge { .. } => self.to_string(),
            AppError::CredentialManagerError { source, .. } => source.message.clone(),
            AppError::InvalidHandle { .. } => {
                "Internal error while reading from Credential Manager".to_string()
            }
            AppError::InvalidCredentials { reason } => {
                format!("Invalid credentials: {}", reason)
            }
            AppError::IoError { path, .. } => {
                format!("Failed to access file: {}", path)
            }
            AppError::Other { message, .. } => message.clone(),
        }
    }

    /// Returns optional remediation steps for the error
    pub fn remediation(&self) -> Option<String> {
        match self {
            AppError::SecretTooLarge { limit, .. } => Some(format!(
                "Use a secret of at most {} characters.",
                limit / 2
            )),
            AppError::CredentialManagerError { .. } => Some(
                "Check Windows Credential Manager (Control Panel > Credential Manager).".to_string(),
            ),
            _ => None,
        }
    }

    /// Returns the category for error logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::CredentialsNotFound { .. } |
            AppError::SecretTooLarge { .. } |
            AppError::CredentialManagerError { .. } |
            AppError::InvalidHandle { .. } |
            AppError::InvalidCredentials { .. } => "CREDENTIALS",

            AppError::IoError { .. } => "FILE_SYSTEM",

            AppError::Other { .. } => "GENERAL",
        }
    }
}

// Implement Serialize for sending errors to a front-end
impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("AppError", 5)?;
        state.serialize_field("message", &self.user_message())?;
        state.serialize_field("code", &self.code())?;
        state.serialize_field("category", &self.category())?;
        state.serialize_field("nativeCode", &self.native_code())?;
        state.serialize_field("remediation", &self.remediation())?;
        state.end()
    }
}

// Convert AppError to String for front-end command compatibility
impl From<AppError> for String {
    fn from(err: AppError) -> String {
        err.user_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_exact() {
        let err = AppError::CredentialsNotFound {
            target: "app".to_string(),
        };
        assert_eq!(err.to_string(), "No Credential have been found");
        assert_eq!(err.user_message(), "No Credential have been found");
    }

    #[test]
    fn test_secret_too_large_message() {
        let err = AppError::SecretTooLarge {
            byte_len: 2562,
            limit: 2560,
        };
        assert_eq!(
            err.to_string(),
            "The secret message has exceeded 2560 bytes."
        );
        assert_eq!(err.code(), "SECRET_TOO_LARGE");
        assert_eq!(err.native_code(), None);
    }

    #[test]
    fn test_native_error_surfaces_code_and_message() {
        let err = AppError::CredentialManagerError {
            operation: "delete credential 'app:x'".to_string(),
            source: NativeError::new(5, "Access is denied."),
        };
        assert_eq!(err.native_code(), Some(5));
        assert_eq!(err.user_message(), "Access is denied.");
        assert_eq!(err.category(), "CREDENTIALS");
    }

    #[test]
    fn test_serialize_for_frontend() {
        let err = AppError::CredentialManagerError {
            operation: "read".to_string(),
            source: NativeError::new(1312, "A specified logon session does not exist."),
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CRED_MANAGER");
        assert_eq!(json["nativeCode"], 1312);
        assert_eq!(json["message"], "A specified logon session does not exist.");
    }
}
