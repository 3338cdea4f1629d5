//! Windows Credential Manager adapter
//!
//! Provides a safe Rust interface to the Windows Credential Manager API.
//! This module isolates all unsafe Windows API calls; the store above it only
//! sees owned [`NativeEntry`] copies.

use crate::adapters::gateway::{NativeEntry, NativeError, VaultGateway, WriteRequest};
use crate::core::CredentialType;
use crate::errors::AppError;
use std::ffi::{c_void, OsStr};
use std::os::windows::ffi::OsStrExt;
use windows::core::{PCWSTR, PWSTR};
use windows::Win32::Foundation::FILETIME;
use windows::Win32::Security::Credentials::{
    CredDeleteW, CredEnumerateW, CredFree, CredReadW, CredWriteW, CREDENTIALW,
    CRED_ENUMERATE_FLAGS, CRED_FLAGS, CRED_PERSIST, CRED_TYPE,
};
use zeroize::Zeroizing;

/// Memory allocated by Credential Manager on our behalf
///
/// Released through `CredFree` by [`WindowsVault::free`].
#[derive(Debug)]
pub enum WindowsBlock {
    /// Result of `CredReadW`
    Single(*mut CREDENTIALW),
    /// Result of `CredEnumerateW`
    List {
        items: *mut *mut CREDENTIALW,
        count: u32,
    },
}

/// Windows implementation of [`VaultGateway`]
///
/// Uses Windows Credential Manager (CredRead/CredWrite/CredDelete/CredEnumerate
/// APIs); credentials are encrypted at rest by the OS.
pub struct WindowsVault;

impl WindowsVault {
    /// Creates a new Windows vault gateway
    pub fn new() -> Self {
        WindowsVault
    }
}

impl Default for WindowsVault {
    fn default() -> Self {
        Self::new()
    }
}

/// NUL-terminated UTF-16 copy of `value`
fn to_wide(value: &str) -> Vec<u16> {
    OsStr::new(value)
        .encode_wide()
        .chain(std::iter::once(0))
        .collect()
}

/// Maps a `windows` error back to its Win32 code
fn native_error(error: windows::core::Error) -> NativeError {
    let hresult = error.code().0 as u32;
    // HRESULT_FROM_WIN32 packs the Win32 code into FACILITY_WIN32
    let code = if hresult & 0xFFFF_0000 == 0x8007_0000 {
        hresult & 0xFFFF
    } else {
        hresult
    };
    NativeError::new(code, error.message().to_string())
}

fn null_handle(context: &str) -> AppError {
    AppError::InvalidHandle {
        context: context.to_string(),
    }
}

/// # Safety
/// `value` must be null or point to a NUL-terminated UTF-16 string.
unsafe fn read_wide(value: PWSTR, field: &str) -> Result<Option<String>, AppError> {
    if value.is_null() {
        return Ok(None);
    }
    value
        .to_string()
        .map(Some)
        .map_err(|e| AppError::InvalidCredentials {
            reason: format!("cannot decode {}: {}", field, e),
        })
}

/// # Safety
/// `cred` must come from a live Credential Manager allocation.
unsafe fn copy_entry(cred: &CREDENTIALW) -> Result<NativeEntry, AppError> {
    let target_name = read_wide(cred.TargetName, "target name")?.unwrap_or_default();
    let comment = read_wide(cred.Comment, "comment")?;
    let user_name = read_wide(cred.UserName, "user name")?;

    let blob = if cred.CredentialBlob.is_null() {
        None
    } else {
        let bytes =
            std::slice::from_raw_parts(cred.CredentialBlob, cred.CredentialBlobSize as usize);
        Some(Zeroizing::new(bytes.to_vec()))
    };

    Ok(NativeEntry {
        flags: cred.Flags.0,
        credential_type: cred.Type.0,
        target_name,
        comment,
        user_name,
        persist: cred.Persist.0,
        blob,
    })
}

impl VaultGateway for WindowsVault {
    type Block = WindowsBlock;

    fn read(&self, target: &str, kind: CredentialType) -> Result<WindowsBlock, NativeError> {
        let target_name = to_wide(target);
        let mut pcred: *mut CREDENTIALW = std::ptr::null_mut();

        // SAFETY: target_name is NUL-terminated and outlives the call
        unsafe {
            CredReadW(
                PCWSTR::from_raw(target_name.as_ptr()),
                CRED_TYPE(kind.as_raw()),
                0,
                &mut pcred,
            )
        }
        .map_err(native_error)?;

        Ok(WindowsBlock::Single(pcred))
    }

    fn write(&self, request: &WriteRequest<'_>, flags: u32) -> Result<(), NativeError> {
        let mut target_name = to_wide(request.target_name);
        let mut user_name = to_wide(request.user_name);
        let mut comment = request.comment.map(to_wide);

        let cred = CREDENTIALW {
            Flags: CRED_FLAGS(0),
            Type: CRED_TYPE(request.credential_type.as_raw()),
            TargetName: PWSTR(target_name.as_mut_ptr()),
            Comment: comment
                .as_mut()
                .map_or(PWSTR::null(), |wide| PWSTR(wide.as_mut_ptr())),
            LastWritten: FILETIME::default(),
            CredentialBlobSize: request.blob.len() as u32,
            CredentialBlob: if request.blob.is_empty() {
                std::ptr::null_mut()
            } else {
                request.blob.as_ptr() as *mut u8
            },
            Persist: CRED_PERSIST(request.persist),
            AttributeCount: 0,
            Attributes: std::ptr::null_mut(),
            TargetAlias: PWSTR::null(),
            UserName: PWSTR(user_name.as_mut_ptr()),
        };

        // SAFETY: every pointer in `cred` borrows a buffer that outlives the
        // call; CredWriteW copies the data and does not write through them.
        unsafe { CredWriteW(&cred, flags) }.map_err(native_error)
    }

    fn delete(&self, target: &str, kind: CredentialType) -> Result<(), NativeError> {
        let target_name = to_wide(target);

        // SAFETY: target_name is NUL-terminated and outlives the call
        unsafe {
            CredDeleteW(
                PCWSTR::from_raw(target_name.as_ptr()),
                CRED_TYPE(kind.as_raw()),
                0,
            )
        }
        .map_err(native_error)
    }

    fn enumerate(&self, filter: &str) -> Result<WindowsBlock, NativeError> {
        let filter = to_wide(filter);
        let mut count = 0u32;
        let mut items: *mut *mut CREDENTIALW = std::ptr::null_mut();

        // SAFETY: filter is NUL-terminated and outlives the call
        unsafe {
            CredEnumerateW(
                PCWSTR::from_raw(filter.as_ptr()),
                CRED_ENUMERATE_FLAGS(0),
                &mut count,
                &mut items,
            )
        }
        .map_err(native_error)?;

        Ok(WindowsBlock::List { items, count })
    }

    fn free(&self, block: WindowsBlock) {
        let ptr = match block {
            WindowsBlock::Single(cred) => cred as *const c_void,
            WindowsBlock::List { items, .. } => items as *const c_void,
        };
        if !ptr.is_null() {
            // SAFETY: ptr came from CredReadW/CredEnumerateW and the block was
            // moved in, so this is the only release
            unsafe { CredFree(ptr) };
        }
    }

    fn entries(&self, block: &WindowsBlock) -> Result<Vec<NativeEntry>, AppError> {
        match *block {
            WindowsBlock::Single(cred) => {
                if cred.is_null() {
                    return Err(null_handle("CredReadW returned a null credential"));
                }
                // SAFETY: non-null and not yet freed, the block is still owned
                Ok(vec![unsafe { copy_entry(&*cred)? }])
            }
            WindowsBlock::List { items, count } => {
                if items.is_null() {
                    return Err(null_handle("CredEnumerateW returned a null array"));
                }
                // SAFETY: CredEnumerateW reported `count` pointers at `items`
                let creds = unsafe { std::slice::from_raw_parts(items, count as usize) };
                creds
                    .iter()
                    .map(|&cred| {
                        if cred.is_null() {
                            return Err(null_handle("null entry in CredEnumerateW array"));
                        }
                        // SAFETY: entries live as long as the array block
                        unsafe { copy_entry(&*cred) }
                    })
                    .collect()
            }
        }
    }
}
