//! In-memory vault
//!
//! A [`VaultGateway`] backed by a map instead of the OS vault. It mirrors the
//! Credential Manager's observable behavior (case-insensitive keys, `prefix*`
//! enumeration, `ERROR_NOT_FOUND` on misses) and records every native call and
//! outstanding block so tests can check that nothing leaks.

use super::gateway::{
    NativeEntry, NativeError, VaultGateway, WriteRequest, ERROR_NOT_FOUND,
};
use crate::core::CredentialType;
use crate::errors::AppError;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use zeroize::Zeroizing;

/// Vault operations that count as native calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VaultOperation {
    Read,
    Write,
    Delete,
    Enumerate,
}

/// Block handed out by [`MemoryVault`]; deliberately not `Clone`
#[derive(Debug)]
pub struct MemoryBlock {
    id: u64,
    entries: Vec<NativeEntry>,
}

/// Instrumented in-memory vault
#[derive(Default)]
pub struct MemoryVault {
    entries: Mutex<BTreeMap<(String, u32), NativeEntry>>,
    live_blocks: Mutex<HashSet<u64>>,
    next_block: AtomicU64,
    calls: Mutex<HashMap<VaultOperation, usize>>,
    failures: Mutex<HashMap<VaultOperation, NativeError>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn entry_key(target: &str, credential_type: u32) -> (String, u32) {
    (target.to_lowercase(), credential_type)
}

fn not_found() -> NativeError {
    NativeError::new(ERROR_NOT_FOUND, "Element not found.")
}

impl MemoryVault {
    /// Creates an empty vault
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an entry as-is, bypassing the write path and call counters
    ///
    /// Useful for seeding shapes the store never writes itself, such as a null
    /// blob or an unknown credential type.
    pub fn insert_raw(&self, entry: NativeEntry) {
        let key = entry_key(&entry.target_name, entry.credential_type);
        lock(&self.entries).insert(key, entry);
    }

    /// Makes the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: VaultOperation, error: NativeError) {
        lock(&self.failures).insert(operation, error);
    }

    /// Blocks acquired through `read`/`enumerate` and not yet freed
    pub fn outstanding_blocks(&self) -> usize {
        lock(&self.live_blocks).len()
    }

    /// Number of native calls made for one operation
    pub fn call_count(&self, operation: VaultOperation) -> usize {
        lock(&self.calls).get(&operation).copied().unwrap_or(0)
    }

    /// Number of native calls made across all operations
    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    fn begin(&self, operation: VaultOperation) -> Result<(), NativeError> {
        *lock(&self.calls).entry(operation).or_insert(0) += 1;
        match lock(&self.failures).remove(&operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn allocate(&self, entries: Vec<NativeEntry>) -> MemoryBlock {
        let id = self.next_block.fetch_add(1, Ordering::Relaxed);
        lock(&self.live_blocks).insert(id);
        MemoryBlock { id, entries }
    }
}

fn filter_matches(filter: &str, target: &str) -> bool {
    let target = target.to_lowercase();
    match filter.strip_suffix('*') {
        Some(prefix) => target.starts_with(&prefix.to_lowercase()),
        None => target == filter.to_lowercase(),
    }
}

impl VaultGateway for MemoryVault {
    type Block = MemoryBlock;

    fn read(&self, target: &str, kind: CredentialType) -> Result<MemoryBlock, NativeError> {
        self.begin(VaultOperation::Read)?;
        let entry = lock(&self.entries)
            .get(&entry_key(target, kind.as_raw()))
            .cloned()
            .ok_or_else(not_found)?;
        Ok(self.allocate(vec![entry]))
    }

    fn write(&self, request: &WriteRequest<'_>, flags: u32) -> Result<(), NativeError> {
        self.begin(VaultOperation::Write)?;
        let entry = NativeEntry {
            flags,
            credential_type: request.credential_type.as_raw(),
            target_name: request.target_name.to_string(),
            comment: request.comment.map(str::to_string),
            user_name: Some(request.user_name.to_string()),
            persist: request.persist,
            blob: if request.blob.is_empty() {
                None
            } else {
                Some(Zeroizing::new(request.blob.to_vec()))
            },
        };
        self.insert_raw(entry);
        Ok(())
    }

    fn delete(&self, target: &str, kind: CredentialType) -> Result<(), NativeError> {
        self.begin(VaultOperation::Delete)?;
        lock(&self.entries)
            .remove(&entry_key(target, kind.as_raw()))
            .map(|_| ())
            .ok_or_else(not_found)
    }

    fn enumerate(&self, filter: &str) -> Result<MemoryBlock, NativeError> {
        self.begin(VaultOperation::Enumerate)?;
        let matches: Vec<NativeEntry> = lock(&self.entries)
            .values()
            .filter(|entry| filter_matches(filter, &entry.target_name))
            .cloned()
            .collect();

        if matches.is_empty() {
            return Err(not_found());
        }
        Ok(self.allocate(matches))
    }

    fn free(&self, block: MemoryBlock) {
        if !lock(&self.live_blocks).remove(&block.id) {
            tracing::error!(block_id = block.id, "Freed a vault block that was not live");
        }
    }

    fn entries(&self, block: &MemoryBlock) -> Result<Vec<NativeEntry>, AppError> {
        if !lock(&self.live_blocks).contains(&block.id) {
            return Err(AppError::InvalidHandle {
                context: format!("memory block {} is not live", block.id),
            });
        }
        Ok(block.entries.clone())
    }
}
