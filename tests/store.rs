//! Credential store behavior against the instrumented in-memory vault

use passwordsaver_lib::{
    normalize_logical_name, to_physical_key, AppError, CredentialStore, CredentialType,
    MemoryVault, NativeEntry, NativeError, SecretBuffer, VaultOperation, ERROR_INVALID_FLAGS,
    ERROR_NOT_FOUND, MAX_SECRET_BYTES, PERSIST_LOCAL_MACHINE,
};

const APP: &str = "app";

fn store() -> CredentialStore<MemoryVault> {
    CredentialStore::new(MemoryVault::new())
}

fn secret_of_chars(count: usize) -> SecretBuffer {
    SecretBuffer::from_plain(&"x".repeat(count))
}

#[test]
fn test_write_then_read_returns_equal_secret() {
    let store = store();
    let key = to_physical_key(APP, "mail");

    for plain in ["p", "correct horse battery staple", "pässwörd €🔑"] {
        let secret = SecretBuffer::from_plain(plain);
        store
            .write_credential(&key, Some("alice"), Some(&secret), Some("personal"))
            .unwrap();

        let record = store.read_credential(&key).unwrap().unwrap();
        assert!(record.secret().unwrap().ct_eq(&secret));
        assert_eq!(record.user_name(), Some("alice"));
        assert_eq!(record.comment(), Some("personal"));
        assert_eq!(record.credential_type(), CredentialType::Generic);
    }

    assert_eq!(store.gateway().outstanding_blocks(), 0);
}

#[test]
fn test_secret_ending_in_nul_round_trips() {
    let store = store();
    let mut secret = SecretBuffer::from_plain("pw");
    secret.push('\0');

    store
        .write_credential("app:x", Some("alice"), Some(&secret), None)
        .unwrap();
    let record = store.read_credential("app:x").unwrap().unwrap();

    assert_eq!(record.secret().map(SecretBuffer::len), Some(3));
    assert_eq!(record.secret(), Some(&secret));
}

#[test]
fn test_secret_at_limit_is_accepted() {
    let store = store();
    let secret = secret_of_chars(MAX_SECRET_BYTES / 2);
    assert_eq!(secret.byte_len(), 2560);

    store
        .write_credential("app:big", Some("alice"), Some(&secret), None)
        .unwrap();
    let record = store.read_credential("app:big").unwrap().unwrap();
    assert_eq!(record.secret(), Some(&secret));
}

#[test]
fn test_oversized_secret_fails_without_native_call() {
    let store = store();
    let secret = secret_of_chars(MAX_SECRET_BYTES / 2 + 1);

    let err = store
        .write_credential("app:big", Some("alice"), Some(&secret), None)
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::SecretTooLarge {
            byte_len: 2562,
            limit: 2560
        }
    ));
    assert_eq!(store.gateway().total_calls(), 0);
    assert!(store.gateway().is_empty());
}

#[test]
fn test_write_without_secret_or_user() {
    let store = store();
    store.write_credential("app:nosecret", None, None, None).unwrap();

    let record = store.read_credential("app:nosecret").unwrap().unwrap();
    assert!(record.secret().is_none());
    assert_eq!(
        record.user_name(),
        Some(passwordsaver_lib::current_user_name().as_str())
    );
}

#[test]
fn test_write_native_failure_is_wrapped() {
    let store = store();
    store
        .gateway()
        .fail_next(VaultOperation::Write, NativeError::new(1312, "A specified logon session does not exist."));

    let err = store
        .write_credential("app:mail", Some("alice"), Some(&SecretBuffer::from_plain("pw")), None)
        .unwrap_err();

    assert_eq!(err.native_code(), Some(1312));
    assert_eq!(err.to_string(), "Windows Credential Manager error: Cannot write to credentialManager.");
    assert_eq!(store.gateway().outstanding_blocks(), 0);
}

#[test]
fn test_read_missing_is_none() {
    let store = store();
    assert!(store.read_credential("app:missing").unwrap().is_none());
}

#[test]
fn test_read_other_failure_is_error() {
    let store = store();
    store
        .gateway()
        .fail_next(VaultOperation::Read, NativeError::new(5, "Access is denied."));

    let err = store.read_credential("app:mail").unwrap_err();
    assert_eq!(err.native_code(), Some(5));
}

#[test]
fn test_enumerate_empty_namespace_is_empty() {
    let store = store();
    store
        .write_credential("other:mail", Some("bob"), None, None)
        .unwrap();

    assert!(store.enumerate_credentials(APP).unwrap().is_empty());
}

#[test]
fn test_enumerate_no_match_codes_are_empty() {
    let store = store();
    store.write_credential("app:mail", Some("bob"), None, None).unwrap();

    for code in [ERROR_NOT_FOUND, ERROR_INVALID_FLAGS] {
        store
            .gateway()
            .fail_next(VaultOperation::Enumerate, NativeError::new(code, "nothing"));
        assert!(store.enumerate_credentials(APP).unwrap().is_empty());
    }
}

#[test]
fn test_enumerate_other_failure_is_error() {
    let store = store();
    store
        .gateway()
        .fail_next(VaultOperation::Enumerate, NativeError::new(5, "Access is denied."));

    let err = store.enumerate_credentials(APP).unwrap_err();
    assert!(matches!(err, AppError::CredentialManagerError { .. }));
}

#[test]
fn test_enumerate_returns_only_own_namespace_lowercased() {
    let store = store();
    store.write_credential("App:Mail", Some("a"), None, None).unwrap();
    store.write_credential("app:https://Bank.com/", Some("b"), None, None).unwrap();
    store.write_credential("other:mail", Some("c"), None, None).unwrap();

    let mut names: Vec<String> = store
        .enumerate_credentials(APP)
        .unwrap()
        .iter()
        .map(|r| r.application_name().to_string())
        .collect();
    names.sort();

    assert_eq!(names, vec!["app:https://bank.com/", "app:mail"]);
    assert_eq!(store.gateway().outstanding_blocks(), 0);
}

#[test]
fn test_lookup_ignores_case_scheme_and_slash() {
    let store = store();
    let secret = SecretBuffer::from_plain("s3cret");
    store
        .write_credential("app:https://Host.com/", Some("alice"), Some(&secret), None)
        .unwrap();

    let record = store
        .try_get_stored_credential(APP, "app:http://host.com")
        .unwrap()
        .unwrap();

    assert_eq!(record.target_name(), "app:https://Host.com/");
    assert_eq!(record.secret(), Some(&secret));
}

#[test]
fn test_lookup_miss_is_none() {
    let store = store();
    store
        .write_credential("app:https://host.com/", Some("alice"), None, None)
        .unwrap();

    assert!(store
        .try_get_stored_credential(APP, "app:http://host.org")
        .unwrap()
        .is_none());
    assert!(store
        .try_get_stored_credential(APP, "app:anything")
        .unwrap()
        .is_none());
}

#[test]
fn test_delete_without_match_reports_message() {
    let store = store();

    let err = store.delete_credential(APP, "app:mail").unwrap_err();
    assert_eq!(err.to_string(), "No Credential have been found");
    assert_eq!(err.user_message(), "No Credential have been found");
}

#[test]
fn test_delete_by_prefix_removes_stored_key() {
    let store = store();
    store.write_credential("App:Mail", Some("a"), None, None).unwrap();
    store.write_credential("app:news", Some("b"), None, None).unwrap();

    store.delete_credential(APP, "app:ma").unwrap();

    assert!(store.read_credential("app:mail").unwrap().is_none());
    assert!(store.read_credential("app:news").unwrap().is_some());
}

#[test]
fn test_delete_prefix_ignores_input_case() {
    let store = store();
    store.write_credential("app:mail", Some("a"), None, None).unwrap();

    store.delete_credential(APP, "App:MA").unwrap();
    assert!(store.gateway().is_empty());
}

#[test]
fn test_delete_empty_name_deletes_nothing() {
    let store = store();
    store.write_credential("app:mail", Some("a"), None, None).unwrap();

    let err = store.delete_credential(APP, "").unwrap_err();
    assert_eq!(err.to_string(), "No Credential have been found");
    assert_eq!(store.gateway().len(), 1);
}

#[test]
fn test_delete_matches_normalized_name() {
    let store = store();
    store
        .write_credential("app:https://host.com/", Some("a"), None, None)
        .unwrap();

    store.delete_credential(APP, "host.com").unwrap();
    assert!(store.gateway().is_empty());
}

#[test]
fn test_delete_native_failure_carries_native_message() {
    let store = store();
    store.write_credential("app:mail", Some("a"), None, None).unwrap();
    store
        .gateway()
        .fail_next(VaultOperation::Delete, NativeError::new(5, "Access is denied."));

    let err = store.delete_credential(APP, "app:mail").unwrap_err();
    assert_eq!(err.user_message(), "Access is denied.");
    assert_eq!(store.gateway().len(), 1);
}

#[test]
fn test_no_blocks_leak_across_mixed_operations() {
    let store = store();
    let vault = store.gateway();
    let secret = SecretBuffer::from_plain("pw");

    store.write_credential("app:a", Some("u"), Some(&secret), None).unwrap();
    store.write_credential("app:b", Some("u"), Some(&secret), None).unwrap();
    let _ = store.write_credential("app:c", Some("u"), Some(&secret_of_chars(2000)), None);

    store.read_credential("app:a").unwrap();
    store.read_credential("app:zzz").unwrap();
    store.enumerate_credentials(APP).unwrap();
    store.try_get_stored_credential(APP, "app:b").unwrap();

    vault.fail_next(VaultOperation::Read, NativeError::new(5, "denied"));
    let _ = store.read_credential("app:a");
    vault.fail_next(VaultOperation::Enumerate, NativeError::new(5, "denied"));
    let _ = store.enumerate_credentials(APP);
    vault.fail_next(VaultOperation::Delete, NativeError::new(5, "denied"));
    let _ = store.delete_credential(APP, "app:a");

    store.delete_credential(APP, "app:a").unwrap();
    let _ = store.delete_credential(APP, "app:nothing");

    vault.insert_raw(NativeEntry {
        flags: 0,
        credential_type: 99,
        target_name: "app:corrupt".to_string(),
        comment: None,
        user_name: None,
        persist: PERSIST_LOCAL_MACHINE,
        blob: None,
    });
    assert!(store.enumerate_credentials(APP).is_err());
    assert!(store.read_credential("app:corrupt").unwrap().is_none());
    assert!(store.try_get_stored_credential(APP, "app:b").is_err());

    assert!(vault.call_count(VaultOperation::Read) > 0);
    assert!(vault.call_count(VaultOperation::Enumerate) > 0);
    assert_eq!(vault.outstanding_blocks(), 0);
}

#[test]
fn test_codec_examples() {
    assert_eq!(normalize_logical_name("app:https://host.com/", "app"), "host.com");
    assert_eq!(normalize_logical_name("app:http://host.com", "app"), "host.com");
    assert_eq!(normalize_logical_name("other:thing", "app"), "other:thing");
    assert_eq!(to_physical_key("app", "svc"), "app:svc");
}
