#![allow(missing_docs)]
use ciphersafe_core::CipherError;
use ciphersafe_core::alphabet::NormalizedText;
use ciphersafe_core::cipher::CipherKind;
use ciphersafe_core::message_log::{LOG_FILE, MessageLog, MessageStatus, OperationRecord};
use ciphersafe_core::vault;
use std::fs;
use tempfile::tempdir;
use uuid::Uuid;

fn record(ciphertext: &str, plaintext: Option<&str>) -> OperationRecord {
    OperationRecord {
        sender: "ZOE".to_string(),
        receiver: "MISATO".to_string(),
        cipher_kind: CipherKind::Vigenere,
        ciphertext: NormalizedText::new(ciphertext),
        plaintext: plaintext.map(NormalizedText::new),
        key: Some(NormalizedText::new("LEMON")),
    }
}

#[test]
fn test_open_creates_empty_log() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join(LOG_FILE);
    let log = MessageLog::open(&path).expect("Failed to open log");
    assert!(path.exists());
    assert!(log.list_all().is_empty());
}

#[test]
fn test_append_and_lookup() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let mut log = MessageLog::open(&temp_dir.path().join(LOG_FILE)).expect("Failed to open log");

    let sealed = log.append(record("LXFOPVEFRNHR", None)).expect("Failed to append");
    let open = log
        .append(record("LXFOPVEFRNHR", Some("ATTACKATDAWN")))
        .expect("Failed to append");
    assert_ne!(sealed, open);

    let entry = log.get(sealed).expect("Entry should exist");
    assert_eq!(entry.status, MessageStatus::Encrypted);
    assert_eq!(entry.sender, "ZOE");
    assert_eq!(entry.key_used.as_ref().map(NormalizedText::as_str), Some("LEMON"));
    assert!(entry.ciphertext_intact());
    assert_eq!(log.get(open).map(|e| e.status), Some(MessageStatus::Decrypted));

    let pending: Vec<Uuid> = log.list_encrypted_only().iter().map(|e| e.id).collect();
    assert_eq!(pending, vec![sealed]);
    assert_eq!(log.list_all().len(), 2);
    assert!(log.get(Uuid::new_v4()).is_none());
}

#[test]
fn test_record_decryption_updates_entry() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let mut log = MessageLog::open(&temp_dir.path().join(LOG_FILE)).expect("Failed to open log");
    let id = log.append(record("EQNVP", None)).expect("Failed to append");

    log.record_decryption(id, NormalizedText::new("HELLO"))
        .expect("Failed to record decryption");
    let entry = log.get(id).expect("Entry should exist");
    assert_eq!(entry.status, MessageStatus::Decrypted);
    assert_eq!(entry.plaintext.as_ref().map(NormalizedText::as_str), Some("HELLO"));
    assert!(entry.updated_at.is_some());
    assert!(log.list_encrypted_only().is_empty());
}

#[test]
fn test_record_decryption_unknown_id() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let mut log = MessageLog::open(&temp_dir.path().join(LOG_FILE)).expect("Failed to open log");
    let result = log.record_decryption(Uuid::new_v4(), NormalizedText::new("HELLO"));
    assert!(matches!(result, Err(CipherError::NotFound(_))));
}

#[test]
fn test_entries_persist_across_reopen() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join(LOG_FILE);
    let id = {
        let mut log = MessageLog::open(&path).expect("Failed to open log");
        let id = log.append(record("EQNVP", None)).expect("Failed to append");
        log.record_decryption(id, NormalizedText::new("HELLO"))
            .expect("Failed to record decryption");
        id
    };

    let reopened = MessageLog::open(&path).expect("Failed to reopen log");
    let entry = reopened.get(id).expect("Entry should survive reopen");
    assert_eq!(entry.ciphertext.as_str(), "EQNVP");
    assert_eq!(entry.status, MessageStatus::Decrypted);
}

#[test]
fn test_tampered_ciphertext_is_detected() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join(LOG_FILE);
    let id = MessageLog::open(&path)
        .expect("Failed to open log")
        .append(record("EQNVP", None))
        .expect("Failed to append");

    let contents = fs::read_to_string(&path).expect("Failed to read log");
    fs::write(&path, contents.replace("EQNVP", "EQNVQ")).expect("Failed to write log");

    let reopened = MessageLog::open(&path).expect("Failed to reopen log");
    assert!(!reopened.get(id).expect("Entry should exist").ciphertext_intact());
}

#[test]
fn test_corrupt_log_is_a_serialization_error() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join(LOG_FILE);
    fs::write(&path, "{ not json").expect("Failed to write log");
    assert!(matches!(
        MessageLog::open(&path),
        Err(CipherError::Serialization(_))
    ));
}

#[test]
fn test_vault_state_round_trip() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let vault_path = temp_dir.path().join("vault");
    vault::init_vault(&vault_path).expect("Failed to init vault");
    assert!(vault_path.join(vault::STATE_FILE).exists());
    assert!(vault_path.join(LOG_FILE).exists());

    let mut state = vault::load_state(&vault_path).expect("Failed to load state");
    state.add_keyword("EP1", "stealth").expect("Failed to add keyword");
    let registry = state.registry();
    let key = registry.issue(12).expect("Failed to issue key");
    registry.mark_used(key.as_str());
    state.store_registry(&registry);
    vault::save_state(&vault_path, &state).expect("Failed to save state");

    let reloaded = vault::load_state(&vault_path).expect("Failed to reload state");
    assert_eq!(
        reloaded.keyword("EP1").map(|k| k.value.as_str()),
        Some("STEALTH")
    );
    assert!(reloaded.registry().is_used(key.as_str()));
}

#[test]
fn test_missing_state_file_is_empty_state() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let state = vault::load_state(temp_dir.path()).expect("Failed to load state");
    assert!(state.otp_keys.is_empty());
    assert!(state.keywords.is_empty());
}
