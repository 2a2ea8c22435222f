#![allow(missing_docs)]
use ciphersafe_core::CipherError;
use ciphersafe_core::alphabet::NormalizedText;
use ciphersafe_core::cipher::Cipher;
use ciphersafe_core::key_generator::KeyMaterialGenerator;
use ciphersafe_core::otp_registry::{KeyRecord, OtpKeyRegistry};
use ciphersafe_core::vernam::OneTimePadCipher;
use rand::{CryptoRng, RngCore};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

/// Replays a fixed byte script, then repeats it.
struct ScriptedRng {
    script: Vec<u8>,
    position: usize,
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for byte in dst {
            *byte = self.script[self.position % self.script.len()];
            self.position += 1;
        }
    }
}

impl CryptoRng for ScriptedRng {}

#[test]
fn test_issue_then_mark_used() {
    let registry = OtpKeyRegistry::new();
    let key = registry.issue(10).expect("Failed to issue key");
    assert_eq!(key.len(), 10);
    assert!(!registry.is_used(key.as_str()));
    assert!(registry.contains(key.as_str()));

    registry.mark_used(key.as_str());
    assert!(registry.is_used(key.as_str()));
}

#[test]
fn test_mark_used_is_idempotent() {
    let registry = OtpKeyRegistry::new();
    let key = registry.issue(8).expect("Failed to issue key");
    registry.mark_used(key.as_str());
    registry.mark_used(key.as_str());
    assert!(registry.is_used(key.as_str()));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.used_count(), 1);
}

#[test]
fn test_lookups_normalize_the_key() {
    let registry = OtpKeyRegistry::new();
    registry.mark_used("abc def");
    assert!(registry.is_used("ABCDEF"));
    assert!(registry.is_used("a-b-c-d-e-f"));
    assert!(!registry.is_used("ABCDEG"));
}

#[test]
fn test_unknown_key_is_not_used() {
    let registry = OtpKeyRegistry::new();
    assert!(!registry.is_used("NEVERSEEN"));
    assert!(registry.is_empty());
}

#[test]
fn test_consume_with_rejects_replayed_key() {
    let registry = OtpKeyRegistry::new();
    let cipher = OneTimePadCipher::new();
    let key = registry.issue(5).expect("Failed to issue key");

    let ciphertext = registry
        .consume_with(key.as_str(), |k| cipher.encrypt("HELLO", k.as_str()))
        .expect("First use should succeed");
    assert!(registry.is_used(key.as_str()));

    let replay = registry.consume_with(key.as_str(), |k| cipher.decrypt(ciphertext.as_str(), k.as_str()));
    assert_eq!(replay, Err(CipherError::KeyReuse));
}

#[test]
fn test_failed_transform_leaves_key_unused() {
    let registry = OtpKeyRegistry::new();
    let cipher = OneTimePadCipher::new();
    let key = registry.issue(3).expect("Failed to issue key");

    let result = registry.consume_with(key.as_str(), |k| cipher.encrypt("TOOLONGFORKEY", k.as_str()));
    assert!(matches!(result, Err(CipherError::KeyLength { .. })));
    assert!(!registry.is_used(key.as_str()));
}

#[test]
fn test_issue_skips_known_keys() {
    // Each draw consumes a 64-byte refill, so successive keys start at script
    // offsets 0, 1 and 2: "A", "A" again, then "B".
    let rng = ScriptedRng {
        script: vec![0, 0, 1],
        position: 0,
    };
    let registry = OtpKeyRegistry::with_generator(KeyMaterialGenerator::with_rng(rng));
    let first = registry.issue(1).expect("Failed to issue key");
    assert_eq!(first.as_str(), "A");
    registry.mark_used("A");

    let second = registry.issue(1).expect("Failed to issue key");
    assert_eq!(second.as_str(), "B");
}

#[test]
fn test_issue_never_repeats_an_issued_key() {
    let registry = OtpKeyRegistry::new();
    let keys: HashSet<NormalizedText> = (0..200)
        .map(|_| registry.issue(2).expect("Failed to issue key"))
        .collect();
    assert_eq!(keys.len(), 200);
}

#[test]
fn test_zero_length_key_can_only_be_issued_once() {
    let registry = OtpKeyRegistry::new();
    assert!(registry.issue(0).expect("Failed to issue key").is_empty());
    assert_eq!(registry.issue(0), Err(CipherError::KeyReuse));
}

#[test]
fn test_restored_registry_still_rejects_used_keys() {
    let records = vec![
        KeyRecord {
            value: NormalizedText::new("USEDKEY"),
            used: true,
        },
        KeyRecord {
            value: NormalizedText::new("FRESHKEY"),
            used: false,
        },
    ];
    let registry = OtpKeyRegistry::from_records(records);
    assert!(registry.is_used("USEDKEY"));
    assert!(!registry.is_used("FRESHKEY"));
    assert_eq!(
        registry.consume_with("usedkey", |k| Ok(k.clone())),
        Err(CipherError::KeyReuse)
    );
}

#[test]
fn test_records_snapshot_is_sorted() {
    let registry = OtpKeyRegistry::new();
    registry.mark_used("ZULU");
    registry.mark_used("ALPHA");
    let values: Vec<String> = registry
        .records()
        .into_iter()
        .map(|r| r.value.into_string())
        .collect();
    assert_eq!(values, vec!["ALPHA".to_string(), "ZULU".to_string()]);
}

#[test]
fn test_concurrent_issue_hands_out_distinct_keys() {
    let registry = Arc::new(OtpKeyRegistry::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                (0..50)
                    .map(|_| registry.issue(3).expect("Failed to issue key"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in handles {
        for key in handle.join().expect("Issuing thread panicked") {
            assert!(all.insert(key), "The same key was issued twice");
        }
    }
    assert_eq!(all.len(), 400);
    assert_eq!(registry.len(), 400);
}

#[test]
fn test_concurrent_consume_allows_exactly_one_use() {
    let registry = Arc::new(OtpKeyRegistry::new());
    let key = registry.issue(12).expect("Failed to issue key");
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            let key = key.clone();
            thread::spawn(move || registry.consume_with(key.as_str(), |_| Ok(())).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().expect("Consuming thread panicked"))
        .filter(|&ok| ok)
        .count();
    assert_eq!(successes, 1);
    assert!(registry.is_used(key.as_str()));
}
