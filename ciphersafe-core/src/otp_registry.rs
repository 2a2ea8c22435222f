// File:    otp_registry.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Tracks one-time-pad key issuance and enforces that no key ever transforms more than one message.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The single-use key registry.
//!
//! A key moves from `unused` to `used` exactly once and is never forgotten,
//! so a replayed key is always detected. The registry is the only place this
//! policy is enforced; the ciphers trust its verdict.

use crate::alphabet::NormalizedText;
use crate::error::CipherError;
use crate::key_generator::KeyMaterialGenerator;
use log::{debug, info};
use rand::{TryCryptoRng, rngs::OsRng};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A key value and whether it has been consumed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct KeyRecord {
    /// The normalized key.
    pub value: NormalizedText,
    /// Set once the key has transformed a message. Never cleared.
    pub used: bool,
}

#[derive(Debug)]
struct RegistryState<R> {
    generator: KeyMaterialGenerator<R>,
    keys: HashMap<NormalizedText, bool>,
}

/// Issues one-time-pad keys and records their use.
///
/// All operations take `&self`; the check-and-record steps run under one lock,
/// so the registry can be shared between threads without handing out
/// duplicate keys.
#[derive(Debug)]
pub struct OtpKeyRegistry<R = OsRng> {
    state: Mutex<RegistryState<R>>,
}

impl Default for OtpKeyRegistry<OsRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpKeyRegistry<OsRng> {
    /// Creates an empty registry drawing keys from the operating system's secure source.
    #[must_use]
    pub fn new() -> Self {
        Self::with_generator(KeyMaterialGenerator::new())
    }

    /// Restores a registry from previously saved records.
    ///
    /// A key listed more than once is treated as used if any record says so.
    #[must_use]
    pub fn from_records(records: impl IntoIterator<Item = KeyRecord>) -> Self {
        let registry = Self::new();
        {
            let mut state = registry.lock();
            for record in records {
                let used = state.keys.entry(record.value).or_insert(false);
                *used |= record.used;
            }
        }
        registry
    }
}

impl<R: TryCryptoRng> OtpKeyRegistry<R> {
    /// Creates an empty registry around an explicit generator.
    #[must_use]
    pub fn with_generator(generator: KeyMaterialGenerator<R>) -> Self {
        Self {
            state: Mutex::new(RegistryState {
                generator,
                keys: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState<R>> {
        // The map is only mutated by single inserts, so a poisoned lock still holds consistent data.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a fresh key of `length` symbols that this registry has never seen.
    ///
    /// Generation repeats until a new value appears. The loop is unbounded in
    /// principle, though collisions are negligible for non-trivial lengths.
    /// Note that only one key of length zero exists, so it can be issued once.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Entropy`] if the random source fails, or
    /// [`CipherError::KeyReuse`] when asked for a second zero-length key.
    pub fn issue(&self, length: usize) -> Result<NormalizedText, CipherError> {
        let mut state = self.lock();
        loop {
            let candidate = state.generator.generate(length)?;
            if !state.keys.contains_key(&candidate) {
                state.keys.insert(candidate.clone(), false);
                debug!("Issued OTP key of length {length}.");
                return Ok(candidate);
            }
            if length == 0 {
                return Err(CipherError::KeyReuse);
            }
            debug!("Generated OTP key collided with a known key; drawing again.");
        }
    }

    /// Marks `key` as used. Marking an already-used key is a no-op.
    ///
    /// Keys the registry never issued are recorded as used as well.
    pub fn mark_used(&self, key: &str) {
        let key = NormalizedText::new(key);
        let mut state = self.lock();
        state.keys.insert(key, true);
    }

    /// Whether `key` has been used.
    #[must_use]
    pub fn is_used(&self, key: &str) -> bool {
        let key = NormalizedText::new(key);
        self.lock().keys.get(&key).copied().unwrap_or(false)
    }

    /// Whether `key` has been issued by, or recorded in, this registry.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().keys.contains_key(&NormalizedText::new(key))
    }

    /// Runs `transform` with `key` and marks the key used if it succeeds.
    ///
    /// The used-check, the transform and the mark happen under one lock, so two
    /// callers can never both consume the same key. If `transform` fails, the
    /// key's state is left unchanged. `transform` must not call back into the
    /// registry.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::KeyReuse`] if the key was already used, or
    /// whatever error `transform` produced.
    pub fn consume_with<T>(
        &self,
        key: &str,
        transform: impl FnOnce(&NormalizedText) -> Result<T, CipherError>,
    ) -> Result<T, CipherError> {
        let key = NormalizedText::new(key);
        let mut state = self.lock();
        if state.keys.get(&key).copied().unwrap_or(false) {
            return Err(CipherError::KeyReuse);
        }
        let output = transform(&key)?;
        state.keys.insert(key, true);
        info!("OTP key consumed; it can no longer be used.");
        Ok(output)
    }

    /// Snapshot of every known key, sorted by value.
    #[must_use]
    pub fn records(&self) -> Vec<KeyRecord> {
        let state = self.lock();
        let mut records: Vec<KeyRecord> = state
            .keys
            .iter()
            .map(|(value, &used)| KeyRecord {
                value: value.clone(),
                used,
            })
            .collect();
        records.sort_by(|a, b| a.value.cmp(&b.value));
        records
    }

    /// Number of keys known to the registry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().keys.len()
    }

    /// Whether the registry knows no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().keys.is_empty()
    }

    /// Number of keys marked used.
    #[must_use]
    pub fn used_count(&self) -> usize {
        self.lock().keys.values().filter(|&&used| used).count()
    }
}
