// File:    vault.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Manages the on-disk vault: persisted OTP key records and named shared keywords.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::alphabet::NormalizedText;
use crate::error::CipherError;
use crate::message_log::{self, MessageLog};
use crate::otp_registry::{KeyRecord, OtpKeyRegistry};
use fs2::FileExt;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::path::Path;

/// File holding the vault state inside a vault directory.
pub const STATE_FILE: &str = "vault_state.json";

/// Lock file guarding a vault against concurrent processes.
pub const LOCK_FILE: &str = ".vault.lock";

/// An exclusive advisory lock (`flock(LOCK_EX)`) on a vault directory.
///
/// Held from loading the state until the last write, so two processes cannot
/// both consume the same OTP key. The lock is released when this value drops.
#[derive(Debug)]
pub struct VaultLock {
    _file: File,
}

/// Blocks until this process holds the vault's lock.
///
/// # Errors
///
/// Returns [`CipherError::Io`] if the lock file cannot be opened or locked.
pub fn lock_vault(vault_path: &Path) -> Result<VaultLock, CipherError> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(vault_path.join(LOCK_FILE))?;
    FileExt::lock_exclusive(&file)?;
    debug!("Locked vault '{}'.", vault_path.display());
    Ok(VaultLock { _file: file })
}

/// A named Vigenère keyword shared between two agents.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SharedKeyword {
    /// Identifier the keyword is looked up by.
    pub id: String,
    /// The normalized keyword.
    pub value: NormalizedText,
    /// Seconds since the Unix epoch when the keyword was saved.
    pub created_at: u64,
}

/// Represents the state of a CipherSafe vault.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct VaultState {
    /// Every OTP key this vault has seen, with its usage flag.
    #[serde(default)]
    pub otp_keys: Vec<KeyRecord>,
    /// Shared keywords by id.
    #[serde(default)]
    pub keywords: BTreeMap<String, SharedKeyword>,
}

impl VaultState {
    /// Adds a shared keyword.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Validation`] if the id is taken or the keyword
    /// has no letters.
    pub fn add_keyword(&mut self, id: &str, value: &str) -> Result<&SharedKeyword, CipherError> {
        if self.keywords.contains_key(id) {
            return Err(CipherError::Validation(format!(
                "a keyword with id '{id}' already exists"
            )));
        }
        let value = NormalizedText::new(value);
        if value.is_empty() {
            return Err(CipherError::Validation(
                "keyword must contain at least one letter".to_string(),
            ));
        }
        let keyword = SharedKeyword {
            id: id.to_string(),
            value,
            created_at: message_log::unix_timestamp(),
        };
        Ok(self.keywords.entry(id.to_string()).or_insert(keyword))
    }

    /// Looks up a shared keyword by id.
    #[must_use]
    pub fn keyword(&self, id: &str) -> Option<&SharedKeyword> {
        self.keywords.get(id)
    }

    /// Rebuilds the single-use registry from the persisted records.
    #[must_use]
    pub fn registry(&self) -> OtpKeyRegistry {
        OtpKeyRegistry::from_records(self.otp_keys.iter().cloned())
    }

    /// Stores the registry's current records back into the state.
    pub fn store_registry(&mut self, registry: &OtpKeyRegistry) {
        self.otp_keys = registry.records();
    }
}

/// Creates a vault directory with an empty state file and message log.
///
/// Existing files are left as they are.
///
/// # Errors
///
/// Returns [`CipherError::Io`] if the directory or files cannot be created.
pub fn init_vault(vault_path: &Path) -> Result<(), CipherError> {
    fs::create_dir_all(vault_path)?;
    if !vault_path.join(STATE_FILE).exists() {
        save_state(vault_path, &VaultState::default())?;
    }
    MessageLog::open(&vault_path.join(message_log::LOG_FILE))?;
    Ok(())
}

/// Loads the state from a specific vault path. A missing state file yields an empty state.
///
/// # Errors
///
/// Returns [`CipherError::Io`] if the file cannot be read, or
/// [`CipherError::Serialization`] if it is not valid vault JSON.
pub fn load_state(vault_path: &Path) -> Result<VaultState, CipherError> {
    let state_file_path = vault_path.join(STATE_FILE);
    if !state_file_path.exists() {
        return Ok(VaultState::default());
    }
    let state_str = fs::read_to_string(&state_file_path)?;
    let state: VaultState = serde_json::from_str(&state_str)?;
    debug!(
        "Loaded vault state from '{}' ({} OTP keys, {} keywords).",
        state_file_path.display(),
        state.otp_keys.len(),
        state.keywords.len()
    );
    Ok(state)
}

/// Saves the state to a specific vault path.
///
/// # Errors
///
/// Returns [`CipherError::Serialization`] or [`CipherError::Io`] on failure.
pub fn save_state(vault_path: &Path, state: &VaultState) -> Result<(), CipherError> {
    let state_file_path = vault_path.join(STATE_FILE);
    let state_str = serde_json::to_string_pretty(state)?;
    fs::write(state_file_path, state_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_keyword_ids_are_rejected() {
        let mut state = VaultState::default();
        state.add_keyword("EP1", "stealth").unwrap();
        assert_eq!(state.keyword("EP1").unwrap().value.as_str(), "STEALTH");
        assert!(matches!(
            state.add_keyword("EP1", "other"),
            Err(CipherError::Validation(_))
        ));
    }

    #[test]
    fn empty_keywords_are_rejected() {
        let mut state = VaultState::default();
        assert!(state.add_keyword("EP2", "1234").is_err());
        assert!(state.keyword("EP2").is_none());
    }

    #[test]
    fn vault_lock_is_exclusive_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = lock_vault(dir.path()).unwrap();
        let other = File::open(dir.path().join(LOCK_FILE)).unwrap();
        assert!(FileExt::try_lock_exclusive(&other).is_err());
        drop(lock);
        assert!(FileExt::try_lock_exclusive(&other).is_ok());
    }

    #[test]
    fn registry_round_trips_through_state() {
        let mut state = VaultState::default();
        let registry = state.registry();
        let key = registry.issue(8).unwrap();
        registry.mark_used(key.as_str());
        state.store_registry(&registry);

        let restored = state.registry();
        assert!(restored.is_used(key.as_str()));
        assert_eq!(restored.len(), 1);
    }
}
