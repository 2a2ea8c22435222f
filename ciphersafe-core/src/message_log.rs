// File:    message_log.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: A JSON-backed log of every encrypted and decrypted message, keyed by message id.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The message log ("diary").
//!
//! The log records what each cipher operation produced. It assigns ids and
//! timestamps and owns the persistence format; the ciphers know nothing of it.

use crate::alphabet::NormalizedText;
use crate::cipher::CipherKind;
use crate::error::CipherError;
use log::debug;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// File holding the message log inside a vault directory.
pub const LOG_FILE: &str = "message_log.json";

const LOG_VERSION: &str = "1.0";

/// Seconds since the Unix epoch, or zero if the clock is before it.
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

fn ciphertext_digest(ciphertext: &NormalizedText) -> String {
    format!("{:x}", Sha256::digest(ciphertext.as_str().as_bytes()))
}

/// What a completed cipher operation hands to the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRecord {
    /// Sending agent.
    pub sender: String,
    /// Receiving agent.
    pub receiver: String,
    /// Cipher that produced `ciphertext`.
    pub cipher_kind: CipherKind,
    /// The ciphertext.
    pub ciphertext: NormalizedText,
    /// The plaintext, if known.
    pub plaintext: Option<NormalizedText>,
    /// The key or keyword, if it should be kept.
    pub key: Option<NormalizedText>,
}

/// Whether a logged message has been decrypted yet.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Only the ciphertext is known.
    Encrypted,
    /// The plaintext has been recovered.
    Decrypted,
}

/// One entry in the log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MessageEntry {
    /// Identifier assigned by the log.
    pub id: Uuid,
    /// Sending agent.
    pub sender: String,
    /// Receiving agent.
    pub receiver: String,
    /// Cipher that produced the ciphertext.
    pub cipher_kind: CipherKind,
    /// The ciphertext.
    pub ciphertext: NormalizedText,
    /// Hex SHA-256 of the ciphertext as first logged.
    pub ciphertext_sha256: String,
    /// The plaintext, once known.
    pub plaintext: Option<NormalizedText>,
    /// The key the entry was produced with, if recorded.
    pub key_used: Option<NormalizedText>,
    /// Seconds since the Unix epoch when the entry was added.
    pub created_at: u64,
    /// Seconds since the Unix epoch of the last update.
    #[serde(default)]
    pub updated_at: Option<u64>,
    /// Encryption state.
    pub status: MessageStatus,
}

impl MessageEntry {
    /// Whether the stored ciphertext still matches the hash taken when it was logged.
    #[must_use]
    pub fn ciphertext_intact(&self) -> bool {
        ciphertext_digest(&self.ciphertext) == self.ciphertext_sha256
    }
}

#[derive(Serialize, Deserialize, Debug)]
struct LogDocument {
    version: String,
    messages: Vec<MessageEntry>,
}

impl Default for LogDocument {
    fn default() -> Self {
        Self {
            version: LOG_VERSION.to_string(),
            messages: Vec::new(),
        }
    }
}

/// A message log bound to a JSON file. Every mutation is written through.
#[derive(Debug)]
pub struct MessageLog {
    path: PathBuf,
    document: LogDocument,
}

impl MessageLog {
    /// Opens the log at `path`, creating an empty one if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Io`] or [`CipherError::Serialization`] if the
    /// file cannot be read, parsed or created.
    pub fn open(path: &Path) -> Result<Self, CipherError> {
        let log = if path.exists() {
            let contents = fs::read_to_string(path)?;
            Self {
                path: path.to_path_buf(),
                document: serde_json::from_str(&contents)?,
            }
        } else {
            let log = Self {
                path: path.to_path_buf(),
                document: LogDocument::default(),
            };
            log.save()?;
            log
        };
        debug!(
            "Opened message log '{}' with {} entries.",
            path.display(),
            log.document.messages.len()
        );
        Ok(log)
    }

    fn save(&self) -> Result<(), CipherError> {
        let contents = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }

    /// Appends a completed operation and returns the id assigned to it.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Io`] or [`CipherError::Serialization`] if the
    /// log cannot be written; the entry is not kept in that case.
    pub fn append(&mut self, record: OperationRecord) -> Result<Uuid, CipherError> {
        let id = Uuid::new_v4();
        let status = if record.plaintext.is_some() {
            MessageStatus::Decrypted
        } else {
            MessageStatus::Encrypted
        };
        self.document.messages.push(MessageEntry {
            id,
            sender: record.sender,
            receiver: record.receiver,
            cipher_kind: record.cipher_kind,
            ciphertext_sha256: ciphertext_digest(&record.ciphertext),
            ciphertext: record.ciphertext,
            plaintext: record.plaintext,
            key_used: record.key,
            created_at: unix_timestamp(),
            updated_at: None,
            status,
        });
        if let Err(e) = self.save() {
            self.document.messages.pop();
            return Err(e);
        }
        Ok(id)
    }

    /// All entries, oldest first.
    #[must_use]
    pub fn list_all(&self) -> &[MessageEntry] {
        &self.document.messages
    }

    /// Entries whose plaintext has not been recovered.
    #[must_use]
    pub fn list_encrypted_only(&self) -> Vec<&MessageEntry> {
        self.document
            .messages
            .iter()
            .filter(|m| m.status == MessageStatus::Encrypted)
            .collect()
    }

    /// Looks up an entry by id.
    #[must_use]
    pub fn get(&self, id: Uuid) -> Option<&MessageEntry> {
        self.document.messages.iter().find(|m| m.id == id)
    }

    /// Attaches recovered plaintext to an entry and marks it decrypted.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::NotFound`] for an unknown id, or
    /// [`CipherError::Io`]/[`CipherError::Serialization`] if the log cannot be
    /// written; the entry keeps its previous contents in that case.
    pub fn record_decryption(&mut self, id: Uuid, plaintext: NormalizedText) -> Result<(), CipherError> {
        let entry = self
            .document
            .messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| CipherError::NotFound(format!("message {id}")))?;
        let previous = entry.clone();
        entry.plaintext = Some(plaintext);
        entry.status = MessageStatus::Decrypted;
        entry.updated_at = Some(unix_timestamp());

        if let Err(e) = self.save() {
            if let Some(entry) = self.document.messages.iter_mut().find(|m| m.id == id) {
                *entry = previous;
            }
            return Err(e);
        }
        Ok(())
    }
}
