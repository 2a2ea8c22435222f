// File:    cipher.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: The common encrypt/decrypt contract implemented by every CipherSafe cipher.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! The cipher contract.

use crate::alphabet::{self, NormalizedText};
use crate::error::CipherError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies which cipher produced a ciphertext.
///
/// Ciphertext carries no metadata of its own, so this travels with it in the message log.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CipherKind {
    /// Polyalphabetic substitution with a repeating keyword.
    Vigenere,
    /// One-time pad with a single-use random key.
    Vernam,
}

impl fmt::Display for CipherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vigenere => f.write_str("Vigenère"),
            Self::Vernam => f.write_str("Vernam OTP"),
        }
    }
}

/// A stateless text transform over the 26-letter alphabet.
pub trait Cipher {
    /// The kind recorded alongside this cipher's output.
    fn kind(&self) -> CipherKind;

    /// Encrypts `plaintext` under `key`, both normalized first.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the text or key fails validation.
    fn encrypt(&self, plaintext: &str, key: &str) -> Result<NormalizedText, CipherError>;

    /// Decrypts `ciphertext` under `key`, both normalized first.
    ///
    /// # Errors
    ///
    /// Returns a [`CipherError`] if the text or key fails validation.
    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<NormalizedText, CipherError>;
}

/// Direction of a per-symbol transform.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Direction {
    Encrypt,
    Decrypt,
}

/// Applies the modular shift position by position. `keystream` must be at least as long as `text`.
pub(crate) fn transform(
    text: &NormalizedText,
    keystream: impl Iterator<Item = u8>,
    direction: Direction,
) -> NormalizedText {
    let symbols = text
        .offsets()
        .zip(keystream)
        .map(|(t, k)| match direction {
            Direction::Encrypt => alphabet::shift_forward(t, k),
            Direction::Decrypt => alphabet::shift_backward(t, k),
        })
        .map(alphabet::symbol)
        .collect();
    NormalizedText::from_symbols(symbols)
}

/// Normalizes `raw`, rejecting input that leaves no symbols.
pub(crate) fn require_symbols(raw: &str, what: &str) -> Result<NormalizedText, CipherError> {
    let text = NormalizedText::new(raw);
    if text.is_empty() {
        return Err(CipherError::Validation(format!(
            "{what} must contain at least one letter"
        )));
    }
    Ok(text)
}
