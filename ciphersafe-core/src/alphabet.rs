// File:    alphabet.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: The 26-letter symbol alphabet, text normalization, and the modular shift arithmetic shared by both ciphers.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Symbol alphabet and normalized text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The fixed cipher alphabet.
pub const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Number of symbols in [`ALPHABET`].
pub const ALPHABET_LEN: u8 = 26;

/// Text reduced to the cipher alphabet: letters upper-cased, everything else dropped.
///
/// Normalization is idempotent, so re-normalizing a `NormalizedText` is a no-op.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NormalizedText(String);

impl NormalizedText {
    /// Normalizes raw input to the alphabet.
    ///
    /// ```
    /// use ciphersafe_core::alphabet::NormalizedText;
    ///
    /// assert_eq!(NormalizedText::new("Meet at 9, HQ!").as_str(), "MEETATHQ");
    /// ```
    #[must_use]
    pub fn new(raw: &str) -> Self {
        Self(
            raw.chars()
                .filter(char::is_ascii_alphabetic)
                .map(|c| c.to_ascii_uppercase())
                .collect(),
        )
    }

    /// Wraps a string already known to contain only `A`-`Z`.
    pub(crate) fn from_symbols(symbols: String) -> Self {
        debug_assert!(symbols.bytes().all(|b| b.is_ascii_uppercase()));
        Self(symbols)
    }

    /// Returns the normalized symbols.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether normalization left no symbols.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Zero-based alphabet offsets of each symbol.
    pub fn offsets(&self) -> impl Iterator<Item = u8> + Clone + '_ {
        self.0.bytes().map(|b| b - b'A')
    }

    /// Consumes the value, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for NormalizedText {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl AsRef<str> for NormalizedText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Maps a zero-based offset back to its alphabet symbol.
pub(crate) fn symbol(offset: u8) -> char {
    char::from(ALPHABET[usize::from(offset % ALPHABET_LEN)])
}

/// `(p + k) mod 26`
pub(crate) const fn shift_forward(plain: u8, key: u8) -> u8 {
    (plain + key) % ALPHABET_LEN
}

/// `(c - k + 26) mod 26`
pub(crate) const fn shift_backward(cipher: u8, key: u8) -> u8 {
    (cipher + ALPHABET_LEN - key) % ALPHABET_LEN
}
