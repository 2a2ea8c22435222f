// File:    vigenere.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Vigenère polyalphabetic substitution with a cyclically repeated keyword.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Vigenère cipher for routine traffic.
//!
//! The keyword is reusable and the cipher falls to frequency analysis; it is
//! not meant to resist a determined attacker.

use crate::alphabet::NormalizedText;
use crate::cipher::{self, Cipher, CipherKind, Direction};
use crate::error::CipherError;

/// Polyalphabetic substitution cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstitutionCipher;

impl SubstitutionCipher {
    /// Creates the cipher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply(text: &str, keyword: &str, direction: Direction) -> Result<NormalizedText, CipherError> {
        let keyword = cipher::require_symbols(keyword, "keyword")?;
        let text = cipher::require_symbols(text, "text")?;
        // One keyword position per symbol; normalization already removed the gaps.
        let keystream = keyword.offsets().cycle();
        Ok(cipher::transform(&text, keystream, direction))
    }
}

impl Cipher for SubstitutionCipher {
    fn kind(&self) -> CipherKind {
        CipherKind::Vigenere
    }

    fn encrypt(&self, plaintext: &str, keyword: &str) -> Result<NormalizedText, CipherError> {
        Self::apply(plaintext, keyword, Direction::Encrypt)
    }

    fn decrypt(&self, ciphertext: &str, keyword: &str) -> Result<NormalizedText, CipherError> {
        Self::apply(ciphertext, keyword, Direction::Decrypt)
    }
}
