// File:    vernam.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Handles the one-time-pad (Vernam) transform over the 26-letter alphabet.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! This module contains the one-time-pad cipher.
//!
//! The cipher is pure: it neither issues nor retires keys. Callers obtain keys
//! through [`crate::otp_registry::OtpKeyRegistry`] and mark them used once the
//! transform completes.

use crate::alphabet::NormalizedText;
use crate::cipher::{self, Cipher, CipherKind, Direction};
use crate::error::CipherError;
use crate::key_generator::KeyMaterialGenerator;
use rand::TryCryptoRng;

/// Vernam one-time-pad cipher.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneTimePadCipher;

impl OneTimePadCipher {
    /// Creates the cipher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Encrypts `plaintext`, generating a key of exactly its length when none is given.
    ///
    /// Returns the ciphertext together with the key that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Validation`] for empty text or a key with no letters,
    /// [`CipherError::KeyLength`] for a short key, or
    /// [`CipherError::Entropy`] if key generation fails.
    pub fn encrypt_or_generate<R: TryCryptoRng>(
        &self,
        plaintext: &str,
        key: Option<&str>,
        generator: &mut KeyMaterialGenerator<R>,
    ) -> Result<(NormalizedText, NormalizedText), CipherError> {
        let text = cipher::require_symbols(plaintext, "plaintext")?;
        let key = match key {
            Some(raw) => NormalizedText::new(raw),
            None => generator.generate(text.len())?,
        };
        let ciphertext = Self::apply(&text, &key, Direction::Encrypt)?;
        Ok((ciphertext, key))
    }

    /// Key material past the text length is accepted and ignored.
    fn apply(
        text: &NormalizedText,
        key: &NormalizedText,
        direction: Direction,
    ) -> Result<NormalizedText, CipherError> {
        if key.is_empty() {
            return Err(CipherError::Validation(
                "key must contain at least one letter".to_string(),
            ));
        }
        if key.len() < text.len() {
            return Err(CipherError::KeyLength {
                key: key.len(),
                text: text.len(),
            });
        }
        Ok(cipher::transform(text, key.offsets(), direction))
    }
}

impl Cipher for OneTimePadCipher {
    fn kind(&self) -> CipherKind {
        CipherKind::Vernam
    }

    fn encrypt(&self, plaintext: &str, key: &str) -> Result<NormalizedText, CipherError> {
        let text = cipher::require_symbols(plaintext, "plaintext")?;
        Self::apply(&text, &NormalizedText::new(key), Direction::Encrypt)
    }

    fn decrypt(&self, ciphertext: &str, key: &str) -> Result<NormalizedText, CipherError> {
        let text = cipher::require_symbols(ciphertext, "ciphertext")?;
        Self::apply(&text, &NormalizedText::new(key), Direction::Decrypt)
    }
}
