// File:    key_generator.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Provides functionality for generating uniformly random alphabet keys from a cryptographically secure source.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

use crate::alphabet::{self, ALPHABET_LEN, NormalizedText};
use crate::error::CipherError;
use rand::{TryCryptoRng, rngs::OsRng};

/// Largest multiple of 26 that fits in a byte. Bytes at or above it are
/// discarded so every letter is equally likely.
const REJECTION_BOUND: u8 = ALPHABET_LEN * 9;

/// Number of random bytes requested from the source per refill.
const CHUNK_SIZE: usize = 64;

/// Default length of a generated Vigenère keyword.
pub const DEFAULT_KEYWORD_LENGTH: usize = 6;

/// Draws random symbols from the alphabet.
///
/// The randomness source is a type parameter so tests can substitute a
/// deterministic one; production code uses the operating system's CSPRNG.
#[derive(Debug, Default)]
pub struct KeyMaterialGenerator<R = OsRng> {
    rng: R,
}

impl KeyMaterialGenerator<OsRng> {
    /// Creates a generator backed by the operating system's secure random source.
    #[must_use]
    pub const fn new() -> Self {
        Self { rng: OsRng }
    }
}

impl<R: TryCryptoRng> KeyMaterialGenerator<R> {
    /// Creates a generator over an explicit secure random source.
    #[must_use]
    pub const fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Generates exactly `length` uniformly random symbols.
    ///
    /// A `length` of zero yields an empty value.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Entropy`] if the random source fails.
    pub fn generate(&mut self, length: usize) -> Result<NormalizedText, CipherError> {
        let mut symbols = String::with_capacity(length);
        let mut buffer = [0u8; CHUNK_SIZE];
        while symbols.len() < length {
            // Use the failable `try_fill_bytes` and surface the error to the caller.
            self.rng
                .try_fill_bytes(&mut buffer)
                .map_err(|e| CipherError::Entropy(e.to_string()))?;
            for &byte in buffer.iter().filter(|&&b| b < REJECTION_BOUND) {
                if symbols.len() == length {
                    break;
                }
                symbols.push(alphabet::symbol(byte % ALPHABET_LEN));
            }
        }
        Ok(NormalizedText::from_symbols(symbols))
    }

    /// Generates a random keyword for the substitution cipher.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Validation`] for a zero length, or
    /// [`CipherError::Entropy`] if the random source fails.
    pub fn generate_keyword(&mut self, length: usize) -> Result<NormalizedText, CipherError> {
        if length == 0 {
            return Err(CipherError::Validation(
                "keyword length must be at least 1".to_string(),
            ));
        }
        self.generate(length)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::RngCore;

    /// Emits a fixed byte sequence, repeating it forever.
    struct ScriptedRng {
        bytes: Vec<u8>,
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
                *byte = self.bytes[self.position % self.bytes.len()];
                self.position += 1;
            }
        }
    }

    impl rand::CryptoRng for ScriptedRng {}

    #[test]
    fn rejects_bytes_outside_the_uniform_range() {
        // 234..=255 are rejected; 0 -> A, 27 -> B, 233 -> Z.
        let rng = ScriptedRng {
            bytes: vec![250, 0, 234, 27, 255, 233],
            position: 0,
        };
        let mut generator = KeyMaterialGenerator::with_rng(rng);
        assert_eq!(generator.generate(3).unwrap().as_str(), "ABZ");
    }

    #[test]
    fn zero_length_is_empty() {
        let mut generator = KeyMaterialGenerator::new();
        assert!(generator.generate(0).unwrap().is_empty());
    }

    #[test]
    fn zero_length_keyword_is_rejected() {
        let mut generator = KeyMaterialGenerator::new();
        assert!(matches!(
            generator.generate_keyword(0),
            Err(CipherError::Validation(_))
        ));
    }
}
