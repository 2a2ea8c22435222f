// File:    lib.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: The main library crate for ciphersafe-core, tying together the ciphers, key management, and steganography.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! # CipherSafe Core Library
//!
//! This library provides the core functionality for CipherSafe: a Vigenère
//! substitution cipher, a one-time-pad cipher whose keys are tracked by a
//! single-use registry, and LSB steganography for hiding ciphertext in images.
//!
//! ```
//! use ciphersafe_core::cipher::Cipher;
//! use ciphersafe_core::vigenere::SubstitutionCipher;
//!
//! let cipher = SubstitutionCipher::new();
//! let ciphertext = cipher.encrypt("attack at dawn", "LEMON").unwrap();
//! assert_eq!(ciphertext.as_str(), "LXFOPVEFRNHR");
//! ```

/// The symbol alphabet and text normalization.
pub mod alphabet;
/// The shared cipher contract.
pub mod cipher;
/// The error type returned by every fallible operation.
pub mod error;
/// Secure random key material.
pub mod key_generator;
/// Persistent log of encrypted and decrypted messages.
pub mod message_log;
/// Single-use bookkeeping for one-time-pad keys.
pub mod otp_registry;
/// LSB image steganography.
pub mod stego;
/// Manages the state of the vault directory.
pub mod vault;
/// The one-time-pad cipher.
pub mod vernam;
/// The Vigenère cipher.
pub mod vigenere;

pub use error::CipherError;
