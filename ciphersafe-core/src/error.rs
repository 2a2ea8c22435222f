// File:    error.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: The error type shared by every CipherSafe core operation.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! Error types for the core library.
//!
//! Every fallible operation returns [`CipherError`]. Failures are raised at
//! the point of violation and never leave caller-visible state half-updated.

use thiserror::Error;

/// Errors that can occur during cipher, registry, codec and vault operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    /// Input text or key was empty or contained no alphabet symbols.
    #[error("validation error: {0}")]
    Validation(String),

    /// A one-time-pad key was shorter than the text it should transform.
    #[error("OTP key must be at least as long as the text (key {key}, text {text})")]
    KeyLength {
        /// Normalized key length.
        key: usize,
        /// Normalized text length.
        text: usize,
    },

    /// A one-time-pad key has already been used and was offered again.
    #[error("OTP key has already been used and cannot transform another message")]
    KeyReuse,

    /// The steganographic payload does not fit in the carrier image.
    #[error("payload too large: carrier holds {capacity} characters but {needed} are needed")]
    Capacity {
        /// Characters required, terminator included.
        needed: usize,
        /// Characters the carrier can hold.
        capacity: usize,
    },

    /// The carrier could not be interpreted as an 8-bit RGB(A) pixel grid.
    #[error("unsupported carrier image: {0}")]
    Format(String),

    /// The secure randomness source failed to produce bytes.
    #[error("entropy source failure: {0}")]
    Entropy(String),

    /// A requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Underlying filesystem error.
    #[error("I/O error: {0}")]
    Io(String),

    /// Vault or message log JSON could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<std::io::Error> for CipherError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CipherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<image::ImageError> for CipherError {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Self::Io(e.to_string()),
            other => Self::Format(other.to_string()),
        }
    }
}
