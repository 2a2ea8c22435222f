// File:    stego.rs
// Author:  apezoo
// Date:    2026-10-14
//
// Description: Least-significant-bit steganography: hides text in the low color bits of a raster image and recovers it.
//
// License:
// This project is licensed under the terms of the GNU AGPLv3 license.
// See the LICENSE.md file in the project root for full license information.

//! LSB image steganography.
//!
//! The payload is the secret's bytes followed by the terminator [`TERMINATOR`],
//! written most-significant bit first into the lowest bit of the red, green and
//! blue channels, pixel by pixel in raster order. Alpha is never touched.
//!
//! The carrier must be stored through a lossless format such as PNG. Lossy
//! recompression silently destroys the embedded bits; the only symptom is a
//! missing terminator or garbled text on decode.

use crate::error::CipherError;
use image::{DynamicImage, GenericImageView, ImageFormat};
use log::{debug, info, warn};
use std::path::Path;

/// In-band end-of-payload marker appended to every embedded secret.
pub const TERMINATOR: &str = "#####";

/// Color channels carrying payload bits in each pixel (R, G, B).
const COLOR_CHANNELS: usize = 3;

const BITS_PER_CHAR: usize = 8;

/// Bit width of the encoded terminator.
const TERMINATOR_BITS: usize = TERMINATOR.len() * BITS_PER_CHAR;

/// Watches a bitstream for the encoded terminator.
#[derive(Debug, Default)]
struct TerminatorScanner {
    window: u64,
    seen: usize,
}

impl TerminatorScanner {
    const PATTERN: u64 = terminator_pattern();
    const MASK: u64 = (1 << TERMINATOR_BITS) - 1;

    /// Feeds one bit; returns `true` when the last 40 bits spell the terminator.
    fn push(&mut self, bit: u8) -> bool {
        self.window = ((self.window << 1) | u64::from(bit)) & Self::MASK;
        self.seen += 1;
        self.seen >= TERMINATOR_BITS && self.window == Self::PATTERN
    }

    /// Bits that came before the terminator just matched.
    const fn payload_bits(&self) -> usize {
        self.seen - TERMINATOR_BITS
    }
}

const fn terminator_pattern() -> u64 {
    let bytes = TERMINATOR.as_bytes();
    let mut pattern = 0u64;
    let mut i = 0;
    while i < bytes.len() {
        pattern = (pattern << BITS_PER_CHAR) | bytes[i] as u64;
        i += 1;
    }
    pattern
}

/// Yields the bits of `bytes`, most significant first.
fn bits_of(bytes: &[u8]) -> impl Iterator<Item = u8> + '_ {
    bytes
        .iter()
        .flat_map(|&byte| (0..BITS_PER_CHAR).rev().map(move |i| (byte >> i) & 1))
}

/// Number of characters, terminator included, that fit in a `width` x `height` carrier.
#[must_use]
pub fn capacity_for(width: u32, height: u32) -> usize {
    let bits = u64::from(width) * u64::from(height) * COLOR_CHANNELS as u64;
    usize::try_from(bits / BITS_PER_CHAR as u64).unwrap_or(usize::MAX)
}

/// Interleaved 8-bit samples and the channel count per pixel.
fn samples(image: &DynamicImage) -> Result<(&[u8], usize), CipherError> {
    match image {
        DynamicImage::ImageRgb8(buffer) => Ok((buffer.as_raw().as_slice(), 3)),
        DynamicImage::ImageRgba8(buffer) => Ok((buffer.as_raw().as_slice(), 4)),
        other => Err(unsupported(other)),
    }
}

fn samples_mut(image: &mut DynamicImage) -> Result<(&mut [u8], usize), CipherError> {
    match image {
        DynamicImage::ImageRgb8(buffer) => Ok((&mut **buffer, 3)),
        DynamicImage::ImageRgba8(buffer) => Ok((&mut **buffer, 4)),
        other => Err(unsupported(other)),
    }
}

fn unsupported(image: &DynamicImage) -> CipherError {
    CipherError::Format(format!(
        "expected 8-bit RGB or RGBA pixels, found {:?}",
        image.color()
    ))
}

/// Hides and recovers text in the least-significant color bits of an image.
#[derive(Debug, Clone, Copy, Default)]
pub struct SteganographyCodec;

impl SteganographyCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Maximum characters (terminator included) `image` can carry:
    /// `floor(width * height * 3 / 8)`.
    #[must_use]
    pub fn capacity(&self, image: &DynamicImage) -> usize {
        let (width, height) = image.dimensions();
        capacity_for(width, height)
    }

    /// Returns a copy of `carrier` with `secret` and the terminator embedded.
    ///
    /// Each byte of `secret` occupies one character slot. The carrier itself is
    /// never modified; on any error no image is produced.
    ///
    /// # Errors
    ///
    /// - [`CipherError::Format`] if the carrier is not 8-bit RGB or RGBA.
    /// - [`CipherError::Capacity`] if the payload does not fit.
    /// - [`CipherError::Validation`] if the secret would be cut short by the
    ///   terminator on decode (for example, it contains `#####`).
    pub fn encode(&self, carrier: &DynamicImage, secret: &str) -> Result<DynamicImage, CipherError> {
        samples(carrier)?;

        let mut payload = Vec::with_capacity(secret.len() + TERMINATOR.len());
        payload.extend_from_slice(secret.as_bytes());
        payload.extend_from_slice(TERMINATOR.as_bytes());

        let capacity = self.capacity(carrier);
        if payload.len() > capacity {
            return Err(CipherError::Capacity {
                needed: payload.len(),
                capacity,
            });
        }

        let total_bits = payload.len() * BITS_PER_CHAR;
        let mut scanner = TerminatorScanner::default();
        if let Some(early) = bits_of(&payload).position(|bit| scanner.push(bit)) {
            if early + 1 < total_bits {
                return Err(CipherError::Validation(
                    "secret text runs into the steganography terminator".to_string(),
                ));
            }
        }

        let mut stego = carrier.clone();
        let (samples, channels) = samples_mut(&mut stego)?;
        let mut bits = bits_of(&payload);
        let mut written = 0;
        'pixels: for pixel in samples.chunks_exact_mut(channels) {
            for sample in pixel.iter_mut().take(COLOR_CHANNELS) {
                let Some(bit) = bits.next() else {
                    break 'pixels;
                };
                *sample = (*sample & !1) | bit;
                written += 1;
            }
        }

        if written < total_bits {
            return Err(CipherError::Capacity {
                needed: payload.len(),
                capacity,
            });
        }
        info!(
            "Embedded {} characters into {}x{} carrier ({written} bits).",
            secret.len(),
            stego.width(),
            stego.height()
        );
        Ok(stego)
    }

    /// Recovers the text hidden in `image`.
    ///
    /// Scanning stops at the first terminator. Returns `Ok(None)` when the image
    /// holds no terminator at all.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::Format`] if the image is not 8-bit RGB or RGBA.
    pub fn decode(&self, image: &DynamicImage) -> Result<Option<String>, CipherError> {
        let (samples, channels) = samples(image)?;
        let mut scanner = TerminatorScanner::default();
        let mut bytes = Vec::new();
        let mut current = 0u8;

        for pixel in samples.chunks_exact(channels) {
            for &sample in pixel.iter().take(COLOR_CHANNELS) {
                let bit = sample & 1;
                current = (current << 1) | bit;
                let matched = scanner.push(bit);
                if scanner.seen % BITS_PER_CHAR == 0 {
                    bytes.push(current);
                    current = 0;
                }
                if matched {
                    // Whole bytes only; a misaligned match leaves a partial byte behind.
                    bytes.truncate(scanner.payload_bits() / BITS_PER_CHAR);
                    debug!("Terminator found after {} bits.", scanner.seen);
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()));
                }
            }
        }

        warn!("No hidden message found in {}x{} image.", image.width(), image.height());
        Ok(None)
    }
}

/// Loads a carrier image from disk.
///
/// # Errors
///
/// Returns [`CipherError::Io`] if the file cannot be read, or
/// [`CipherError::Format`] if it cannot be decoded.
pub fn open_carrier(path: &Path) -> Result<DynamicImage, CipherError> {
    let image = image::open(path)?;
    debug!(
        "Loaded carrier '{}' ({}x{}, {:?}).",
        path.display(),
        image.width(),
        image.height(),
        image.color()
    );
    Ok(image)
}

/// Saves a stego image as PNG, whatever the file extension says.
///
/// # Errors
///
/// Returns [`CipherError::Io`] or [`CipherError::Format`] if encoding fails.
pub fn save_stego(image: &DynamicImage, path: &Path) -> Result<(), CipherError> {
    let is_png = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !is_png {
        warn!(
            "Writing PNG data to '{}'; re-saving it in a lossy format will destroy the hidden message.",
            path.display()
        );
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}
