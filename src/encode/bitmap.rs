//! Packed binary bitmaps.
//!
//! Both layouts are row-major with channels in R, G, B order:
//!
//! - raw: one byte per channel, `width * height * 3` bytes
//! - normalized: the big-endian IEEE-754 bits of `f32(channel / 255.0)`, four bytes per
//!   channel, `width * height * 12` bytes

use crate::codec::{DecodedImage, unpack_rgb};
use crate::encode::literal::normalized;

pub const CHANNELS: usize = 3;
pub const FLOAT_BYTES: usize = 4;

#[must_use]
pub fn encode_raw(image: &DecodedImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.pixels().len() * CHANNELS);
    for &pixel in image.pixels() {
        out.extend_from_slice(&unpack_rgb(pixel));
    }
    out
}

/// Channels are unsigned bytes, so every value is already in `[0, 256)` before division.
#[must_use]
pub fn encode_normalized(image: &DecodedImage) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.pixels().len() * CHANNELS * FLOAT_BYTES);
    for &pixel in image.pixels() {
        for channel in unpack_rgb(pixel) {
            out.extend_from_slice(&normalized(channel).to_be_bytes());
        }
    }
    out
}
