//! Image decoding: bytes in, packed RGB pixel buffer out.

use anyhow::{Context, Result, bail, ensure};

/// A decoded image: `width * height` pixels, row-major, each packed as `0x00RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

impl DecodedImage {
    /// # Errors
    ///
    /// Returns an error if `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Result<Self> {
        ensure!(
            pixels.len() == width as usize * height as usize,
            "{} pixels do not fill a {width}x{height} image",
            pixels.len()
        );
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Builds an image from interleaved `r,g,b` bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if `rgb.len() != width * height * 3`.
    pub fn from_rgb_bytes(width: u32, height: u32, rgb: &[u8]) -> Result<Self> {
        ensure!(
            rgb.len() == width as usize * height as usize * 3,
            "{} bytes do not fill a {width}x{height} RGB image",
            rgb.len()
        );
        let pixels = rgb
            .chunks_exact(3)
            .map(|c| pack_rgb(c[0], c[1], c[2]))
            .collect();
        Self::new(width, height, pixels)
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Channels of the pixel at `(x, y)`, or `None` outside the image.
    #[must_use]
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).copied().map(unpack_rgb)
    }
}

#[inline]
#[must_use]
pub const fn pack_rgb(r: u8, g: u8, b: u8) -> u32 {
    ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[inline]
#[must_use]
pub const fn unpack_rgb(pixel: u32) -> [u8; 3] {
    [(pixel >> 16) as u8, (pixel >> 8) as u8, pixel as u8]
}

/// Turns a file's bytes into a [`DecodedImage`].
///
/// Implementations are shared by every fetch worker of an engine.
pub trait ImageDecoder: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the bytes are empty or not a supported image.
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;
}

/// Decodes PNG, JPEG, BMP and GIF through the `image` crate, dropping any alpha channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDecoder;

impl ImageDecoder for StandardDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        if bytes.is_empty() {
            bail!("empty image stream");
        }
        let format = image::guess_format(bytes).context("unrecognized image format")?;
        let rgb = image::load_from_memory_with_format(bytes, format)
            .with_context(|| format!("decode {format:?} image"))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        DecodedImage::from_rgb_bytes(width, height, rgb.as_raw())
    }
}
