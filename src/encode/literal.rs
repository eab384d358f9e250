//! Nested numeric array literals for images.
//!
//! An image body is one `{...}` group per image row, each holding one `{r,g,b}` group
//! per pixel:
//!
//! ```text
//! {{r,g,b},{r,g,b},...},{{r,g,b},...},...
//! ```
//!
//! The caller wraps the body in the braces of the enclosing array.

use crate::codec::{DecodedImage, unpack_rgb};

const INTENSITIES: usize = 256;

/// Precomputed channel fragments for all 256 intensities.
///
/// Red fragments open the pixel group (`{v`), green sits in the middle (`,v,`) and blue
/// closes it (`v}`), so a pixel is three table lookups.
#[derive(Debug, Clone)]
pub struct LiteralTable {
    normalize: bool,
    red: Vec<String>,
    green: Vec<String>,
    blue: Vec<String>,
}

impl LiteralTable {
    /// Builds the table for raw `0..=255` integers, or for `v / 255.0` floats when
    /// `normalize` is set.
    #[must_use]
    pub fn new(normalize: bool) -> Self {
        let mut red = Vec::with_capacity(INTENSITIES);
        let mut green = Vec::with_capacity(INTENSITIES);
        let mut blue = Vec::with_capacity(INTENSITIES);
        for i in 0..INTENSITIES {
            let value = if normalize {
                format!("{:?}", normalized(i as u8))
            } else {
                i.to_string()
            };
            red.push(format!("{{{value}"));
            green.push(format!(",{value},"));
            blue.push(format!("{value}}}"));
        }
        Self {
            normalize,
            red,
            green,
            blue,
        }
    }

    #[must_use]
    pub const fn is_normalized(&self) -> bool {
        self.normalize
    }

    /// Longest rendering of one pixel group, separator included.
    fn max_pixel_len(&self) -> usize {
        let longest = |v: &[String]| v.iter().map(String::len).max().unwrap_or(0);
        longest(&self.red) + longest(&self.green) + longest(&self.blue) + 1
    }

    /// Renders an image body.
    #[must_use]
    pub fn encode(&self, image: &DecodedImage) -> String {
        let width = image.width().max(1) as usize;
        let height = image.height() as usize;
        let mut out = String::with_capacity(image.pixels().len() * self.max_pixel_len() + height * 3);
        for (y, row) in image.pixels().chunks(width).enumerate() {
            if y > 0 {
                out.push(',');
            }
            out.push('{');
            for (x, &pixel) in row.iter().enumerate() {
                if x > 0 {
                    out.push(',');
                }
                let [r, g, b] = unpack_rgb(pixel);
                out.push_str(&self.red[r as usize]);
                out.push_str(&self.green[g as usize]);
                out.push_str(&self.blue[b as usize]);
            }
            out.push('}');
        }
        out
    }
}

/// `channel / 255.0` narrowed to single precision.
#[inline]
#[must_use]
pub fn normalized(channel: u8) -> f32 {
    (f64::from(channel) / 255.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_fragments() {
        let table = LiteralTable::new(false);
        assert_eq!(table.red[7], "{7");
        assert_eq!(table.green[128], ",128,");
        assert_eq!(table.blue[255], "255}");
    }

    #[test]
    fn test_normalized_fragments() {
        let table = LiteralTable::new(true);
        assert_eq!(table.red[0], "{0.0");
        assert_eq!(table.blue[255], "1.0}");
        assert_eq!(table.green[1], ",0.003921569,");
    }

    #[test]
    fn test_two_rows() {
        let image = DecodedImage::from_rgb_bytes(1, 2, &[1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(LiteralTable::new(false).encode(&image), "{{1,2,3}},{{4,5,6}}");
    }
}
