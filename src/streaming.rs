//! Streaming image field: the writer-facing side of the encode engine.
//!
//! A [`StreamingField`] is pulled one image at a time, either through
//! [`StreamingField::next_image`] / the [`Iterator`] impl, or drained straight into a
//! writer with [`StreamingField::write_to`]. Images are never all materialized at once.

use crate::encode::{EncodeEngine, EncodedImage};
use crate::error::Result;
use crate::fields::DataType;
use std::io::Write;

/// How drained images are framed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamingKind {
    /// Image bytes are concatenated as they are.
    Binary,
    /// The single image body is wrapped as `{<image>}`.
    ScalarArray,
    /// Every image body is wrapped, then the whole list: `{{<image>},{<image>}}`.
    ArrayOfArrays,
}

pub struct StreamingField {
    kind: StreamingKind,
    data_type: DataType,
    engine: EncodeEngine,
}

impl StreamingField {
    /// Wraps `engine`, framing images for a column of type `image_type`.
    #[must_use]
    pub fn new(engine: EncodeEngine, image_type: DataType) -> Self {
        let shape = engine.shape();
        let (kind, data_type) = if shape.pixels_as_bytes {
            (StreamingKind::Binary, DataType::Bytea)
        } else if shape.scalar_mode {
            (StreamingKind::ScalarArray, image_type)
        } else {
            (StreamingKind::ArrayOfArrays, image_type)
        };
        Self {
            kind,
            data_type,
            engine,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> StreamingKind {
        self.kind
    }

    #[must_use]
    pub const fn data_type(&self) -> DataType {
        self.data_type
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.engine.has_next()
    }

    /// Total number of images in the field, including those already pulled.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.engine.total()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.engine.total() == 0
    }

    /// # Errors
    ///
    /// See [`EncodeEngine::next_image`].
    pub fn next_image(&mut self) -> Result<EncodedImage> {
        self.engine.next_image()
    }

    #[must_use]
    pub const fn engine(&self) -> &EncodeEngine {
        &self.engine
    }

    /// Drains every remaining image into `out`, returning the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns the first engine error, or [`crate::IngestError::Io`] if writing fails.
    pub fn write_to<W: Write>(&mut self, out: &mut W) -> Result<u64> {
        let mut written = 0u64;
        let mut emit = |out: &mut W, bytes: &[u8]| -> Result<()> {
            out.write_all(bytes)?;
            written += bytes.len() as u64;
            Ok(())
        };

        if self.kind == StreamingKind::ArrayOfArrays {
            emit(out, b"{")?;
        }
        let mut first = true;
        while self.has_next() {
            let image = self.engine.next_image()?;
            match self.kind {
                StreamingKind::Binary => emit(out, image.as_bytes())?,
                StreamingKind::ScalarArray | StreamingKind::ArrayOfArrays => {
                    if !first {
                        emit(out, b",")?;
                    }
                    emit(out, b"{")?;
                    emit(out, image.as_bytes())?;
                    emit(out, b"}")?;
                }
            }
            first = false;
        }
        if self.kind == StreamingKind::ArrayOfArrays {
            emit(out, b"}")?;
        }
        out.flush()?;
        Ok(written)
    }
}

impl Iterator for StreamingField {
    type Item = Result<EncodedImage>;

    /// Yields `None` after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        self.has_next().then(|| self.engine.next_image())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.engine.remaining();
        (left, Some(left))
    }
}

impl std::fmt::Debug for StreamingField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingField")
            .field("kind", &self.kind)
            .field("data_type", &self.data_type)
            .field("engine", &self.engine)
            .finish()
    }
}
