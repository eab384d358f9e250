//! Assertions over produced rows and encoded images.
//!
//! All of these panic with a descriptive message on mismatch, like `assert_eq!`.

use crate::descriptor::FragmentRequest;
use crate::encode::bitmap::{CHANNELS, FLOAT_BYTES};
use crate::encode::metadata::decode_one_hot;
use crate::fields::{FieldValue, RowMetadata};
use std::fmt::Debug;

/// Assert that `vector` is one-hot with its single non-zero entry at `expected`.
///
/// # Panics
///
/// Panics if no entry, or more than one, is non-zero, or the hot entry is elsewhere.
///
/// # Example
///
/// ```
/// use ironpix::testing::assert_one_hot;
///
/// assert_one_hot(&[0u8, 0, 1, 0], 2);
/// ```
pub fn assert_one_hot<T: Copy + Default + PartialEq + Debug>(vector: &[T], expected: usize) {
    assert_eq!(
        decode_one_hot(vector),
        Some(expected),
        "Not a one-hot vector for index {expected}: {vector:?}"
    );
}

/// Split binary labels into one vector per image.
///
/// # Panics
///
/// Panics if `bytes` is not a whole number of `label_count`-sized vectors.
#[must_use]
pub fn split_label_bytes(bytes: &[u8], label_count: usize) -> Vec<Vec<u8>> {
    assert!(
        label_count > 0 && bytes.len() % label_count == 0,
        "{} label bytes do not split into vectors of {label_count}",
        bytes.len()
    );
    bytes.chunks(label_count).map(<[u8]>::to_vec).collect()
}

/// Decode a normalized float bitmap into its channel values.
///
/// # Panics
///
/// Panics if the length is not a multiple of four.
#[must_use]
pub fn decode_float_bitmap(bytes: &[u8]) -> Vec<f32> {
    assert_eq!(
        bytes.len() % FLOAT_BYTES,
        0,
        "float bitmap length {} is not a multiple of {FLOAT_BYTES}",
        bytes.len()
    );
    bytes
        .chunks_exact(FLOAT_BYTES)
        .map(|b| f32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Assert the raw bitmap pixel at `(x, y)` of a `width`-wide image.
///
/// # Panics
///
/// Panics if the pixel is out of range or differs.
pub fn assert_raw_pixel(bytes: &[u8], width: u32, x: u32, y: u32, expected: [u8; 3]) {
    let offset = CHANNELS * (y as usize * width as usize + x as usize);
    assert!(
        offset + CHANNELS <= bytes.len(),
        "pixel ({x}, {y}) is outside a {}-byte bitmap",
        bytes.len()
    );
    assert_eq!(
        &bytes[offset..offset + CHANNELS],
        &expected,
        "Raw pixel mismatch at ({x}, {y})"
    );
}

/// Assert the normalized bitmap pixel at `(x, y)` equals `expected / 255` per channel.
///
/// # Panics
///
/// Panics if the pixel is out of range or a channel differs by more than `f32::EPSILON`.
pub fn assert_normalized_pixel(bytes: &[u8], width: u32, x: u32, y: u32, expected: [u8; 3]) {
    let floats = decode_float_bitmap(bytes);
    let offset = CHANNELS * (y as usize * width as usize + x as usize);
    assert!(
        offset + CHANNELS <= floats.len(),
        "pixel ({x}, {y}) is outside a {}-channel bitmap",
        floats.len()
    );
    for (channel, (&actual, &raw)) in floats[offset..offset + CHANNELS]
        .iter()
        .zip(&expected)
        .enumerate()
    {
        let want = f32::from(raw) / 255.0;
        assert!(
            (actual - want).abs() <= f32::EPSILON,
            "Normalized channel {channel} at ({x}, {y}): expected {want}, got {actual}"
        );
    }
}

/// Assert that every metadata column of an array row lines up with `request`.
///
/// Position `i` of paths, names, directories and labels must all come from descriptor `i`.
/// Binary labels are split by the request's label count.
///
/// # Panics
///
/// Panics on the first misaligned position, or if the row is not an array row.
pub fn assert_row_aligned(metadata: &RowMetadata, request: &FragmentRequest) {
    let (
        FieldValue::TextArray(paths),
        FieldValue::TextArray(names),
        FieldValue::TextArray(dirs),
    ) = (
        &metadata.full_paths,
        &metadata.file_names,
        &metadata.parent_dirs,
    )
    else {
        panic!("Expected text array metadata columns, got {metadata:?}");
    };
    let labels: Vec<Vec<i64>> = match &metadata.labels {
        FieldValue::IntMatrix(rows) => rows.clone(),
        FieldValue::Bytes(bytes) => {
            split_label_bytes(bytes, request.label_count().unwrap_or_default())
                .into_iter()
                .map(|v| v.into_iter().map(i64::from).collect())
                .collect()
        }
        other => panic!("Expected label matrix or bytes, got {other:?}"),
    };

    assert_eq!(paths.len(), request.len(), "Full path count mismatch");
    assert_eq!(names.len(), request.len(), "File name count mismatch");
    assert_eq!(dirs.len(), request.len(), "Directory count mismatch");
    assert_eq!(labels.len(), request.len(), "Label count mismatch");

    for (i, descriptor) in request.iter().enumerate() {
        assert_eq!(paths[i], descriptor.full_path(), "Full path mismatch at index {i}");
        assert_eq!(names[i], descriptor.file_name(), "File name mismatch at index {i}");
        assert_eq!(dirs[i], descriptor.parent_dir(), "Directory mismatch at index {i}");
        assert_one_hot(labels[i].as_slice(), descriptor.label_index());
    }
}
