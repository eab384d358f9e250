//! Per-row metadata columns: paths, names, directories, labels and dimensions.

use crate::descriptor::FragmentRequest;
use crate::encode::OutputShape;
use crate::encode::bitmap::CHANNELS;
use crate::fields::{FieldValue, RowMetadata};

/// Builds the five metadata columns for a request whose images are `width x height`.
///
/// Scalar rows describe the first descriptor only; array rows describe every descriptor
/// in request order.
#[must_use]
pub fn build_metadata(
    request: &FragmentRequest,
    shape: &OutputShape,
    width: u32,
    height: u32,
) -> RowMetadata {
    let descriptors = if shape.scalar_mode {
        &request.descriptors()[..request.len().min(1)]
    } else {
        request.descriptors()
    };

    let full_paths: Vec<String> = descriptors.iter().map(|d| d.full_path().to_string()).collect();
    let file_names: Vec<String> = descriptors.iter().map(|d| d.file_name().to_string()).collect();
    let parent_dirs: Vec<String> =
        descriptors.iter().map(|d| d.parent_dir().to_string()).collect();
    let one_hots: Vec<Vec<u8>> = descriptors.iter().map(|d| d.one_hot()).collect();

    let mut dimensions = Vec::with_capacity(4);
    if !shape.scalar_mode {
        dimensions.push(request.len() as i64);
    }
    dimensions.extend([i64::from(height), i64::from(width), CHANNELS as i64]);

    if shape.scalar_mode {
        RowMetadata {
            full_paths: FieldValue::Text(first_or_empty(full_paths)),
            file_names: FieldValue::Text(first_or_empty(file_names)),
            parent_dirs: FieldValue::Text(first_or_empty(parent_dirs)),
            labels: label_field(one_hots, shape),
            dimensions: FieldValue::IntArray(dimensions),
        }
    } else {
        RowMetadata {
            full_paths: FieldValue::TextArray(full_paths),
            file_names: FieldValue::TextArray(file_names),
            parent_dirs: FieldValue::TextArray(parent_dirs),
            labels: label_field(one_hots, shape),
            dimensions: FieldValue::IntArray(dimensions),
        }
    }
}

fn first_or_empty(values: Vec<String>) -> String {
    values.into_iter().next().unwrap_or_default()
}

/// Binary label columns get one byte per entry, concatenated row-major across images;
/// otherwise labels stay integer arrays (a matrix for array rows).
fn label_field(one_hots: Vec<Vec<u8>>, shape: &OutputShape) -> FieldValue {
    if shape.labels_as_bytes {
        return FieldValue::Bytes(one_hots.concat());
    }
    let to_ints = |v: Vec<u8>| v.into_iter().map(i64::from).collect::<Vec<i64>>();
    if shape.scalar_mode {
        FieldValue::IntArray(one_hots.into_iter().next().map(to_ints).unwrap_or_default())
    } else {
        FieldValue::IntMatrix(one_hots.into_iter().map(to_ints).collect())
    }
}

/// Recovers the label index from a one-hot vector.
///
/// Returns `None` unless exactly one entry is non-zero.
#[must_use]
pub fn decode_one_hot<T: Copy + Default + PartialEq>(vector: &[T]) -> Option<usize> {
    let zero = T::default();
    let mut hot = vector
        .iter()
        .enumerate()
        .filter(|&(_, v)| *v != zero)
        .map(|(i, _)| i);
    match (hot.next(), hot.next()) {
        (Some(i), None) => Some(i),
        _ => None,
    }
}
