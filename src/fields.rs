//! Row field values handed to the destination table's writer.
//!
//! A fragment becomes one [`ImageRow`]: five eagerly built metadata fields plus the image
//! data, which stays lazy as a [`StreamingField`] until the writer drains it.

use crate::streaming::StreamingField;
use serde::{Deserialize, Serialize};

/// Column types the destination schema can negotiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "text[]")]
    TextArray,
    #[serde(rename = "bytea")]
    Bytea,
    #[serde(rename = "int2[]")]
    Int2Array,
    #[serde(rename = "int4[]")]
    Int4Array,
    #[serde(rename = "int8[]")]
    Int8Array,
    #[serde(rename = "float4[]")]
    Float4Array,
    #[serde(rename = "float8[]")]
    Float8Array,
}

impl DataType {
    #[must_use]
    pub const fn is_array(self) -> bool {
        !matches!(self, Self::Text | Self::Bytea)
    }
}

/// One eagerly materialized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    TextArray(Vec<String>),
    Bytes(Vec<u8>),
    IntArray(Vec<i64>),
    IntMatrix(Vec<Vec<i64>>),
}

impl FieldValue {
    /// The wire type this value is written as.
    #[must_use]
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Text(_) => DataType::Text,
            Self::TextArray(_) => DataType::TextArray,
            Self::Bytes(_) => DataType::Bytea,
            Self::IntArray(_) | Self::IntMatrix(_) => DataType::Int8Array,
        }
    }

    /// Text form of the value in Postgres syntax.
    ///
    /// Arrays become `{...}` literals (text elements quoted and escaped), byte strings
    /// become `\x`-prefixed hex.
    #[must_use]
    pub fn to_literal(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::TextArray(items) => {
                let quoted: Vec<String> = items.iter().map(|s| quote_element(s)).collect();
                format!("{{{}}}", quoted.join(","))
            }
            Self::Bytes(bytes) => {
                let mut out = String::with_capacity(2 + bytes.len() * 2);
                out.push_str("\\x");
                out.extend(bytes.iter().map(|b| format!("{b:02x}")));
                out
            }
            Self::IntArray(values) => int_literal(values),
            Self::IntMatrix(rows) => {
                let inner: Vec<String> = rows.iter().map(|r| int_literal(r)).collect();
                format!("{{{}}}", inner.join(","))
            }
        }
    }
}

fn int_literal(values: &[i64]) -> String {
    let items: Vec<String> = values.iter().map(ToString::to_string).collect();
    format!("{{{}}}", items.join(","))
}

fn quote_element(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// The per-row metadata columns, in output order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowMetadata {
    pub full_paths: FieldValue,
    pub file_names: FieldValue,
    pub parent_dirs: FieldValue,
    pub labels: FieldValue,
    pub dimensions: FieldValue,
}

impl RowMetadata {
    #[must_use]
    pub fn fields(&self) -> [&FieldValue; 5] {
        [
            &self.full_paths,
            &self.file_names,
            &self.parent_dirs,
            &self.labels,
            &self.dimensions,
        ]
    }
}

/// One fragment's output row.
pub struct ImageRow {
    pub metadata: RowMetadata,
    pub images: StreamingField,
}

impl ImageRow {
    /// Number of images the row carries.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.images.len()
    }
}

impl std::fmt::Debug for ImageRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageRow")
            .field("metadata", &self.metadata)
            .field("images", &self.images)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_array_literal_escapes() {
        let v = FieldValue::TextArray(vec!["a\"b".into(), "c\\d".into(), "plain".into()]);
        assert_eq!(v.to_literal(), r#"{"a\"b","c\\d","plain"}"#);
    }

    #[test]
    fn test_numeric_literals() {
        assert_eq!(FieldValue::IntArray(vec![2, 128, 256, 3]).to_literal(), "{2,128,256,3}");
        assert_eq!(
            FieldValue::IntMatrix(vec![vec![1, 0], vec![0, 1]]).to_literal(),
            "{{1,0},{0,1}}"
        );
        assert_eq!(FieldValue::Bytes(vec![0, 1, 255]).to_literal(), "\\x0001ff");
    }
}
