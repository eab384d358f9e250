//! Scan configuration: request options and negotiated column types.
//!
//! The external table definition supplies options such as `ACCESSOR_THREADS=4` and
//! `NORMALIZE=true`; the destination schema supplies the column types. Both are folded
//! into a [`ScanConfig`] before any engine is built.

use crate::error::{IngestError, Result};
use crate::fields::DataType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Worker-pool size for fetch and encode chunks.
pub const THREADS_OPTION: &str = "ACCESSOR_THREADS";
/// Selects float-normalized pixel values.
pub const NORMALIZE_OPTION: &str = "NORMALIZE";

/// Schema position of the full-path column.
pub const FULL_PATH_COLUMN: usize = 0;
/// Schema position of the one-hot label column.
pub const ONE_HOT_COLUMN: usize = 3;
/// Schema position of the image data column.
pub const IMAGE_COLUMN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessorConfig {
    pub threads: usize,
    pub normalize: bool,
}

impl Default for AccessorConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            normalize: false,
        }
    }
}

impl AccessorConfig {
    /// Reads `ACCESSOR_THREADS` and `NORMALIZE` from request options.
    ///
    /// Option names match case-insensitively. `NORMALIZE` is on only for the value `true`
    /// (any case); anything else leaves it off.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the thread count is not a positive integer.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(raw) = option(options, THREADS_OPTION) {
            let threads: usize = raw
                .trim()
                .parse()
                .map_err(|e| IngestError::config(THREADS_OPTION, format!("'{raw}': {e}")))?;
            if threads == 0 {
                return Err(IngestError::config(THREADS_OPTION, "must be at least 1"));
            }
            config.threads = threads;
        }
        if let Some(raw) = option(options, NORMALIZE_OPTION) {
            config.normalize = raw.trim().eq_ignore_ascii_case("true");
        }
        Ok(config)
    }
}

fn option<'a>(options: &'a HashMap<String, String>, name: &str) -> Option<&'a str> {
    options
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// The negotiated types that shape a row's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTypes {
    pub full_path: DataType,
    pub one_hot: DataType,
    pub image: DataType,
}

impl Default for ColumnTypes {
    fn default() -> Self {
        Self {
            full_path: DataType::TextArray,
            one_hot: DataType::Int8Array,
            image: DataType::Int8Array,
        }
    }
}

impl ColumnTypes {
    #[must_use]
    pub const fn new(full_path: DataType, one_hot: DataType, image: DataType) -> Self {
        Self {
            full_path,
            one_hot,
            image,
        }
    }

    /// Reads the types at the fixed full-path, one-hot and image positions of a schema.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the schema has fewer than six columns.
    pub fn from_schema(schema: &[DataType]) -> Result<Self> {
        if schema.len() <= IMAGE_COLUMN {
            return Err(IngestError::config(
                "columns",
                format!(
                    "expected at least {} columns, got {}",
                    IMAGE_COLUMN + 1,
                    schema.len()
                ),
            ));
        }
        Ok(Self::new(
            schema[FULL_PATH_COLUMN],
            schema[ONE_HOT_COLUMN],
            schema[IMAGE_COLUMN],
        ))
    }
}

/// Everything a scan needs besides the descriptor and the split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub accessor: AccessorConfig,
    #[serde(default)]
    pub columns: ColumnTypes,
}

impl ScanConfig {
    #[must_use]
    pub const fn new(accessor: AccessorConfig, columns: ColumnTypes) -> Self {
        Self { accessor, columns }
    }

    /// Builds a configuration from request options and the destination schema.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if an option is invalid or the schema is too short.
    pub fn from_request(options: &HashMap<String, String>, schema: &[DataType]) -> Result<Self> {
        Ok(Self::new(
            AccessorConfig::from_options(options)?,
            ColumnTypes::from_schema(schema)?,
        ))
    }

    /// Parses a JSON configuration, e.g.
    /// `{"accessor": {"threads": 4}, "columns": {"full_path": "text[]", "one_hot": "bytea", "image": "bytea"}}`.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Config`] if the JSON is malformed or names an unknown type.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| IngestError::config("json", e.to_string()))?;
        if config.accessor.threads == 0 {
            return Err(IngestError::config(THREADS_OPTION, "must be at least 1"));
        }
        Ok(config)
    }
}
