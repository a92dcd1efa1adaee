//! Error type for `bistro-ingest`.

use thiserror::Error;

/// A normalization failure. Any variant aborts the batch being loaded.
#[derive(Debug, Error)]
pub enum Error {
  #[error("column {0:?} missing from header row")]
  MissingColumn(&'static str),

  #[error("row too short: column {column:?} expected at index {index}")]
  MissingCell { column: &'static str, index: usize },

  #[error("restaurant_link is empty")]
  MissingKey,

  #[error("malformed price range: {0:?}")]
  MalformedPriceRange(String),

  #[error("invalid number in column {column:?}: {value:?}")]
  InvalidNumber { column: &'static str, value: String },

  #[error("invalid open-hours JSON: {0}")]
  OpenHours(#[from] serde_json::Error),

  #[error("row {index}: {source}")]
  Row {
    index:  usize,
    source: Box<Error>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
