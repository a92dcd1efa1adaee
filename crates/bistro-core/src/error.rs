//! Error types for `bistro-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown rating category: {0:?}")]
  UnknownRatingCategory(String),

  #[error("invalid filter pattern: {0}")]
  Pattern(#[from] regex::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
