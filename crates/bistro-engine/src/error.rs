//! Error type for `bistro-engine`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The operation referenced a link or sampled pool with no qualifying
  /// data. Abandoned with no partial write.
  #[error("not found: {0}")]
  NotFound(String),

  #[error("validation error: {0}")]
  Validation(String),

  #[error("core error: {0}")]
  Core(#[from] bistro_core::Error),

  /// Opaque backend failure, always propagated.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::Store(Box::new(source))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
