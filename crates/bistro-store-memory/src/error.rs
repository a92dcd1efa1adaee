//! Error type for `bistro-store-memory`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("duplicate restaurant_link: {0}")]
  DuplicateLink(String),

  #[error("no document to replace for restaurant_link: {0}")]
  MissingDocument(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
