//! Ingestion normalizer: header-indexed string rows → [`Restaurant`]
//! documents.
//!
//! This crate never touches files. The caller (a CSV reader or a test)
//! supplies the header row and the data rows; [`normalize_rows`] maps each
//! row to one document or fails the whole batch — a partial,
//! silently-incomplete load is never produced.

pub mod error;
pub mod normalize;

use std::collections::HashMap;

use bistro_core::document::Restaurant;

pub use crate::{
  error::{Error, Result},
  normalize::normalize_row,
};

// ─── Header map ──────────────────────────────────────────────────────────────

/// Column-name → index lookup, built once from the header row.
#[derive(Debug, Clone)]
pub struct HeaderMap {
  columns: HashMap<String, usize>,
}

impl HeaderMap {
  pub fn from_row(header: &[String]) -> Self {
    let columns = header
      .iter()
      .enumerate()
      .map(|(index, name)| (name.clone(), index))
      .collect();
    Self { columns }
  }

  pub(crate) fn index(&self, column: &'static str) -> Result<usize> {
    self
      .columns
      .get(column)
      .copied()
      .ok_or(Error::MissingColumn(column))
  }
}

// ─── Batch entry point ───────────────────────────────────────────────────────

/// Normalize every row, aborting the whole batch on the first failure.
///
/// The error is tagged with the zero-based index of the offending data row
/// (the header row is not counted).
pub fn normalize_rows(
  headers: &HeaderMap,
  rows: &[Vec<String>],
) -> Result<Vec<Restaurant>> {
  let mut docs = Vec::with_capacity(rows.len());
  for (index, row) in rows.iter().enumerate() {
    let doc = normalize_row(headers, row).map_err(|source| Error::Row {
      index,
      source: Box::new(source),
    })?;
    docs.push(doc);
  }
  tracing::debug!(rows = docs.len(), "normalized ingest batch");
  Ok(docs)
}
