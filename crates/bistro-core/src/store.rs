//! The `RestaurantStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `bistro-store-memory`).
//! The engine crate depends on this abstraction, not on any concrete
//! backend. The core is single-caller and synchronous; backends provide
//! whatever internal locking they need to honour the batch-atomicity
//! contracts below.

use crate::{document::Restaurant, filter::Filter};

/// Abstraction over a restaurant document store.
///
/// Documents are keyed by `restaurant_link`. Writes are append-or-replace;
/// deletion is out of scope. Implementations must guarantee that
/// [`insert_many`](RestaurantStore::insert_many),
/// [`update_where`](RestaurantStore::update_where), and
/// [`replace_many`](RestaurantStore::replace_many) are each observed
/// atomically by readers — no query may see a partially applied batch — and
/// that a single [`find`](RestaurantStore::find) or
/// [`for_each`](RestaurantStore::for_each) call observes one consistent
/// snapshot.
pub trait RestaurantStore {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Insert one new document. Fails if the link is already present.
  fn insert(&self, doc: Restaurant) -> Result<(), Self::Error>;

  /// Bulk load. Atomic-or-nothing: on any duplicate link (within the batch
  /// or against the store) nothing is inserted.
  fn insert_many(&self, docs: Vec<Restaurant>) -> Result<usize, Self::Error>;

  /// Exact-key lookup.
  fn get(&self, link: &str) -> Result<Option<Restaurant>, Self::Error>;

  /// Exact-key lookup of several links; returns the subset present, in
  /// ascending link order.
  fn get_by_links(&self, links: &[String])
  -> Result<Vec<Restaurant>, Self::Error>;

  /// All documents matching `filter`, in ascending link order.
  fn find(&self, filter: &Filter) -> Result<Vec<Restaurant>, Self::Error>;

  /// Visit every document under one read snapshot, in ascending link order.
  /// Used by grouping scans that must not interleave with writers.
  fn for_each(
    &self,
    visit: &mut dyn FnMut(&Restaurant),
  ) -> Result<(), Self::Error>;

  /// Apply `apply` to every document matching `filter` as one atomic batch.
  /// Returns the number of documents updated.
  fn update_where(
    &self,
    filter: &Filter,
    apply: &mut dyn FnMut(&mut Restaurant),
  ) -> Result<usize, Self::Error>;

  /// Replace existing documents wholesale as one atomic batch, keyed by
  /// their links. Fails without applying anything if any link is absent.
  fn replace_many(&self, docs: Vec<Restaurant>)
  -> Result<usize, Self::Error>;

  /// Number of documents stored.
  fn len(&self) -> Result<usize, Self::Error>;

  fn is_empty(&self) -> Result<bool, Self::Error> {
    Ok(self.len()? == 0)
  }
}
