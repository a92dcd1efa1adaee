//! [`MemoryStore`] — the in-memory implementation of `RestaurantStore`.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;

use bistro_core::{
  document::Restaurant,
  filter::{Field, Filter, Literal},
  store::RestaurantStore,
};

use crate::error::{Error, Result};

// ─── Internal state ──────────────────────────────────────────────────────────

/// Primary map plus the two secondary indexes. Documents live in a
/// `BTreeMap` so every scan yields ascending link order, which is what the
/// engine's deterministic tie-breaks rely on.
#[derive(Default)]
struct Inner {
  docs:       BTreeMap<String, Restaurant>,
  by_city:    HashMap<String, BTreeSet<String>>,
  by_country: HashMap<String, BTreeSet<String>>,
}

impl Inner {
  fn index_insert(&mut self, doc: &Restaurant) {
    let link = doc.restaurant_link.clone();
    self
      .by_city
      .entry(doc.position.city.clone())
      .or_default()
      .insert(link.clone());
    self
      .by_country
      .entry(doc.position.country.clone())
      .or_default()
      .insert(link);
  }

  fn index_remove(&mut self, city: &str, country: &str, link: &str) {
    if let Some(links) = self.by_city.get_mut(city) {
      links.remove(link);
      if links.is_empty() {
        self.by_city.remove(city);
      }
    }
    if let Some(links) = self.by_country.get_mut(country) {
      links.remove(link);
      if links.is_empty() {
        self.by_country.remove(country);
      }
    }
  }

  /// Links of documents matching `filter`, ascending, using the secondary
  /// indexes when the filter pins a city or country.
  fn matching_links(&self, filter: &Filter) -> Vec<String> {
    match index_probe(filter) {
      Some(keys) => {
        let index = match keys {
          Probe::City(_) => &self.by_city,
          Probe::Country(_) => &self.by_country,
        };
        let mut candidates: BTreeSet<&String> = BTreeSet::new();
        for key in keys.values() {
          if let Some(links) = index.get(key) {
            candidates.extend(links);
          }
        }
        candidates
          .into_iter()
          .filter(|link| {
            self
              .docs
              .get(link.as_str())
              .is_some_and(|doc| filter.matches(doc))
          })
          .cloned()
          .collect()
      }
      None => self
        .docs
        .iter()
        .filter(|(_, doc)| filter.matches(doc))
        .map(|(link, _)| link.clone())
        .collect(),
    }
  }
}

// ─── Index planning ──────────────────────────────────────────────────────────

enum Probe {
  City(Vec<String>),
  Country(Vec<String>),
}

impl Probe {
  fn values(&self) -> &[String] {
    match self {
      Probe::City(keys) | Probe::Country(keys) => keys,
    }
  }
}

/// Find an index-usable constraint: a top-level (or conjunct) equality or
/// membership test on city or country. The first one found wins; the full
/// filter is still re-checked against every candidate.
fn index_probe(filter: &Filter) -> Option<Probe> {
  match filter {
    Filter::Equals(Field::City, Literal::Str(city)) => {
      Some(Probe::City(vec![city.clone()]))
    }
    Filter::Equals(Field::Country, Literal::Str(country)) => {
      Some(Probe::Country(vec![country.clone()]))
    }
    Filter::In(Field::City, cities) => Some(Probe::City(cities.clone())),
    Filter::In(Field::Country, countries) => {
      Some(Probe::Country(countries.clone()))
    }
    Filter::And(clauses) => clauses.iter().find_map(index_probe),
    _ => None,
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// An in-memory restaurant store.
///
/// All reads take the inner read lock for their full duration, so a grouping
/// scan observes one consistent snapshot; all batched writes take the write
/// lock once, so readers never see a partial batch.
#[derive(Default)]
pub struct MemoryStore {
  inner: RwLock<Inner>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

impl RestaurantStore for MemoryStore {
  type Error = Error;

  fn insert(&self, doc: Restaurant) -> Result<()> {
    let mut inner = self.inner.write();
    if inner.docs.contains_key(&doc.restaurant_link) {
      return Err(Error::DuplicateLink(doc.restaurant_link));
    }
    inner.index_insert(&doc);
    inner.docs.insert(doc.restaurant_link.clone(), doc);
    Ok(())
  }

  fn insert_many(&self, docs: Vec<Restaurant>) -> Result<usize> {
    let mut inner = self.inner.write();

    // Validate the whole batch before touching anything.
    let mut batch_links: BTreeSet<&str> = BTreeSet::new();
    for doc in &docs {
      if inner.docs.contains_key(&doc.restaurant_link)
        || !batch_links.insert(&doc.restaurant_link)
      {
        return Err(Error::DuplicateLink(doc.restaurant_link.clone()));
      }
    }

    let count = docs.len();
    for doc in docs {
      inner.index_insert(&doc);
      inner.docs.insert(doc.restaurant_link.clone(), doc);
    }
    tracing::info!(count, "bulk-loaded documents");
    Ok(count)
  }

  fn get(&self, link: &str) -> Result<Option<Restaurant>> {
    Ok(self.inner.read().docs.get(link).cloned())
  }

  fn get_by_links(&self, links: &[String]) -> Result<Vec<Restaurant>> {
    let inner = self.inner.read();
    let wanted: BTreeSet<&String> = links.iter().collect();
    Ok(
      wanted
        .into_iter()
        .filter_map(|link| inner.docs.get(link).cloned())
        .collect(),
    )
  }

  fn find(&self, filter: &Filter) -> Result<Vec<Restaurant>> {
    let inner = self.inner.read();
    Ok(
      inner
        .matching_links(filter)
        .iter()
        .filter_map(|link| inner.docs.get(link).cloned())
        .collect(),
    )
  }

  fn for_each(&self, visit: &mut dyn FnMut(&Restaurant)) -> Result<()> {
    let inner = self.inner.read();
    for doc in inner.docs.values() {
      visit(doc);
    }
    Ok(())
  }

  fn update_where(
    &self,
    filter: &Filter,
    apply: &mut dyn FnMut(&mut Restaurant),
  ) -> Result<usize> {
    let mut inner = self.inner.write();
    let links = inner.matching_links(filter);
    for link in &links {
      let Some(doc) = inner.docs.get_mut(link) else {
        continue;
      };
      let old_city = doc.position.city.clone();
      let old_country = doc.position.country.clone();
      apply(doc);
      let moved =
        doc.position.city != old_city || doc.position.country != old_country;
      if moved {
        let doc = doc.clone();
        inner.index_remove(&old_city, &old_country, link);
        inner.index_insert(&doc);
      }
    }
    tracing::debug!(count = links.len(), "applied filtered bulk update");
    Ok(links.len())
  }

  fn replace_many(&self, docs: Vec<Restaurant>) -> Result<usize> {
    let mut inner = self.inner.write();

    for doc in &docs {
      if !inner.docs.contains_key(&doc.restaurant_link) {
        return Err(Error::MissingDocument(doc.restaurant_link.clone()));
      }
    }

    let count = docs.len();
    for doc in docs {
      let Some(old) = inner.docs.get(&doc.restaurant_link) else {
        continue;
      };
      let old_city = old.position.city.clone();
      let old_country = old.position.country.clone();
      inner.index_remove(&old_city, &old_country, &doc.restaurant_link);
      inner.index_insert(&doc);
      inner.docs.insert(doc.restaurant_link.clone(), doc);
    }
    tracing::debug!(count, "replaced documents");
    Ok(count)
  }

  fn len(&self) -> Result<usize> {
    Ok(self.inner.read().docs.len())
  }
}
