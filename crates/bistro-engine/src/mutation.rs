//! Mutation operations.
//!
//! Every multi-document mutation goes through one batched store write
//! (`update_where` or `replace_many`), never one write per document, so a
//! reader can never observe a half-applied mutation. The single-document
//! operations recover locally from a missing link: they log a warning and
//! do nothing, per the original system.

use std::collections::BTreeMap;

use bistro_core::{
  document::{RatingCategory, Restaurant},
  filter::{Field, Filter},
  store::RestaurantStore,
};

use crate::error::{Error, Result};

/// Marker appended to `features` by [`tag_weekend_availability`].
pub const WEEKEND_FEATURE: &str = "Open on weekends";

/// How many same-tier peers [`assign_similar_priced`] links per restaurant.
const PEER_COUNT: usize = 4;

// ─── Single-document updates ─────────────────────────────────────────────────

/// Record one new review in `category` for the given restaurant.
///
/// Increments the category bucket, recomputes `avg_rating` as the
/// count-weighted mean of the five buckets, and bumps
/// `total_reviews_count`. A missing link is a warned no-op.
pub fn record_rating<S: RestaurantStore>(
  store: &S,
  link: &str,
  category: RatingCategory,
) -> Result<()> {
  let Some(mut doc) = store.get(link).map_err(Error::store)? else {
    tracing::warn!(link, "rating update for unknown restaurant, skipping");
    return Ok(());
  };

  *doc.rating.count_mut(category) += 1.0;
  doc.rating.avg_rating = doc.rating.weighted_mean();
  doc.review.total_reviews_count += 1.0;

  store.replace_many(vec![doc]).map_err(Error::store)?;
  Ok(())
}

/// Add `feature` to the restaurant's features with set semantics: adding an
/// already-present token changes nothing. A missing link is a warned no-op.
pub fn add_feature<S: RestaurantStore>(
  store: &S,
  link: &str,
  feature: &str,
) -> Result<()> {
  let Some(mut doc) = store.get(link).map_err(Error::store)? else {
    tracing::warn!(link, "feature update for unknown restaurant, skipping");
    return Ok(());
  };
  if doc.features.iter().any(|f| f == feature) {
    return Ok(());
  }
  doc.features.push(feature.to_string());
  store.replace_many(vec![doc]).map_err(Error::store)?;
  Ok(())
}

// ─── Bulk updates ────────────────────────────────────────────────────────────

/// Scope of [`conditional_price_increase`].
#[derive(Debug, Clone)]
pub struct PriceIncreaseScope {
  pub city:              String,
  /// Every listed feature must be present on the document.
  pub required_features: Vec<String>,
  /// At least one listed cuisine must be present. An empty list therefore
  /// matches no document at all.
  pub cuisines:          Vec<String>,
  pub min_open_days:     f64,
}

/// For every document in scope: set `min_price` to `floor` when it is
/// currently null, otherwise raise it by `delta`. One filtered bulk write.
/// Returns the number of documents updated.
pub fn conditional_price_increase<S: RestaurantStore>(
  store: &S,
  scope: &PriceIncreaseScope,
  floor: i64,
  delta: i64,
) -> Result<usize> {
  let mut clauses = vec![Filter::Equals(Field::City, scope.city.as_str().into())];
  for feature in &scope.required_features {
    clauses.push(Filter::Equals(Field::Features, feature.as_str().into()));
  }
  clauses.push(Filter::In(Field::Cuisines, scope.cuisines.clone()));
  clauses.push(Filter::ge(Field::OpenDaysPerWeek, scope.min_open_days));
  let filter = Filter::And(clauses);

  store
    .update_where(&filter, &mut |doc| {
      doc.price.min_price = match doc.price.min_price {
        None => Some(floor),
        Some(current) => Some(current + delta),
      };
    })
    .map_err(Error::store)
}

/// Append [`WEEKEND_FEATURE`] to every restaurant open on both Saturday and
/// Sunday. This is an append, not a set-add: running it twice duplicates
/// the marker, matching the original system. Returns the number of
/// documents tagged.
pub fn tag_weekend_availability<S: RestaurantStore>(store: &S) -> Result<usize> {
  let filter = Filter::And(vec![
    Filter::Exists(Field::SaturdayHours),
    Filter::Exists(Field::SundayHours),
  ]);
  store
    .update_where(&filter, &mut |doc| {
      doc.features.push(WEEKEND_FEATURE.to_string());
    })
    .map_err(Error::store)
}

/// For each price tier in `city`, give every restaurant up to four
/// same-tier, same-city peers (`n - 1` when the tier is smaller), excluding
/// itself. One batched write per tier. Restricted to a single city because
/// a full-dataset run is prohibitively slow.
///
/// Returns the total number of documents written.
pub fn assign_similar_priced<S: RestaurantStore>(
  store: &S,
  city: &str,
) -> Result<usize> {
  let docs = store
    .find(&Filter::Equals(Field::City, city.into()))
    .map_err(Error::store)?;

  let mut tiers: BTreeMap<String, Vec<Restaurant>> = BTreeMap::new();
  for doc in docs {
    if doc.price.price_level.is_empty() {
      continue;
    }
    tiers.entry(doc.price.price_level.clone()).or_default().push(doc);
  }

  let mut written = 0;
  for (tier, mut members) in tiers {
    let links: Vec<String> =
      members.iter().map(|doc| doc.restaurant_link.clone()).collect();
    for doc in &mut members {
      doc.similar_priced = links
        .iter()
        .filter(|link| **link != doc.restaurant_link)
        .take(PEER_COUNT)
        .cloned()
        .collect();
    }
    let count = members.len();
    store.replace_many(members).map_err(Error::store)?;
    tracing::debug!(%tier, count, "assigned similar-priced peers");
    written += count;
  }
  Ok(written)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
