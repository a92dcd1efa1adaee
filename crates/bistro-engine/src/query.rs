//! Analytical query operations.
//!
//! Each operation builds a typed [`Filter`], evaluates it through the store,
//! and applies its derived-field / sort / limit pipeline. All sorts carry
//! `restaurant_link` ascending as the final key, so results are
//! deterministic regardless of backend scan order.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde::Serialize;

use bistro_core::{
  document::Restaurant,
  filter::{Field, Filter},
  store::RestaurantStore,
};

use crate::error::{Error, Result};

// ─── Derived records ─────────────────────────────────────────────────────────

/// One row of the weighted-rating ranking.
#[derive(Debug, Clone, Serialize)]
pub struct WeightedRanked {
  pub restaurant_link: String,
  pub restaurant_name: String,
  /// `food + atmosphere + value + service`; never persisted.
  pub weighted_rating: f64,
}

/// One row of the per-country excellent-rating ranking.
#[derive(Debug, Clone, Serialize)]
pub struct CountryExcellence {
  pub country:       String,
  pub avg_excellent: f64,
}

impl CountryExcellence {
  /// The ranking sorts on the exact average; display rounds down.
  pub fn display_value(&self) -> f64 {
    self.avg_excellent.floor()
  }
}

// ─── Operations ──────────────────────────────────────────────────────────────

/// Restaurants in `city` whose features contain `feature` as a
/// case-sensitive substring.
pub fn feature_in_city<S: RestaurantStore>(
  store: &S,
  city: &str,
  feature: &str,
) -> Result<Vec<Restaurant>> {
  let filter = Filter::And(vec![
    Filter::Equals(Field::City, city.into()),
    Filter::contains(Field::Features, feature)?,
  ]);
  store.find(&filter).map_err(Error::store)
}

/// The 3 most popular restaurants in `city`: generic popularity rank of the
/// form `#<digit><non-digit>…<city>`, ascending lexical order on the rank
/// string.
pub fn popular_in_city<S: RestaurantStore>(
  store: &S,
  city: &str,
) -> Result<Vec<Restaurant>> {
  let pattern = Regex::new(&format!("^#[0-9]\\D.*{}$", regex::escape(city)))
    .map_err(bistro_core::Error::from)?;
  let mut docs = store
    .find(&Filter::Regex(Field::PopularityGeneric, pattern))
    .map_err(Error::store)?;
  docs.sort_by(|a, b| {
    a.popularity
      .popularity_generic
      .cmp(&b.popularity.popularity_generic)
      .then_with(|| a.restaurant_link.cmp(&b.restaurant_link))
  });
  docs.truncate(3);
  Ok(docs)
}

/// Vegetarian-friendly and gluten-free restaurants across a set of cities.
pub fn vegan_gluten_free_in_cities<S: RestaurantStore>(
  store: &S,
  cities: &[String],
) -> Result<Vec<Restaurant>> {
  let filter = Filter::And(vec![
    Filter::Equals(Field::VegetarianFriendly, "Y".into()),
    Filter::Equals(Field::GlutenFree, "Y".into()),
    Filter::In(Field::City, cities.to_vec()),
  ]);
  store.find(&filter).map_err(Error::store)
}

/// Top-10 restaurants of `country` by the derived weighted rating,
/// descending.
pub fn weighted_rating_by_country<S: RestaurantStore>(
  store: &S,
  country: &str,
) -> Result<Vec<WeightedRanked>> {
  let docs = store
    .find(&Filter::Equals(Field::Country, country.into()))
    .map_err(Error::store)?;
  let mut ranked: Vec<WeightedRanked> = docs
    .into_iter()
    .map(|doc| WeightedRanked {
      weighted_rating: doc.rating.weighted_rating(),
      restaurant_link: doc.restaurant_link,
      restaurant_name: doc.restaurant_name,
    })
    .collect();
  ranked.sort_by(|a, b| {
    b.weighted_rating
      .total_cmp(&a.weighted_rating)
      .then_with(|| a.restaurant_link.cmp(&b.restaurant_link))
  });
  ranked.truncate(10);
  Ok(ranked)
}

/// English-reviewed restaurants open `open_days` days a week with at least
/// `min_reviews` reviews and a price range inside `[min_price, max_price]`.
pub fn english_always_open<S: RestaurantStore>(
  store: &S,
  open_days: f64,
  min_reviews: f64,
  min_price: f64,
  max_price: f64,
) -> Result<Vec<Restaurant>> {
  let filter = Filter::And(vec![
    Filter::Equals(Field::OpenDaysPerWeek, open_days.into()),
    Filter::ge(Field::TotalReviewsCount, min_reviews),
    Filter::Equals(Field::DefaultLanguage, "English".into()),
    Filter::ge(Field::MinPrice, min_price),
    Filter::le(Field::MaxPrice, max_price),
  ]);
  store.find(&filter).map_err(Error::store)
}

/// For each country, the restaurant of tier `price_level` with the highest
/// `max_price`. Ties go to the first document after the descending sort
/// (link ascending). Countries with no qualifying document are omitted;
/// results come back in country order.
pub fn most_expensive_per_country<S: RestaurantStore>(
  store: &S,
  price_level: &str,
) -> Result<Vec<Restaurant>> {
  let filter = Filter::And(vec![
    Filter::Equals(Field::PriceLevel, price_level.into()),
    Filter::Exists(Field::MaxPrice),
  ]);
  let mut docs = store.find(&filter).map_err(Error::store)?;
  docs.sort_by(|a, b| {
    b.price
      .max_price
      .cmp(&a.price.max_price)
      .then_with(|| a.restaurant_link.cmp(&b.restaurant_link))
  });

  let mut seen: HashSet<String> = HashSet::new();
  let mut winners: Vec<Restaurant> = docs
    .into_iter()
    .filter(|doc| {
      !doc.position.country.is_empty()
        && seen.insert(doc.position.country.clone())
    })
    .collect();
  winners.sort_by(|a, b| a.position.country.cmp(&b.position.country));
  Ok(winners)
}

/// Top-10 rated restaurants across the 5 cities holding the most
/// restaurants. Sorted by `(avg_rating desc, excellent desc, link asc)`.
///
/// The whole grouping runs off one snapshot scan; the final fetch is by
/// exact links, so no document can slip in between the two phases.
pub fn top_rated_in_popular_cities<S: RestaurantStore>(
  store: &S,
) -> Result<Vec<Restaurant>> {
  struct Entry {
    city:      String,
    link:      String,
    avg:       f64,
    excellent: f64,
  }

  let mut entries: Vec<Entry> = Vec::new();
  store
    .for_each(&mut |doc| {
      if doc.position.city.is_empty() {
        return;
      }
      entries.push(Entry {
        city:      doc.position.city.clone(),
        link:      doc.restaurant_link.clone(),
        avg:       doc.rating.avg_rating,
        excellent: doc.rating.excellent,
      });
    })
    .map_err(Error::store)?;

  let mut counts: HashMap<&str, usize> = HashMap::new();
  for entry in &entries {
    *counts.entry(&entry.city).or_default() += 1;
  }
  let mut cities: Vec<(&str, usize)> = counts.into_iter().collect();
  cities.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
  let top_cities: HashSet<&str> =
    cities.iter().take(5).map(|(city, _)| *city).collect();

  let mut candidates: Vec<&Entry> = entries
    .iter()
    .filter(|entry| top_cities.contains(entry.city.as_str()))
    .collect();
  candidates.sort_by(|a, b| {
    b.avg
      .total_cmp(&a.avg)
      .then_with(|| b.excellent.total_cmp(&a.excellent))
      .then_with(|| a.link.cmp(&b.link))
  });
  let links: Vec<String> =
    candidates.iter().take(10).map(|entry| entry.link.clone()).collect();

  let fetched = store.get_by_links(&links).map_err(Error::store)?;
  let mut by_link: HashMap<String, Restaurant> = fetched
    .into_iter()
    .map(|doc| (doc.restaurant_link.clone(), doc))
    .collect();
  Ok(links.iter().filter_map(|link| by_link.remove(link)).collect())
}

/// Top-5 countries by average `excellent` review count, descending.
/// Countries with no documents are omitted, not emitted with count 0.
pub fn top_countries_by_excellent<S: RestaurantStore>(
  store: &S,
) -> Result<Vec<CountryExcellence>> {
  let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
  store
    .for_each(&mut |doc| {
      if doc.position.country.is_empty() {
        return;
      }
      let slot = sums.entry(doc.position.country.clone()).or_insert((0.0, 0));
      slot.0 += doc.rating.excellent;
      slot.1 += 1;
    })
    .map_err(Error::store)?;

  let mut ranked: Vec<CountryExcellence> = sums
    .into_iter()
    .map(|(country, (sum, count))| CountryExcellence {
      country,
      avg_excellent: sum / count as f64,
    })
    .collect();
  ranked.sort_by(|a, b| {
    b.avg_excellent
      .total_cmp(&a.avg_excellent)
      .then_with(|| a.country.cmp(&b.country))
  });
  ranked.truncate(5);
  Ok(ranked)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use bistro_store_memory::MemoryStore;

  use crate::testutil::{doc_in, store_with};

  use super::*;

  // ── feature_in_city ─────────────────────────────────────────────────────

  #[test]
  fn feature_in_city_matches_substring_case_sensitively() {
    let mut a = doc_in("g1-d1", "Lyon", "France");
    a.features = vec!["WheelchairAccessible".to_string()];
    let mut b = doc_in("g1-d2", "Lyon", "France");
    b.features = vec!["Parking".to_string()];
    let mut c = doc_in("g2-d1", "Paris", "France");
    c.features = vec!["WheelchairAccessible".to_string()];
    let store = store_with(vec![a, b, c]);

    let hits = feature_in_city(&store, "Lyon", "chair").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].restaurant_link, "g1-d1");
    // Case-sensitive: no match for the uppercase variant.
    assert!(feature_in_city(&store, "Lyon", "CHAIR").unwrap().is_empty());
  }

  // ── popular_in_city ─────────────────────────────────────────────────────

  #[test]
  fn popular_in_city_returns_three_lowest_ranks() {
    let rank = |n: u32| format!("#{n} of 50 places to eat in Lyon");
    let mut docs = Vec::new();
    for (link, n) in [("g1-d1", 4), ("g1-d2", 1), ("g1-d3", 3), ("g1-d4", 2)] {
      let mut doc = doc_in(link, "Lyon", "France");
      doc.popularity.popularity_generic = rank(n);
      docs.push(doc);
    }
    // Two-digit rank does not fit the `#<digit><non-digit>` prefix.
    let mut outside = doc_in("g1-d5", "Lyon", "France");
    outside.popularity.popularity_generic = rank(12);
    docs.push(outside);
    // Rank string for another city must not match.
    let mut other = doc_in("g2-d1", "Paris", "France");
    other.popularity.popularity_generic =
      "#1 of 9000 places to eat in Paris".to_string();
    docs.push(other);
    let store = store_with(docs);

    let top = popular_in_city(&store, "Lyon").unwrap();
    let links: Vec<&str> =
      top.iter().map(|d| d.restaurant_link.as_str()).collect();
    assert_eq!(links, vec!["g1-d2", "g1-d4", "g1-d3"]);
  }

  // ── vegan_gluten_free_in_cities ─────────────────────────────────────────

  #[test]
  fn vegan_gluten_free_requires_both_flags_and_city_membership() {
    let mut yes = doc_in("g1-d1", "Lyon", "France");
    yes.food_info.vegetarian_friendly = "Y".to_string();
    yes.food_info.gluten_free = "Y".to_string();
    let mut half = doc_in("g1-d2", "Lyon", "France");
    half.food_info.vegetarian_friendly = "Y".to_string();
    half.food_info.gluten_free = "N".to_string();
    let mut elsewhere = doc_in("g3-d1", "Milan", "Italy");
    elsewhere.food_info.vegetarian_friendly = "Y".to_string();
    elsewhere.food_info.gluten_free = "Y".to_string();
    let store = store_with(vec![yes, half, elsewhere]);

    let cities = vec!["Lyon".to_string(), "Paris".to_string()];
    let hits = vegan_gluten_free_in_cities(&store, &cities).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].restaurant_link, "g1-d1");
  }

  // ── weighted_rating_by_country ──────────────────────────────────────────

  #[test]
  fn weighted_rating_sums_four_dimensions_and_sorts_descending() {
    let mut low = doc_in("g1-d1", "Lyon", "France");
    low.rating.food = 3.0;
    low.rating.service = 3.0;
    let mut high = doc_in("g1-d2", "Lyon", "France");
    high.rating.food = 4.5;
    high.rating.atmosphere = 4.0;
    high.rating.value = 4.0;
    high.rating.service = 4.5;
    let foreign = doc_in("g3-d1", "Milan", "Italy");
    let store = store_with(vec![low, high, foreign]);

    let ranked = weighted_rating_by_country(&store, "France").unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].restaurant_link, "g1-d2");
    assert_eq!(ranked[0].weighted_rating, 17.0);
    assert_eq!(ranked[1].weighted_rating, 6.0);
  }

  #[test]
  fn weighted_rating_ties_break_by_link() {
    let mut docs = Vec::new();
    for link in ["g1-d2", "g1-d1", "g1-d3"] {
      let mut doc = doc_in(link, "Lyon", "France");
      doc.rating.food = 4.0;
      docs.push(doc);
    }
    let store = store_with(docs);

    let ranked = weighted_rating_by_country(&store, "France").unwrap();
    let links: Vec<&str> =
      ranked.iter().map(|r| r.restaurant_link.as_str()).collect();
    assert_eq!(links, vec!["g1-d1", "g1-d2", "g1-d3"]);
  }

  #[test]
  fn weighted_rating_limits_to_ten() {
    let mut docs = Vec::new();
    for n in 0..14 {
      docs.push(doc_in(&format!("g1-d{n:02}"), "Lyon", "France"));
    }
    let store = store_with(docs);
    assert_eq!(weighted_rating_by_country(&store, "France").unwrap().len(), 10);
  }

  // ── english_always_open ─────────────────────────────────────────────────

  #[test]
  fn english_always_open_conjunction() {
    let mut hit = doc_in("g1-d1", "Lyon", "France");
    hit.schedule.open_days_per_week = Some(7.0);
    hit.review.total_reviews_count = 250.0;
    hit.review.default_language = "English".to_string();
    hit.price.min_price = Some(15);
    hit.price.max_price = Some(40);

    // Same profile but no price range at all — excluded by the bounds.
    let mut unpriced = hit.clone();
    unpriced.restaurant_link = "g1-d2".to_string();
    unpriced.price.min_price = None;
    unpriced.price.max_price = None;

    let mut closed_mondays = hit.clone();
    closed_mondays.restaurant_link = "g1-d3".to_string();
    closed_mondays.schedule.open_days_per_week = Some(6.0);

    let store = store_with(vec![hit, unpriced, closed_mondays]);
    let hits = english_always_open(&store, 7.0, 100.0, 10.0, 50.0).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].restaurant_link, "g1-d1");
  }

  // ── most_expensive_per_country ──────────────────────────────────────────

  #[test]
  fn most_expensive_per_country_picks_one_winner_per_country() {
    let tier = "$$$$";
    let mut docs = Vec::new();
    for (link, country, max) in [
      ("g1-d1", "France", 90),
      ("g1-d2", "France", 120),
      ("g3-d1", "Italy", 80),
    ] {
      let mut doc = doc_in(link, "Somewhere", country);
      doc.price.price_level = tier.to_string();
      doc.price.min_price = Some(10);
      doc.price.max_price = Some(max);
      docs.push(doc);
    }
    // Right price, wrong tier.
    let mut cheap_tier = doc_in("g1-d9", "Somewhere", "France");
    cheap_tier.price.price_level = "$".to_string();
    cheap_tier.price.max_price = Some(500);
    docs.push(cheap_tier);
    let store = store_with(docs);

    let winners = most_expensive_per_country(&store, tier).unwrap();
    let picked: Vec<(&str, &str)> = winners
      .iter()
      .map(|d| (d.position.country.as_str(), d.restaurant_link.as_str()))
      .collect();
    assert_eq!(picked, vec![("France", "g1-d2"), ("Italy", "g3-d1")]);
  }

  #[test]
  fn most_expensive_tie_goes_to_lowest_link() {
    let mut docs = Vec::new();
    for link in ["g1-d2", "g1-d1"] {
      let mut doc = doc_in(link, "Lyon", "France");
      doc.price.price_level = "$$$$".to_string();
      doc.price.max_price = Some(100);
      docs.push(doc);
    }
    let store = store_with(docs);
    let winners = most_expensive_per_country(&store, "$$$$").unwrap();
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].restaurant_link, "g1-d1");
  }

  // ── top_rated_in_popular_cities ─────────────────────────────────────────

  #[test]
  fn top_rated_considers_only_the_five_biggest_cities() {
    let mut docs = Vec::new();
    // Six cities with 6, 5, 4, 3, 2, 1 restaurants; the singleton city
    // holds the best-rated restaurant but must be ignored.
    for (city_index, size) in [6, 5, 4, 3, 2, 1].into_iter().enumerate() {
      for n in 0..size {
        let mut doc = doc_in(
          &format!("g{city_index}-d{n}"),
          &format!("City{city_index}"),
          "France",
        );
        doc.rating.avg_rating = 3.0;
        docs.push(doc);
      }
    }
    if let Some(doc) = docs.iter_mut().find(|d| d.position.city == "City5") {
      doc.rating.avg_rating = 5.0;
    }
    // And one top document in the biggest city.
    docs[0].rating.avg_rating = 4.5;
    let store = store_with(docs);

    let top = top_rated_in_popular_cities(&store).unwrap();
    assert_eq!(top.len(), 10);
    assert_eq!(top[0].restaurant_link, "g0-d0");
    assert!(top.iter().all(|d| d.position.city != "City5"));
  }

  #[test]
  fn top_rated_breaks_avg_ties_with_excellent_count() {
    let mut docs = Vec::new();
    for n in 0..10 {
      let mut doc = doc_in(&format!("g1-d{n}"), "Lyon", "France");
      doc.rating.avg_rating = 4.0;
      doc.rating.excellent = n as f64;
      docs.push(doc);
    }
    let store = store_with(docs);

    let top = top_rated_in_popular_cities(&store).unwrap();
    assert_eq!(top[0].restaurant_link, "g1-d9");
    assert_eq!(top[9].restaurant_link, "g1-d0");
  }

  #[test]
  fn top_rated_excludes_documents_without_a_city() {
    let mut nameless = doc_in("g0-d0", "", "France");
    nameless.rating.avg_rating = 5.0;
    let rated = doc_in("g1-d1", "Lyon", "France");
    let store = store_with(vec![nameless, rated]);

    let top = top_rated_in_popular_cities(&store).unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].restaurant_link, "g1-d1");
  }

  // ── top_countries_by_excellent ──────────────────────────────────────────

  #[test]
  fn top_countries_by_average_excellent_descending() {
    let mut docs = Vec::new();
    for (link, country, excellent) in [
      ("g1-d1", "France", 10.0),
      ("g1-d2", "France", 20.0),
      ("g3-d1", "Italy", 40.0),
      ("g4-d1", "Spain", 5.0),
    ] {
      let mut doc = doc_in(link, "Somewhere", country);
      doc.rating.excellent = excellent;
      docs.push(doc);
    }
    let store = store_with(docs);

    let ranked = top_countries_by_excellent(&store).unwrap();
    let rows: Vec<(&str, f64)> = ranked
      .iter()
      .map(|r| (r.country.as_str(), r.avg_excellent))
      .collect();
    assert_eq!(
      rows,
      vec![("Italy", 40.0), ("France", 15.0), ("Spain", 5.0)]
    );
  }

  #[test]
  fn top_countries_limits_to_five_and_floors_for_display() {
    let mut docs = Vec::new();
    for n in 0..7 {
      let mut doc =
        doc_in(&format!("g{n}-d1"), "Somewhere", &format!("Country{n}"));
      doc.rating.excellent = n as f64 + 0.9;
      docs.push(doc);
    }
    let store = store_with(docs);

    let ranked = top_countries_by_excellent(&store).unwrap();
    assert_eq!(ranked.len(), 5);
    assert_eq!(ranked[0].country, "Country6");
    assert_eq!(ranked[0].avg_excellent, 6.9);
    assert_eq!(ranked[0].display_value(), 6.0);
  }

  // ── plumbing ────────────────────────────────────────────────────────────

  #[test]
  fn operations_work_against_an_empty_store() {
    let store = MemoryStore::new();
    assert!(feature_in_city(&store, "Lyon", "x").unwrap().is_empty());
    assert!(top_rated_in_popular_cities(&store).unwrap().is_empty());
    assert!(top_countries_by_excellent(&store).unwrap().is_empty());
  }
}
