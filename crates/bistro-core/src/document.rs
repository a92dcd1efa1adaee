//! Restaurant document types — the unit of storage.
//!
//! One [`Restaurant`] holds the complete normalized record for a single
//! restaurant: the root attributes plus seven nested sub-records, each owned
//! exclusively by its parent document. Documents are keyed by
//! `restaurant_link`, which is unique store-wide and immutable after
//! creation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;

// ─── Sub-records ─────────────────────────────────────────────────────────────

/// Where the restaurant is. `latitude`/`longitude` are `0.0` when the source
/// cell was empty — the ingest layer never produces a partial coordinate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
  pub continent: String,
  pub country:   String,
  pub region:    String,
  pub province:  String,
  pub city:      String,
  pub address:   String,
  pub latitude:  f64,
  pub longitude: f64,
}

impl Position {
  /// Whether this document carries a usable coordinate pair.
  ///
  /// Ingestion writes `(0.0, 0.0)` for blank cells, so the origin doubles as
  /// the "no coordinates" sentinel. No real restaurant sits in the Gulf of
  /// Guinea.
  pub fn is_geotagged(&self) -> bool {
    self.latitude != 0.0 || self.longitude != 0.0
  }
}

/// TripAdvisor popularity rank strings, e.g. `"#3 of 112 Restaurants in
/// Lyon"`, plus the site's top tags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Popularity {
  pub popularity_detailed: String,
  pub popularity_generic:  String,
  pub top_tags:            Vec<String>,
}

/// Symbolic tier (e.g. `"$$ - $$$"`) plus the parsed numeric range.
/// `min_price` and `max_price` are both `None` or both `Some` after
/// ingestion; mutations may later set only the floor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Price {
  pub price_level: String,
  pub min_price:   Option<i64>,
  pub max_price:   Option<i64>,
}

/// Cuisine and dietary information. The three dietary flags are the raw
/// source strings: `"Y"`, `"N"`, or empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodInfo {
  pub meals:               Vec<String>,
  pub cuisines:            Vec<String>,
  pub special_diets:       Vec<String>,
  pub vegetarian_friendly: String,
  pub vegan_options:       String,
  pub gluten_free:         String,
}

/// Opening hours. `original_open_hours` maps a weekday name to its open
/// intervals (`"HH:MM-HH:MM"` strings); it is empty when the source cell was
/// blank. The three per-week figures are `None` when blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
  pub original_open_hours:     BTreeMap<String, Vec<String>>,
  pub open_days_per_week:      Option<f64>,
  pub open_hours_per_week:     Option<f64>,
  pub working_shifts_per_week: Option<f64>,
}

impl Schedule {
  /// Look up the interval list for a weekday, tolerating both abbreviated
  /// (`"Sat"`) and full (`"Saturday"`) key spellings in the source data.
  /// Keys in non-Latin scripts simply never match an ASCII query.
  pub fn hours_for(&self, weekday: &str) -> Option<&[String]> {
    let prefix = weekday.get(..3).unwrap_or(weekday);
    self
      .original_open_hours
      .iter()
      .find(|(day, _)| {
        day
          .get(..prefix.len())
          .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
      })
      .map(|(_, intervals)| intervals.as_slice())
  }
}

/// Review volume and language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Review {
  pub total_reviews_count:               f64,
  pub default_language:                  String,
  pub reviews_count_in_default_language: f64,
}

/// The five review-count buckets plus the four per-dimension scores.
///
/// `avg_rating` is kept equal to the count-weighted mean of the five buckets
/// by the rating-update mutation; nothing else may hand-edit it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub avg_rating: f64,
  pub excellent:  f64,
  pub very_good:  f64,
  pub average:    f64,
  pub poor:       f64,
  pub terrible:   f64,
  pub food:       f64,
  pub service:    f64,
  pub value:      f64,
  pub atmosphere: f64,
}

impl Rating {
  /// Derived ranking scalar: the sum of the four per-dimension scores.
  /// Used only for sorting; never persisted.
  pub fn weighted_rating(&self) -> f64 {
    self.food + self.atmosphere + self.value + self.service
  }

  /// The count-weighted mean of the five buckets, `0.0` when all buckets are
  /// empty.
  pub fn weighted_mean(&self) -> f64 {
    let mut total = 0.0;
    let mut count = 0.0;
    for category in RatingCategory::ALL {
      let bucket = self.count(category);
      count += bucket;
      total += bucket * category.weight();
    }
    if count == 0.0 { 0.0 } else { total / count }
  }

  pub fn count(&self, category: RatingCategory) -> f64 {
    match category {
      RatingCategory::Excellent => self.excellent,
      RatingCategory::VeryGood => self.very_good,
      RatingCategory::Average => self.average,
      RatingCategory::Poor => self.poor,
      RatingCategory::Terrible => self.terrible,
    }
  }

  pub fn count_mut(&mut self, category: RatingCategory) -> &mut f64 {
    match category {
      RatingCategory::Excellent => &mut self.excellent,
      RatingCategory::VeryGood => &mut self.very_good,
      RatingCategory::Average => &mut self.average,
      RatingCategory::Poor => &mut self.poor,
      RatingCategory::Terrible => &mut self.terrible,
    }
  }
}

// ─── Rating categories ───────────────────────────────────────────────────────

/// One of the five review buckets a new rating can land in.
///
/// The numeric weight of each bucket is fixed (5 for excellent down to 1 for
/// terrible) and drives the [`Rating::weighted_mean`] computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatingCategory {
  Excellent,
  VeryGood,
  Average,
  Poor,
  Terrible,
}

impl RatingCategory {
  pub const ALL: [RatingCategory; 5] = [
    RatingCategory::Excellent,
    RatingCategory::VeryGood,
    RatingCategory::Average,
    RatingCategory::Poor,
    RatingCategory::Terrible,
  ];

  pub fn weight(self) -> f64 {
    match self {
      RatingCategory::Excellent => 5.0,
      RatingCategory::VeryGood => 4.0,
      RatingCategory::Average => 3.0,
      RatingCategory::Poor => 2.0,
      RatingCategory::Terrible => 1.0,
    }
  }

  /// The snake_case name, matching the source CSV column headers.
  pub fn as_str(self) -> &'static str {
    match self {
      RatingCategory::Excellent => "excellent",
      RatingCategory::VeryGood => "very_good",
      RatingCategory::Average => "average",
      RatingCategory::Poor => "poor",
      RatingCategory::Terrible => "terrible",
    }
  }
}

impl std::str::FromStr for RatingCategory {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "excellent" => Ok(RatingCategory::Excellent),
      "very_good" => Ok(RatingCategory::VeryGood),
      "average" => Ok(RatingCategory::Average),
      "poor" => Ok(RatingCategory::Poor),
      "terrible" => Ok(RatingCategory::Terrible),
      other => Err(Error::UnknownRatingCategory(other.to_string())),
    }
  }
}

// ─── Root document ───────────────────────────────────────────────────────────

/// One restaurant's complete normalized record.
///
/// Created by bulk ingestion (one CSV row → one document) or direct
/// insertion; updated only through the mutation engine; never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
  /// Unique, immutable store-wide key.
  pub restaurant_link: String,
  pub restaurant_name: String,
  pub claimed:         String,
  pub awards:          Vec<String>,
  pub keywords:        Vec<String>,
  /// Feature tokens. Membership checks use set semantics; insertion order is
  /// preserved for display.
  pub features:        Vec<String>,
  /// Links of up to four same-tier, same-city restaurants, written by the
  /// peer-assignment mutation. Empty after ingestion.
  pub similar_priced:  Vec<String>,

  pub position:   Position,
  pub popularity: Popularity,
  pub price:      Price,
  pub food_info:  FoodInfo,
  pub schedule:   Schedule,
  pub review:     Review,
  pub rating:     Rating,
}

// ─── Tests ───────────────────────────────────────────────────────────────────
