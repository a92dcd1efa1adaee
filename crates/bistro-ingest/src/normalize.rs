//! Row → document normalization.
//!
//! The parsing rules mirror the source dataset exactly:
//!
//! - list cells split on `,` (the space-bearing variants — features,
//!   top_tags, meals, cuisines — have embedded spaces stripped first);
//! - `continent` is the text before the first comma of `original_location`
//!   after removing `[` and `"`;
//! - `price_range` drops commas, maps the Swiss-franc NBSP marker to `$`,
//!   then parses `$MIN-$MAX` (both null when the cell is empty);
//! - `original_open_hours` is an embedded JSON object;
//! - numeric cells default to `0` when empty, except the three per-week
//!   schedule figures, which default to null.

use std::collections::BTreeMap;

use bistro_core::document::{
  FoodInfo, Popularity, Position, Price, Rating, Restaurant, Review, Schedule,
};

use crate::{
  HeaderMap,
  error::{Error, Result},
};

// ─── Cell access ─────────────────────────────────────────────────────────────

struct Row<'a> {
  headers: &'a HeaderMap,
  cells:   &'a [String],
}

impl<'a> Row<'a> {
  fn cell(&self, column: &'static str) -> Result<&'a str> {
    let index = self.headers.index(column)?;
    self
      .cells
      .get(index)
      .map(String::as_str)
      .ok_or(Error::MissingCell { column, index })
  }

  fn string(&self, column: &'static str) -> Result<String> {
    Ok(self.cell(column)?.to_string())
  }

  /// Split on `,` after stripping every embedded space.
  fn list_stripped(&self, column: &'static str) -> Result<Vec<String>> {
    let cell = self.cell(column)?;
    if cell.is_empty() {
      return Ok(Vec::new());
    }
    Ok(cell.replace(' ', "").split(',').map(str::to_string).collect())
  }

  /// Split on `,`, trimming each element but keeping interior spaces.
  fn list(&self, column: &'static str) -> Result<Vec<String>> {
    let cell = self.cell(column)?;
    if cell.is_empty() {
      return Ok(Vec::new());
    }
    Ok(cell.split(',').map(|item| item.trim().to_string()).collect())
  }

  /// Empty cell → `0.0`; anything unparseable is a normalization failure.
  fn num_or_zero(&self, column: &'static str) -> Result<f64> {
    let cell = self.cell(column)?;
    if cell.is_empty() {
      return Ok(0.0);
    }
    cell.parse().map_err(|_| Error::InvalidNumber {
      column,
      value: cell.to_string(),
    })
  }

  /// Empty cell → null.
  fn num_opt(&self, column: &'static str) -> Result<Option<f64>> {
    let cell = self.cell(column)?;
    if cell.is_empty() {
      return Ok(None);
    }
    cell
      .parse()
      .map(Some)
      .map_err(|_| Error::InvalidNumber { column, value: cell.to_string() })
  }
}

// ─── Field-specific parsers ──────────────────────────────────────────────────

/// `original_location` looks like `["Europe", "France", ..., "Lyon"]`; the
/// continent is the first element after stripping `[` and `"`.
fn continent_of(original_location: &str) -> String {
  let cleaned: String = original_location
    .chars()
    .filter(|&c| c != '[' && c != '"')
    .collect();
  cleaned.split(',').next().unwrap_or("").to_string()
}

/// Parse `price_range` into `(min, max)`.
///
/// Commas are removed (`"$2,000"`), the Swiss-franc marker `CHF\u{a0}` is
/// mapped to `$`, and the leading currency symbol of each half is dropped.
/// An empty cell yields `(None, None)`; a missing separator, an unparseable
/// half, or an inverted range is malformed.
fn parse_price_range(raw: &str) -> Result<(Option<i64>, Option<i64>)> {
  let cleaned = raw.replace(',', "").replace("CHF\u{a0}", "$");
  if cleaned.is_empty() {
    return Ok((None, None));
  }
  let malformed = || Error::MalformedPriceRange(raw.to_string());
  let (low, high) = cleaned.split_once('-').ok_or_else(malformed)?;
  let min = parse_price_half(low).ok_or_else(malformed)?;
  let max = parse_price_half(high).ok_or_else(malformed)?;
  if min > max {
    return Err(malformed());
  }
  Ok((Some(min), Some(max)))
}

/// Drop the one-character currency symbol, parse the rest as an integer.
fn parse_price_half(half: &str) -> Option<i64> {
  let mut chars = half.chars();
  chars.next()?;
  chars.as_str().parse().ok()
}

fn parse_open_hours(cell: &str) -> Result<BTreeMap<String, Vec<String>>> {
  if cell.is_empty() {
    return Ok(BTreeMap::new());
  }
  Ok(serde_json::from_str(cell)?)
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Normalize one data row into a [`Restaurant`] document.
pub fn normalize_row(
  headers: &HeaderMap,
  cells: &[String],
) -> Result<Restaurant> {
  let row = Row { headers, cells };

  let restaurant_link = row.string("restaurant_link")?;
  if restaurant_link.is_empty() {
    return Err(Error::MissingKey);
  }

  let position = Position {
    continent: continent_of(row.cell("original_location")?),
    country:   row.string("country")?,
    region:    row.string("region")?,
    province:  row.string("province")?,
    city:      row.string("city")?,
    address:   row.string("address")?,
    latitude:  row.num_or_zero("latitude")?,
    longitude: row.num_or_zero("longitude")?,
  };

  let popularity = Popularity {
    popularity_detailed: row.string("popularity_detailed")?,
    popularity_generic:  row.string("popularity_generic")?,
    top_tags:            row.list_stripped("top_tags")?,
  };

  let (min_price, max_price) = parse_price_range(row.cell("price_range")?)?;
  let price = Price {
    price_level: row.string("price_level")?,
    min_price,
    max_price,
  };

  let food_info = FoodInfo {
    meals:               row.list_stripped("meals")?,
    cuisines:            row.list_stripped("cuisines")?,
    special_diets:       row.list("special_diets")?,
    vegetarian_friendly: row.string("vegetarian_friendly")?,
    vegan_options:       row.string("vegan_options")?,
    gluten_free:         row.string("gluten_free")?,
  };

  let schedule = Schedule {
    original_open_hours:     parse_open_hours(row.cell("original_open_hours")?)?,
    open_days_per_week:      row.num_opt("open_days_per_week")?,
    open_hours_per_week:     row.num_opt("open_hours_per_week")?,
    working_shifts_per_week: row.num_opt("working_shifts_per_week")?,
  };

  let review = Review {
    total_reviews_count:               row.num_or_zero("total_reviews_count")?,
    default_language:                  row.string("default_language")?,
    reviews_count_in_default_language: row
      .num_or_zero("reviews_count_in_default_language")?,
  };

  let rating = Rating {
    avg_rating: row.num_or_zero("avg_rating")?,
    excellent:  row.num_or_zero("excellent")?,
    very_good:  row.num_or_zero("very_good")?,
    average:    row.num_or_zero("average")?,
    poor:       row.num_or_zero("poor")?,
    terrible:   row.num_or_zero("terrible")?,
    food:       row.num_or_zero("food")?,
    service:    row.num_or_zero("service")?,
    value:      row.num_or_zero("value")?,
    atmosphere: row.num_or_zero("atmosphere")?,
  };

  Ok(Restaurant {
    restaurant_link,
    restaurant_name: row.string("restaurant_name")?,
    claimed: row.string("claimed")?,
    awards: row.list("awards")?,
    keywords: row.list("keywords")?,
    features: row.list_stripped("features")?,
    similar_priced: Vec::new(),
    position,
    popularity,
    price,
    food_info,
    schedule,
    review,
    rating,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
