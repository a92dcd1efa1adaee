//! Typed filter expressions evaluated against [`Restaurant`] documents.
//!
//! Queries are built as a tree of tagged variants (equality, numeric range,
//! set membership, regex, existence, conjunction) and evaluated by a single
//! interpreter, [`Filter::matches`]. Backends are free to inspect the tree
//! for index planning; the interpreter is the semantic ground truth.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Result, document::Restaurant};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// Every document field a filter can address, root and nested alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
  // Root
  RestaurantLink,
  RestaurantName,
  Claimed,
  Awards,
  Keywords,
  Features,
  // Position
  Continent,
  Country,
  Region,
  Province,
  City,
  Address,
  Latitude,
  Longitude,
  // Popularity
  PopularityDetailed,
  PopularityGeneric,
  TopTags,
  // Price
  PriceLevel,
  MinPrice,
  MaxPrice,
  // FoodInfo
  Meals,
  Cuisines,
  SpecialDiets,
  VegetarianFriendly,
  VeganOptions,
  GlutenFree,
  // Schedule
  SaturdayHours,
  SundayHours,
  OpenDaysPerWeek,
  OpenHoursPerWeek,
  WorkingShiftsPerWeek,
  // Review
  TotalReviewsCount,
  DefaultLanguage,
  // Rating
  AvgRating,
  Excellent,
  VeryGood,
  Average,
  Poor,
  Terrible,
}

/// A borrowed view of one field's value. `Field::get` returns `None` when
/// the field is null for this document, which is what `Exists` tests.
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
  Str(&'a str),
  Num(f64),
  List(&'a [String]),
}

impl Field {
  pub fn get<'a>(self, doc: &'a Restaurant) -> Option<FieldRef<'a>> {
    use FieldRef::{List, Num, Str};
    match self {
      Field::RestaurantLink => Some(Str(&doc.restaurant_link)),
      Field::RestaurantName => Some(Str(&doc.restaurant_name)),
      Field::Claimed => Some(Str(&doc.claimed)),
      Field::Awards => Some(List(&doc.awards)),
      Field::Keywords => Some(List(&doc.keywords)),
      Field::Features => Some(List(&doc.features)),

      Field::Continent => Some(Str(&doc.position.continent)),
      Field::Country => Some(Str(&doc.position.country)),
      Field::Region => Some(Str(&doc.position.region)),
      Field::Province => Some(Str(&doc.position.province)),
      Field::City => Some(Str(&doc.position.city)),
      Field::Address => Some(Str(&doc.position.address)),
      Field::Latitude => Some(Num(doc.position.latitude)),
      Field::Longitude => Some(Num(doc.position.longitude)),

      Field::PopularityDetailed => Some(Str(&doc.popularity.popularity_detailed)),
      Field::PopularityGeneric => Some(Str(&doc.popularity.popularity_generic)),
      Field::TopTags => Some(List(&doc.popularity.top_tags)),

      Field::PriceLevel => Some(Str(&doc.price.price_level)),
      Field::MinPrice => doc.price.min_price.map(|p| Num(p as f64)),
      Field::MaxPrice => doc.price.max_price.map(|p| Num(p as f64)),

      Field::Meals => Some(List(&doc.food_info.meals)),
      Field::Cuisines => Some(List(&doc.food_info.cuisines)),
      Field::SpecialDiets => Some(List(&doc.food_info.special_diets)),
      Field::VegetarianFriendly => Some(Str(&doc.food_info.vegetarian_friendly)),
      Field::VeganOptions => Some(Str(&doc.food_info.vegan_options)),
      Field::GlutenFree => Some(Str(&doc.food_info.gluten_free)),

      Field::SaturdayHours => doc.schedule.hours_for("Sat").map(List),
      Field::SundayHours => doc.schedule.hours_for("Sun").map(List),
      Field::OpenDaysPerWeek => doc.schedule.open_days_per_week.map(Num),
      Field::OpenHoursPerWeek => doc.schedule.open_hours_per_week.map(Num),
      Field::WorkingShiftsPerWeek => {
        doc.schedule.working_shifts_per_week.map(Num)
      }

      Field::TotalReviewsCount => Some(Num(doc.review.total_reviews_count)),
      Field::DefaultLanguage => Some(Str(&doc.review.default_language)),

      Field::AvgRating => Some(Num(doc.rating.avg_rating)),
      Field::Excellent => Some(Num(doc.rating.excellent)),
      Field::VeryGood => Some(Num(doc.rating.very_good)),
      Field::Average => Some(Num(doc.rating.average)),
      Field::Poor => Some(Num(doc.rating.poor)),
      Field::Terrible => Some(Num(doc.rating.terrible)),
    }
  }
}

// ─── Literals ────────────────────────────────────────────────────────────────

/// A comparison operand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Literal {
  Str(String),
  Num(f64),
}

impl From<&str> for Literal {
  fn from(s: &str) -> Self {
    Literal::Str(s.to_string())
  }
}

impl From<f64> for Literal {
  fn from(n: f64) -> Self {
    Literal::Num(n)
  }
}

// ─── Filter tree ─────────────────────────────────────────────────────────────

/// A composable predicate over documents.
///
/// List-valued fields follow document-database semantics: `Equals` tests
/// element membership, `In` and `Regex` match if any element does.
#[derive(Debug, Clone)]
pub enum Filter {
  Equals(Field, Literal),
  /// Inclusive numeric range; either bound may be open.
  Range {
    field: Field,
    min:   Option<f64>,
    max:   Option<f64>,
  },
  In(Field, Vec<String>),
  Regex(Field, Regex),
  /// Field is present and non-null on the document.
  Exists(Field),
  /// Conjunction. The empty conjunction matches every document.
  And(Vec<Filter>),
}

impl Filter {
  /// Matches every document.
  pub fn all() -> Filter {
    Filter::And(Vec::new())
  }

  /// Case-sensitive substring match on `field`, metacharacters escaped.
  pub fn contains(field: Field, token: &str) -> Result<Filter> {
    let pattern = Regex::new(&format!(".*{}.*", regex::escape(token)))?;
    Ok(Filter::Regex(field, pattern))
  }

  pub fn ge(field: Field, min: f64) -> Filter {
    Filter::Range { field, min: Some(min), max: None }
  }

  pub fn le(field: Field, max: f64) -> Filter {
    Filter::Range { field, min: None, max: Some(max) }
  }

  /// Evaluate this filter against one document.
  pub fn matches(&self, doc: &Restaurant) -> bool {
    match self {
      Filter::Equals(field, literal) => match (field.get(doc), literal) {
        (Some(FieldRef::Str(s)), Literal::Str(want)) => s == want,
        (Some(FieldRef::Num(n)), Literal::Num(want)) => n == *want,
        (Some(FieldRef::List(items)), Literal::Str(want)) => {
          items.iter().any(|item| item == want)
        }
        _ => false,
      },

      Filter::Range { field, min, max } => match field.get(doc) {
        Some(FieldRef::Num(n)) => {
          min.is_none_or(|lo| n >= lo) && max.is_none_or(|hi| n <= hi)
        }
        _ => false,
      },

      Filter::In(field, wanted) => match field.get(doc) {
        Some(FieldRef::Str(s)) => wanted.iter().any(|w| w == s),
        Some(FieldRef::List(items)) => {
          items.iter().any(|item| wanted.iter().any(|w| w == item))
        }
        _ => false,
      },

      Filter::Regex(field, pattern) => match field.get(doc) {
        Some(FieldRef::Str(s)) => pattern.is_match(s),
        Some(FieldRef::List(items)) => {
          items.iter().any(|item| pattern.is_match(item))
        }
        _ => false,
      },

      Filter::Exists(field) => field.get(doc).is_some(),

      Filter::And(clauses) => clauses.iter().all(|c| c.matches(doc)),
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn doc() -> Restaurant {
    let mut doc = Restaurant {
      restaurant_link: "g1-d1".to_string(),
      restaurant_name: "Chez Test".to_string(),
      features: vec!["Seating".to_string(), "Wheelchair Accessible".to_string()],
      ..Restaurant::default()
    };
    doc.position.city = "Lyon".to_string();
    doc.position.country = "France".to_string();
    doc.price.min_price = Some(10);
    doc.schedule.open_days_per_week = Some(7.0);
    doc
  }

  #[test]
  fn equals_on_scalar_and_list_fields() {
    let doc = doc();
    assert!(Filter::Equals(Field::City, "Lyon".into()).matches(&doc));
    assert!(!Filter::Equals(Field::City, "Paris".into()).matches(&doc));
    // Equality on a list field is membership.
    assert!(Filter::Equals(Field::Features, "Seating".into()).matches(&doc));
    assert!(!Filter::Equals(Field::Features, "Seat".into()).matches(&doc));
  }

  #[test]
  fn range_bounds_are_inclusive() {
    let doc = doc();
    assert!(Filter::ge(Field::MinPrice, 10.0).matches(&doc));
    assert!(!Filter::ge(Field::MinPrice, 10.5).matches(&doc));
    assert!(Filter::le(Field::MinPrice, 10.0).matches(&doc));
  }

  #[test]
  fn range_on_null_field_never_matches() {
    let doc = doc();
    assert!(!Filter::ge(Field::MaxPrice, 0.0).matches(&doc));
  }

  #[test]
  fn in_matches_scalar_membership() {
    let doc = doc();
    let cities = vec!["Paris".to_string(), "Lyon".to_string()];
    assert!(Filter::In(Field::City, cities).matches(&doc));
    assert!(!Filter::In(Field::City, vec!["Paris".to_string()]).matches(&doc));
  }

  #[test]
  fn regex_matches_any_list_element() {
    let doc = doc();
    let filter = Filter::contains(Field::Features, "chair").unwrap();
    assert!(filter.matches(&doc));
    let filter = Filter::contains(Field::Features, "Parking").unwrap();
    assert!(!filter.matches(&doc));
  }

  #[test]
  fn contains_escapes_metacharacters() {
    let mut doc = doc();
    doc.features.push("A+B".to_string());
    assert!(Filter::contains(Field::Features, "A+B").unwrap().matches(&doc));
    assert!(!Filter::contains(Field::Features, "AAB").unwrap().matches(&doc));
  }

  #[test]
  fn exists_tracks_nullable_fields() {
    let doc = doc();
    assert!(Filter::Exists(Field::MinPrice).matches(&doc));
    assert!(!Filter::Exists(Field::MaxPrice).matches(&doc));
    assert!(!Filter::Exists(Field::SaturdayHours).matches(&doc));
  }

  #[test]
  fn empty_conjunction_matches_everything() {
    assert!(Filter::all().matches(&doc()));
  }

  #[test]
  fn conjunction_requires_all_clauses() {
    let doc = doc();
    let filter = Filter::And(vec![
      Filter::Equals(Field::City, "Lyon".into()),
      Filter::Equals(Field::Country, "France".into()),
      Filter::ge(Field::OpenDaysPerWeek, 7.0),
    ]);
    assert!(filter.matches(&doc));
    let filter = Filter::And(vec![
      Filter::Equals(Field::City, "Lyon".into()),
      Filter::Equals(Field::Country, "Italy".into()),
    ]);
    assert!(!filter.matches(&doc));
  }
}
