//! Geo operations: radius search and the closest-triple search.
//!
//! The original system measured the radius search in raw coordinate
//! degrees. That behaviour is kept as [`within_radius_degrees`] (the
//! default); [`within_radius_meters`] is the great-circle variant for
//! callers who want real distances. The two are separate operations so the
//! unit mismatch is explicit rather than silent.

use std::collections::BTreeMap;

use rand::Rng;
use serde::Serialize;

use bistro_core::{document::Restaurant, store::RestaurantStore};

use crate::error::{Error, Result};

/// Radius-search result cap, inherited from the original system.
const RADIUS_LIMIT: usize = 10;

/// Closest-triple city bounds. The search is cubic in city size, so the
/// upper bound must hold before the triple loop runs.
const MIN_CITY_SIZE: usize = 10;
const MAX_CITY_SIZE: usize = 100;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

// ─── Distance metrics ────────────────────────────────────────────────────────

/// Straight-line distance in degree space. Not a physical distance; one
/// degree of latitude is ~111 km while a degree of longitude shrinks with
/// latitude.
fn degree_distance(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
  ((lat_a - lat_b).powi(2) + (lon_a - lon_b).powi(2)).sqrt()
}

/// Great-circle distance in meters (haversine).
fn haversine_m(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
  let d_lat = (lat_b - lat_a).to_radians();
  let d_lon = (lon_b - lon_a).to_radians();
  let a = (d_lat / 2.0).sin().powi(2)
    + lat_a.to_radians().cos()
      * lat_b.to_radians().cos()
      * (d_lon / 2.0).sin().powi(2);
  2.0 * EARTH_RADIUS_M * a.sqrt().asin()
}

// ─── Radius search ───────────────────────────────────────────────────────────

fn within_radius<S, D>(store: &S, max: f64, distance: D) -> Result<Vec<Restaurant>>
where
  S: RestaurantStore,
  D: Fn(&Restaurant) -> f64,
{
  let mut hits = Vec::new();
  store
    .for_each(&mut |doc| {
      if hits.len() < RADIUS_LIMIT && distance(doc) <= max {
        hits.push(doc.clone());
      }
    })
    .map_err(Error::store)?;
  Ok(hits)
}

/// Up to 10 restaurants within `max_degrees` of `(lat, lon)` in Euclidean
/// degree space — the original system's default behaviour.
pub fn within_radius_degrees<S: RestaurantStore>(
  store: &S,
  lat: f64,
  lon: f64,
  max_degrees: f64,
) -> Result<Vec<Restaurant>> {
  within_radius(store, max_degrees, |doc| {
    degree_distance(lat, lon, doc.position.latitude, doc.position.longitude)
  })
}

/// Up to 10 restaurants within `max_meters` great-circle distance of
/// `(lat, lon)`.
pub fn within_radius_meters<S: RestaurantStore>(
  store: &S,
  lat: f64,
  lon: f64,
  max_meters: f64,
) -> Result<Vec<Restaurant>> {
  within_radius(store, max_meters, |doc| {
    haversine_m(lat, lon, doc.position.latitude, doc.position.longitude)
  })
}

// ─── Closest triple ──────────────────────────────────────────────────────────

/// The three restaurants of one sampled city minimizing the sum of their
/// pairwise great-circle distances.
#[derive(Debug, Clone, Serialize)]
pub struct ClosestTriple {
  pub city:             String,
  pub restaurant_names: [String; 3],
  /// Sum of the three pairwise distances, in meters.
  pub total_distance_m: f64,
}

struct GeoDoc {
  name:   String,
  lat:    f64,
  lon:    f64,
  tagged: bool,
}

/// Sample one city holding 10–100 restaurants uniformly at random, then find
/// the triple of geo-tagged restaurants there with the smallest summed
/// pairwise distance.
///
/// Fails with [`Error::NotFound`] when no city qualifies or the sampled city
/// has fewer than three geo-tagged restaurants. The caller supplies the RNG
/// so tests can seed it.
pub fn closest_triple<S, R>(store: &S, rng: &mut R) -> Result<ClosestTriple>
where
  S: RestaurantStore,
  R: Rng,
{
  let mut cities: BTreeMap<String, Vec<GeoDoc>> = BTreeMap::new();
  store
    .for_each(&mut |doc| {
      if doc.position.city.is_empty() {
        return;
      }
      cities.entry(doc.position.city.clone()).or_default().push(GeoDoc {
        name:   doc.restaurant_name.clone(),
        lat:    doc.position.latitude,
        lon:    doc.position.longitude,
        tagged: doc.position.is_geotagged(),
      });
    })
    .map_err(Error::store)?;

  let qualifying: Vec<&String> = cities
    .iter()
    .filter(|(_, docs)| (MIN_CITY_SIZE..=MAX_CITY_SIZE).contains(&docs.len()))
    .map(|(city, _)| city)
    .collect();
  if qualifying.is_empty() {
    return Err(Error::NotFound(format!(
      "no city with {MIN_CITY_SIZE} to {MAX_CITY_SIZE} restaurants"
    )));
  }
  let city = qualifying[rng.random_range(0..qualifying.len())].clone();

  let pool: Vec<&GeoDoc> =
    cities[&city].iter().filter(|doc| doc.tagged).collect();
  if pool.len() < 3 {
    return Err(Error::NotFound(format!(
      "city {city:?} has fewer than 3 geo-tagged restaurants"
    )));
  }
  // The sampling filter bounds the pool; re-check before the cubic loop.
  if pool.len() > MAX_CITY_SIZE {
    return Err(Error::Validation(format!(
      "geo pool for {city:?} exceeds {MAX_CITY_SIZE} restaurants"
    )));
  }

  let mut best: Option<([usize; 3], f64)> = None;
  for i in 0..pool.len() {
    for j in (i + 1)..pool.len() {
      let d_ij = haversine_m(pool[i].lat, pool[i].lon, pool[j].lat, pool[j].lon);
      for k in (j + 1)..pool.len() {
        let total = d_ij
          + haversine_m(pool[i].lat, pool[i].lon, pool[k].lat, pool[k].lon)
          + haversine_m(pool[j].lat, pool[j].lon, pool[k].lat, pool[k].lon);
        if best.is_none_or(|(_, best_total)| total < best_total) {
          best = Some(([i, j, k], total));
        }
      }
    }
  }

  let Some(([i, j, k], total_distance_m)) = best else {
    return Err(Error::NotFound(format!("no triple found in {city:?}")));
  };
  tracing::debug!(%city, total_distance_m, "closest triple found");
  Ok(ClosestTriple {
    city,
    restaurant_names: [
      pool[i].name.clone(),
      pool[j].name.clone(),
      pool[k].name.clone(),
    ],
    total_distance_m,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
