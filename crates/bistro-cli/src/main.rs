//! `bistro` — load a restaurant CSV export and run queries and mutations
//! against the in-memory store.
//!
//! # Usage
//!
//! ```
//! bistro --data restaurants.csv popular-in-city Lyon
//! bistro --data restaurants.csv --json top-countries
//! BISTRO_DATA=restaurants.csv bistro closest-triple --seed 7
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use bistro_core::{document::Restaurant, store::RestaurantStore};
use bistro_engine::{geo, mutation, query};
use bistro_store_memory::MemoryStore;
use clap::{Parser, Subcommand};
use rand::{Rng as _, SeedableRng as _, rngs::StdRng};
use serde_json::json;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "bistro", about = "Restaurant dataset query tool")]
struct Cli {
  /// Path to the restaurant CSV export.
  #[arg(long, env = "BISTRO_DATA", value_name = "FILE")]
  data: PathBuf,

  /// Print results as JSON instead of the plain listing.
  #[arg(long)]
  json: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Restaurants in a city carrying the given feature token.
  FeatureInCity { city: String, feature: String },

  /// The three most popular restaurants of a city (single-digit generic
  /// rank).
  PopularInCity { city: String },

  /// Vegetarian-friendly, gluten-free restaurants across the given cities.
  VeganGlutenFree { cities: Vec<String> },

  /// Top ten restaurants of a country by recomputed weighted rating.
  WeightedRating { country: String },

  /// English-reviewed restaurants open every day inside a price band.
  EnglishAlwaysOpen {
    #[arg(long, default_value_t = 7.0)]
    open_days:   f64,
    #[arg(long, default_value_t = 100.0)]
    min_reviews: f64,
    #[arg(long, default_value_t = 10.0)]
    min_price:   f64,
    #[arg(long, default_value_t = 100.0)]
    max_price:   f64,
  },

  /// The priciest restaurant of each country within a price tier.
  MostExpensive {
    #[arg(long, default_value = "$$$$")]
    price_level: String,
  },

  /// Top ten restaurants across the five most-represented cities.
  TopRated,

  /// Five countries with the highest average excellent-review count.
  TopCountries,

  /// Restaurants within a radius of a point (degree space by default).
  WithinRadius {
    #[arg(long)]
    lat:    f64,
    #[arg(long)]
    lon:    f64,
    #[arg(long)]
    radius: f64,
    /// Interpret the radius as meters along the great circle.
    #[arg(long)]
    meters: bool,
  },

  /// The closest trio of restaurants in a randomly sampled city.
  ClosestTriple {
    /// Seed for the city sample; random when omitted.
    #[arg(long)]
    seed: Option<u64>,
  },

  /// Record one review in a rating category for a restaurant.
  RecordRating { link: String, category: String },

  /// Add a feature token to a restaurant (no-op when already present).
  AddFeature { link: String, feature: String },

  /// Raise the minimum price of matching restaurants in a city.
  PriceIncrease {
    #[arg(long)]
    city:          String,
    #[arg(long = "feature")]
    features:      Vec<String>,
    /// One or more cuisines; a document qualifies if it serves any of them.
    #[arg(long = "cuisine", required = true)]
    cuisines:      Vec<String>,
    #[arg(long, default_value_t = 6.0)]
    min_open_days: f64,
    #[arg(long)]
    floor:         i64,
    #[arg(long)]
    delta:         i64,
  },

  /// Tag every restaurant open on both weekend days.
  TagWeekends,

  /// Link same-tier restaurants of a city as similar-priced peers.
  AssignSimilarPriced { city: String },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let store = load_store(&cli.data)?;

  match cli.command {
    Command::FeatureInCity { city, feature } => {
      print_docs(&query::feature_in_city(&store, &city, &feature)?, cli.json)
    }
    Command::PopularInCity { city } => {
      print_docs(&query::popular_in_city(&store, &city)?, cli.json)
    }
    Command::VeganGlutenFree { cities } => {
      print_docs(&query::vegan_gluten_free_in_cities(&store, &cities)?, cli.json)
    }
    Command::WeightedRating { country } => {
      let ranked = query::weighted_rating_by_country(&store, &country)?;
      if cli.json {
        println!("{}", serde_json::to_string_pretty(&ranked)?);
      } else {
        for row in &ranked {
          println!(
            "{:.1}  {}  {}",
            row.weighted_rating, row.restaurant_link, row.restaurant_name
          );
        }
      }
      Ok(())
    }
    Command::EnglishAlwaysOpen {
      open_days,
      min_reviews,
      min_price,
      max_price,
    } => print_docs(
      &query::english_always_open(
        &store,
        open_days,
        min_reviews,
        min_price,
        max_price,
      )?,
      cli.json,
    ),
    Command::MostExpensive { price_level } => {
      print_docs(&query::most_expensive_per_country(&store, &price_level)?, cli.json)
    }
    Command::TopRated => {
      print_docs(&query::top_rated_in_popular_cities(&store)?, cli.json)
    }
    Command::TopCountries => {
      let rows = query::top_countries_by_excellent(&store)?;
      if cli.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
      } else {
        for row in &rows {
          println!("{:>6}  {}", row.display_value(), row.country);
        }
      }
      Ok(())
    }
    Command::WithinRadius {
      lat,
      lon,
      radius,
      meters,
    } => {
      let docs = if meters {
        geo::within_radius_meters(&store, lat, lon, radius)?
      } else {
        geo::within_radius_degrees(&store, lat, lon, radius)?
      };
      print_docs(&docs, cli.json)
    }
    Command::ClosestTriple { seed } => {
      let seed = seed.unwrap_or_else(|| rand::rng().random());
      tracing::debug!(seed, "sampling city");
      let mut rng = StdRng::seed_from_u64(seed);
      let triple = geo::closest_triple(&store, &mut rng)?;
      if cli.json {
        println!("{}", serde_json::to_string_pretty(&triple)?);
      } else {
        println!("city: {}", triple.city);
        for name in &triple.restaurant_names {
          println!("  {name}");
        }
        println!("total distance: {:.0} m", triple.total_distance_m);
      }
      Ok(())
    }
    Command::RecordRating { link, category } => {
      let category = category
        .parse()
        .with_context(|| format!("invalid rating category {category:?}"))?;
      mutation::record_rating(&store, &link, category)?;
      print_updated(&store, &link, cli.json)
    }
    Command::AddFeature { link, feature } => {
      mutation::add_feature(&store, &link, &feature)?;
      print_updated(&store, &link, cli.json)
    }
    Command::PriceIncrease {
      city,
      features,
      cuisines,
      min_open_days,
      floor,
      delta,
    } => {
      let scope = mutation::PriceIncreaseScope {
        city,
        required_features: features,
        cuisines,
        min_open_days,
      };
      let updated =
        mutation::conditional_price_increase(&store, &scope, floor, delta)?;
      print_count(updated, cli.json)
    }
    Command::TagWeekends => {
      let updated = mutation::tag_weekend_availability(&store)?;
      print_count(updated, cli.json)
    }
    Command::AssignSimilarPriced { city } => {
      let updated = mutation::assign_similar_priced(&store, &city)?;
      print_count(updated, cli.json)
    }
  }
}

// ─── CSV loading ──────────────────────────────────────────────────────────────

/// Read the CSV export and bulk-load it into a fresh in-memory store.
fn load_store(path: &PathBuf) -> anyhow::Result<MemoryStore> {
  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .from_path(path)
    .with_context(|| format!("opening {}", path.display()))?;

  let header: Vec<String> = reader
    .headers()
    .context("reading CSV header")?
    .iter()
    .map(str::to_string)
    .collect();
  let headers = bistro_ingest::HeaderMap::from_row(&header);

  let mut rows = Vec::new();
  for record in reader.records() {
    let record = record.context("reading CSV row")?;
    rows.push(record.iter().map(str::to_string).collect());
  }

  let docs = bistro_ingest::normalize_rows(&headers, &rows)?;
  let store = MemoryStore::new();
  let loaded = store.insert_many(docs)?;
  tracing::info!(loaded, path = %path.display(), "dataset loaded");
  Ok(store)
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_docs(docs: &[Restaurant], as_json: bool) -> anyhow::Result<()> {
  if as_json {
    println!("{}", serde_json::to_string_pretty(docs)?);
  } else {
    for doc in docs {
      println!("{}  {}", doc.restaurant_link, doc.restaurant_name);
    }
    println!("({} results)", docs.len());
  }
  Ok(())
}

fn print_updated(
  store: &MemoryStore,
  link: &str,
  as_json: bool,
) -> anyhow::Result<()> {
  match store.get(link)? {
    Some(doc) if as_json => println!("{}", serde_json::to_string_pretty(&doc)?),
    Some(doc) => println!("updated {}  {}", doc.restaurant_link, doc.restaurant_name),
    None => println!("no restaurant with link {link}"),
  }
  Ok(())
}

fn print_count(updated: usize, as_json: bool) -> anyhow::Result<()> {
  if as_json {
    println!("{}", json!({ "updated": updated }));
  } else {
    println!("updated {updated} documents");
  }
  Ok(())
}
