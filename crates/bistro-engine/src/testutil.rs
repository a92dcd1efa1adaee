//! Shared fixtures for the engine tests.

use bistro_core::{document::Restaurant, store::RestaurantStore};
use bistro_store_memory::MemoryStore;

/// A default document placed in `city`/`country`.
pub fn doc_in(link: &str, city: &str, country: &str) -> Restaurant {
  let mut doc = Restaurant {
    restaurant_link: link.to_string(),
    restaurant_name: format!("Restaurant {link}"),
    ..Restaurant::default()
  };
  doc.position.city = city.to_string();
  doc.position.country = country.to_string();
  doc
}

pub fn store_with(docs: Vec<Restaurant>) -> MemoryStore {
  let store = MemoryStore::new();
  store.insert_many(docs).expect("seeding test store");
  store
}
