//! In-memory [`RestaurantStore`](bistro_core::store::RestaurantStore)
//! backend with secondary indexes on city and country.

mod error;
mod store;


pub use crate::{
  error::{Error, Result},
  store::MemoryStore,
};
