//! The named-operation surface over a
//! [`RestaurantStore`](bistro_core::store::RestaurantStore): analytical
//! queries, geo search, and batched mutations.
//!
//! Every operation is a free function generic over the store backend, so
//! tests run against `bistro-store-memory` and callers can substitute their
//! own implementation.

pub mod error;
pub mod geo;
pub mod mutation;
pub mod query;

#[cfg(test)]
mod testutil;

pub use error::{Error, Result};
