//! Core types and trait definitions for the Bistro restaurant store.
//!
//! This crate is deliberately free of I/O and backend dependencies.
//! All other crates depend on it; it depends on nothing in-workspace.

pub mod document;
pub mod error;
pub mod filter;
pub mod store;

pub use error::{Error, Result};
