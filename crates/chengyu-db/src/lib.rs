//! Chengyu DB - persistent repository layer using native_db
//!
//! Stores sessions, score records, leaderboard rows, achievements, hint
//! usage, and no-repeat history. `Store` implements every repository trait
//! from `chengyu-engine`, so wiring persistence is
//! `Repos::from_store(Arc::new(Store::open(path)?))`.

mod error;
mod models;
mod repos;
mod store;

pub use error::{Error, Result};
pub use store::Store;
