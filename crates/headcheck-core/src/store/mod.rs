//! Persistent item database (SQLite via sqlx).
//!
//! Stores every tracked item (hash, URL), its check state, and the headers
//! recorded by the last successful probe. The pipeline only talks to it
//! through the `ItemStore` trait.

mod db;
mod items;
mod query;
mod types;

pub use db::ItemDb;
pub use query::{next_eligible, EligibleQuery, ItemStore};
pub use types::{ItemRecord, StateCounts};

#[cfg(test)]
pub(crate) use db::open_memory;
