//! SQLite backend for the Procura tender/bid store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Every mutation is a single
//! `BEGIN IMMEDIATE` transaction.

mod decision;
mod directory;
mod encode;
mod query;
mod schema;
mod store;
mod versioned;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
