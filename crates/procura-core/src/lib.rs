//! Core types and trait definitions for the Procura tender/bid store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::ProcurementStore`]; the orchestration
//! layer combines it with [`access`] checks and an
//! [`employee::EmployeeDirectory`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod access;
pub mod bid;
pub mod employee;
pub mod error;
pub mod quorum;
pub mod store;
pub mod tender;

pub use error::{Error, Result};

/// Page size used by list operations when the caller gives none (or zero).
pub const DEFAULT_LIMIT: u32 = 5;
