//! JSON REST API for Procura.
//!
//! Exposes an axum [`Router`] backed by any store implementing both
//! [`ProcurementStore`] and [`EmployeeDirectory`]. This is the
//! orchestration layer: it resolves the acting employee, applies the
//! [`procura_core::access`] predicates and maps the error taxonomy onto
//! HTTP statuses. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", procura_api::api_router(store.clone()))
//! ```

pub mod bids;
pub mod caller;
pub mod error;
pub mod tenders;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use procura_core::{employee::EmployeeDirectory, store::ProcurementStore};
use serde::Deserialize;

pub use caller::Caller;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: ProcurementStore + EmployeeDirectory + 'static,
  <S as ProcurementStore>::Error: Into<procura_core::Error>,
  <S as EmployeeDirectory>::Error: Into<procura_core::Error>,
{
  Router::new()
    .route("/ping", get(ping))
    // Tenders
    .route("/tenders", get(tenders::list::<S>))
    .route("/tenders/my", get(tenders::mine::<S>))
    .route("/tenders/new", post(tenders::create::<S>))
    .route(
      "/tenders/{id}/status",
      get(tenders::status::<S>).put(tenders::set_status::<S>),
    )
    .route("/tenders/{id}/edit", patch(tenders::edit::<S>))
    .route("/tenders/{id}/rollback/{version}", put(tenders::rollback::<S>))
    .route("/tenders/{id}/versions", get(tenders::versions::<S>))
    // Bids
    .route("/bids/my", get(bids::mine::<S>))
    .route("/bids/new", post(bids::create::<S>))
    .route("/bids/{id}/list", get(bids::for_tender::<S>))
    .route(
      "/bids/{id}/status",
      get(bids::status::<S>).put(bids::set_status::<S>),
    )
    .route("/bids/{id}/edit", patch(bids::edit::<S>))
    .route("/bids/{id}/rollback/{version}", put(bids::rollback::<S>))
    .route("/bids/{id}/versions", get(bids::versions::<S>))
    .route("/bids/{id}/submit_decision", put(bids::submit_decision::<S>))
    .with_state(store)
}

/// `GET /ping`
async fn ping() -> &'static str { "ok" }

/// `?limit=&offset=` shared by the list endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub limit:  Option<u32>,
  pub offset: Option<u32>,
}

impl PageParams {
  fn page(&self) -> procura_core::store::Page {
    procura_core::store::Page::new(self.offset, self.limit)
  }
}
