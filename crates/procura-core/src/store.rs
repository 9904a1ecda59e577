//! The `ProcurementStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `procura-store-sqlite`). Each mutating method is a single transaction:
//! it locks the current row, applies the change, appends a version
//! snapshot and commits, or leaves no trace at all.

use std::future::Future;

use uuid::Uuid;

use crate::{
  DEFAULT_LIMIT,
  bid::{Bid, BidDecision, BidFilter, BidPatch, BidVersion, Decision, NewBid},
  tender::{NewTender, Tender, TenderFilter, TenderPatch, TenderVersion},
};

// ─── Pagination ──────────────────────────────────────────────────────────────

/// Offset/limit pagination shared by the list operations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
  pub offset: u32,
  /// `None` or `Some(0)` falls back to [`DEFAULT_LIMIT`].
  pub limit:  Option<u32>,
}

impl Page {
  pub fn new(offset: Option<u32>, limit: Option<u32>) -> Self {
    Self { offset: offset.unwrap_or(0), limit }
  }

  pub fn limit(&self) -> u32 {
    match self.limit {
      Some(l) if l > 0 => l,
      _ => DEFAULT_LIMIT,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Procura storage backend.
///
/// Version logs are append-only: `version_id` starts at 1, grows by exactly
/// one per mutation, and every value has exactly one log row. Update and
/// rollback are scoped to `(id, creator_id)`; a mismatch is reported as not
/// found and writes nothing.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait ProcurementStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Tenders ───────────────────────────────────────────────────────────

  /// Persist a new tender at version 1 with status `Created`.
  fn create_tender(
    &self,
    draft: NewTender,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  /// Apply a sparse patch as the next version.
  fn update_tender(
    &self,
    id: Uuid,
    creator_id: Uuid,
    patch: TenderPatch,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  /// Restore the fields recorded at `version` as a new version.
  fn rollback_tender(
    &self,
    id: Uuid,
    version: u32,
    creator_id: Uuid,
  ) -> impl Future<Output = Result<Tender, Self::Error>> + Send + '_;

  fn list_tenders<'a>(
    &'a self,
    filter: &'a TenderFilter,
  ) -> impl Future<Output = Result<Vec<Tender>, Self::Error>> + Send + 'a;

  /// The full version log, oldest first.
  fn tender_versions(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<TenderVersion>, Self::Error>> + Send + '_;

  // ── Bids ──────────────────────────────────────────────────────────────

  /// Persist a new bid at version 1 with status `Created`. The tender must
  /// exist.
  fn create_bid(
    &self,
    draft: NewBid,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  /// Apply a sparse patch as the next version. Patches may not set a
  /// decided status.
  fn update_bid(
    &self,
    id: Uuid,
    creator_id: Uuid,
    patch: BidPatch,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  fn rollback_bid(
    &self,
    id: Uuid,
    version: u32,
    creator_id: Uuid,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + '_;

  fn list_bids<'a>(
    &'a self,
    filter: &'a BidFilter,
  ) -> impl Future<Output = Result<Vec<Bid>, Self::Error>> + Send + 'a;

  fn bid_versions(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Vec<BidVersion>, Self::Error>> + Send + '_;

  // ── Decisions ─────────────────────────────────────────────────────────

  /// Record `employee_id`'s decision and, if the quorum is now decisive,
  /// move the bid (and on approval its tender) to their terminal states,
  /// all in one transaction. Returns the bid as of commit.
  fn submit_decision<'a>(
    &'a self,
    bid_id: Uuid,
    employee_id: Uuid,
    employee_organization_ids: &'a [Uuid],
    decision: Decision,
  ) -> impl Future<Output = Result<Bid, Self::Error>> + Send + 'a;

  fn decisions(
    &self,
    bid_id: Uuid,
  ) -> impl Future<Output = Result<Vec<BidDecision>, Self::Error>> + Send + '_;
}
