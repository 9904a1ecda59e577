//! Bids — an organisation's response to a tender — and the decisions
//! employees cast on them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{Error, Result, employee::Employee, store::Page};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// Lifecycle of a bid.
///
/// `Created → Published → {Approved | Rejected | Closed}`. Only the quorum
/// engine moves a bid to `Approved` or `Rejected`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
pub enum BidStatus {
  #[default]
  Created,
  Published,
  Closed,
  Approved,
  Rejected,
}

impl BidStatus {
  /// Statuses reached only through [`crate::quorum`].
  pub fn is_decided(self) -> bool { matches!(self, Self::Approved | Self::Rejected) }
}

/// Who the bid is submitted on behalf of.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
pub enum CreatorType {
  Organization,
  #[default]
  User,
}

/// A single employee's vote on a bid.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, IntoStaticStr,
)]
pub enum Decision {
  Approved,
  Rejected,
}

impl From<Decision> for BidStatus {
  fn from(d: Decision) -> Self {
    match d {
      Decision::Approved => BidStatus::Approved,
      Decision::Rejected => BidStatus::Rejected,
    }
  }
}

// ─── Bid ─────────────────────────────────────────────────────────────────────

/// The current row of a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bid {
  pub id:              Uuid,
  pub name:            String,
  pub description:     String,
  pub status:          BidStatus,
  pub tender_id:       Uuid,
  pub creator_type:    CreatorType,
  pub creator_id:      Uuid,
  pub organization_id: Uuid,
  pub version_id:      u32,
  pub created:         DateTime<Utc>,
}

/// One immutable snapshot from the `bid_version` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidVersion {
  pub bid_id:      Uuid,
  pub version_id:  u32,
  pub name:        String,
  pub description: String,
  pub status:      BidStatus,
  pub created:     DateTime<Utc>,
}

/// A recorded vote. At most one per `(bid_id, employee_id)`; a repeat vote
/// replaces the earlier one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidDecision {
  pub bid_id:      Uuid,
  pub employee_id: Uuid,
  pub decision:    Decision,
  pub created:     DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ProcurementStore::create_bid`].
#[derive(Debug, Clone)]
pub struct NewBid {
  pub name:            String,
  pub description:     String,
  pub tender_id:       Uuid,
  pub creator_type:    CreatorType,
  pub creator_id:      Uuid,
  pub organization_id: Uuid,
}

/// A sparse update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub status:      Option<BidStatus>,
}

impl BidPatch {
  pub fn status(status: BidStatus) -> Self {
    Self { status: Some(status), ..Default::default() }
  }

  /// Reject patches that would bypass the decision quorum.
  pub fn validate(&self) -> Result<()> {
    match self.status {
      Some(s) if s.is_decided() => Err(Error::InvalidStatusChange(s)),
      _ => Ok(()),
    }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::ProcurementStore::list_bids`].
///
/// A bid is returned if its own organisation is in `organization_ids`, or
/// if it has left `Created` and its tender's organisation is in
/// `organization_ids`.
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
  pub bid_id:           Option<Uuid>,
  pub tender_id:        Option<Uuid>,
  pub creator_id:       Option<Uuid>,
  pub statuses:         Vec<BidStatus>,
  pub organization_ids: Vec<Uuid>,
  pub page:             Page,
}

impl BidFilter {
  pub fn visible_to(employee: &Employee) -> Self {
    Self {
      organization_ids: employee.organization_ids.clone(),
      ..Default::default()
    }
  }

  pub fn with_id(mut self, id: Uuid) -> Self {
    self.bid_id = Some(id);
    self
  }
}
