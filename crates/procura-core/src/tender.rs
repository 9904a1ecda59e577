//! Tenders — requests for work published by an organisation.
//!
//! A tender has one mutable current row and an append-only log of
//! [`TenderVersion`] snapshots, one per mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use uuid::Uuid;

use crate::{employee::Employee, store::Page};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The kind of work a tender asks for.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display,
  EnumString, IntoStaticStr,
)]
pub enum ServiceType {
  Construction,
  Delivery,
  Manufacture,
}

/// Lifecycle of a tender. Anyone may read a `Published` tender.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
  Display, EnumString, IntoStaticStr,
)]
pub enum TenderStatus {
  #[default]
  Created,
  Published,
  Closed,
}

// ─── Tender ──────────────────────────────────────────────────────────────────

/// The current row of a tender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tender {
  pub id:              Uuid,
  pub name:            String,
  pub description:     String,
  pub service_type:    ServiceType,
  pub status:          TenderStatus,
  /// The owning organisation.
  pub organization_id: Uuid,
  /// The employee holding mutation rights.
  pub creator_id:      Uuid,
  /// Starts at 1 and grows by exactly one per mutation.
  pub version_id:      u32,
  pub created:         DateTime<Utc>,
}

/// One immutable snapshot from the `tender_version` log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderVersion {
  pub tender_id:    Uuid,
  pub version_id:   u32,
  pub name:         String,
  pub description:  String,
  pub status:       TenderStatus,
  pub service_type: ServiceType,
  /// When this snapshot was appended.
  pub created:      DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::ProcurementStore::create_tender`].
/// The id, status, version and timestamp are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewTender {
  pub name:            String,
  pub description:     String,
  pub service_type:    ServiceType,
  pub organization_id: Uuid,
  pub creator_id:      Uuid,
}

/// A sparse update. `None` leaves the field untouched; `Some("")` really
/// does set an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderPatch {
  pub name:         Option<String>,
  pub description:  Option<String>,
  pub service_type: Option<ServiceType>,
  pub status:       Option<TenderStatus>,
}

impl TenderPatch {
  /// A patch that only changes the status.
  pub fn status(status: TenderStatus) -> Self {
    Self { status: Some(status), ..Default::default() }
  }
}

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`crate::store::ProcurementStore::list_tenders`].
///
/// Visibility is part of the filter: a tender is returned only if its
/// organisation is in `organization_ids` or it is `Published`.
#[derive(Debug, Clone, Default)]
pub struct TenderFilter {
  pub tender_id:        Option<Uuid>,
  pub creator_id:       Option<Uuid>,
  pub service_type:     Option<ServiceType>,
  /// Empty means any status.
  pub statuses:         Vec<TenderStatus>,
  /// The caller's organisations.
  pub organization_ids: Vec<Uuid>,
  pub page:             Page,
}

impl TenderFilter {
  /// Everything `employee` is allowed to see.
  pub fn visible_to(employee: &Employee) -> Self {
    Self {
      organization_ids: employee.organization_ids.clone(),
      ..Default::default()
    }
  }

  /// Restrict to a single tender.
  pub fn with_id(mut self, id: Uuid) -> Self {
    self.tender_id = Some(id);
    self
  }
}
