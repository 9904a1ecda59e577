//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! enums their PascalCase variant names.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use procura_core::{
  bid::{Bid, BidDecision, BidVersion},
  tender::{Tender, TenderVersion},
};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// The stored name of any of the strum-derived status/type enums.
pub fn encode_enum<T: Into<&'static str>>(v: T) -> String { v.into().to_owned() }

/// Parse any of the strum-derived status/type enums.
pub fn decode_enum<T: FromStr>(s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| procura_core::Error::UnknownVariant(s.to_owned()).into())
}

// ─── Column lists ────────────────────────────────────────────────────────────

/// Columns of `tender t`, in [`RawTender::from_row`] order.
pub const TENDER_COLUMNS: &str = "t.id, t.name, t.description, t.service_type, \
  t.status, t.organization_id, t.creator_id, t.version_id, t.created";

/// Columns of `bid b`, in [`RawBid::from_row`] order.
pub const BID_COLUMNS: &str = "b.id, b.name, b.description, b.status, \
  b.tender_id, b.creator_type, b.creator_id, b.organization_id, b.version_id, \
  b.created";

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `tender` row.
pub struct RawTender {
  pub id:              String,
  pub name:            String,
  pub description:     String,
  pub service_type:    String,
  pub status:          String,
  pub organization_id: String,
  pub creator_id:      String,
  pub version_id:      u32,
  pub created:         String,
}

impl RawTender {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      description:     row.get(2)?,
      service_type:    row.get(3)?,
      status:          row.get(4)?,
      organization_id: row.get(5)?,
      creator_id:      row.get(6)?,
      version_id:      row.get(7)?,
      created:         row.get(8)?,
    })
  }

  pub fn into_tender(self) -> Result<Tender> {
    Ok(Tender {
      id:              decode_uuid(&self.id)?,
      name:            self.name,
      description:     self.description,
      service_type:    decode_enum(&self.service_type)?,
      status:          decode_enum(&self.status)?,
      organization_id: decode_uuid(&self.organization_id)?,
      creator_id:      decode_uuid(&self.creator_id)?,
      version_id:      self.version_id,
      created:         decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read from a `tender_version` row.
pub struct RawTenderVersion {
  pub tender_id:    String,
  pub version_id:   u32,
  pub name:         String,
  pub description:  String,
  pub status:       String,
  pub service_type: String,
  pub created:      String,
}

impl RawTenderVersion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tender_id:    row.get(0)?,
      version_id:   row.get(1)?,
      name:         row.get(2)?,
      description:  row.get(3)?,
      status:       row.get(4)?,
      service_type: row.get(5)?,
      created:      row.get(6)?,
    })
  }

  pub fn into_version(self) -> Result<TenderVersion> {
    Ok(TenderVersion {
      tender_id:    decode_uuid(&self.tender_id)?,
      version_id:   self.version_id,
      name:         self.name,
      description:  self.description,
      status:       decode_enum(&self.status)?,
      service_type: decode_enum(&self.service_type)?,
      created:      decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read directly from a `bid` row.
pub struct RawBid {
  pub id:              String,
  pub name:            String,
  pub description:     String,
  pub status:          String,
  pub tender_id:       String,
  pub creator_type:    String,
  pub creator_id:      String,
  pub organization_id: String,
  pub version_id:      u32,
  pub created:         String,
}

impl RawBid {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      name:            row.get(1)?,
      description:     row.get(2)?,
      status:          row.get(3)?,
      tender_id:       row.get(4)?,
      creator_type:    row.get(5)?,
      creator_id:      row.get(6)?,
      organization_id: row.get(7)?,
      version_id:      row.get(8)?,
      created:         row.get(9)?,
    })
  }

  pub fn into_bid(self) -> Result<Bid> {
    Ok(Bid {
      id:              decode_uuid(&self.id)?,
      name:            self.name,
      description:     self.description,
      status:          decode_enum(&self.status)?,
      tender_id:       decode_uuid(&self.tender_id)?,
      creator_type:    decode_enum(&self.creator_type)?,
      creator_id:      decode_uuid(&self.creator_id)?,
      organization_id: decode_uuid(&self.organization_id)?,
      version_id:      self.version_id,
      created:         decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read from a `bid_version` row.
pub struct RawBidVersion {
  pub bid_id:      String,
  pub version_id:  u32,
  pub name:        String,
  pub description: String,
  pub status:      String,
  pub created:     String,
}

impl RawBidVersion {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bid_id:      row.get(0)?,
      version_id:  row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      status:      row.get(4)?,
      created:     row.get(5)?,
    })
  }

  pub fn into_version(self) -> Result<BidVersion> {
    Ok(BidVersion {
      bid_id:      decode_uuid(&self.bid_id)?,
      version_id:  self.version_id,
      name:        self.name,
      description: self.description,
      status:      decode_enum(&self.status)?,
      created:     decode_dt(&self.created)?,
    })
  }
}

/// Raw strings read from a `bid_agreement` row.
pub struct RawDecision {
  pub bid_id:      String,
  pub employee_id: String,
  pub status:      String,
  pub created:     String,
}

impl RawDecision {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      bid_id:      row.get(0)?,
      employee_id: row.get(1)?,
      status:      row.get(2)?,
      created:     row.get(3)?,
    })
  }

  pub fn into_decision(self) -> Result<BidDecision> {
    Ok(BidDecision {
      bid_id:      decode_uuid(&self.bid_id)?,
      employee_id: decode_uuid(&self.employee_id)?,
      decision:    decode_enum(&self.status)?,
      created:     decode_dt(&self.created)?,
    })
  }
}
