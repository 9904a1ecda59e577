//! The versioned-entity pattern shared by tenders and bids.
//!
//! Each entity has a current row in `table` and an append-only log in
//! `log`, keyed by `(log_key, version_id)`. Every helper here runs inside a
//! caller-owned `BEGIN IMMEDIATE` transaction.

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use procura_core::Error as CoreError;

use crate::{
  Result,
  encode::{encode_dt, encode_uuid},
};

pub struct Versioned {
  pub table:     &'static str,
  pub log:       &'static str,
  pub log_key:   &'static str,
  /// Columns copied into the log and restored by a rollback.
  pub snapshot:  &'static [&'static str],
  pub not_found: fn(Uuid) -> CoreError,
}

pub const TENDER: Versioned = Versioned {
  table:     "tender",
  log:       "tender_version",
  log_key:   "tender_id",
  snapshot:  &["name", "description", "status", "service_type"],
  not_found: CoreError::TenderNotFound,
};

pub const BID: Versioned = Versioned {
  table:     "bid",
  log:       "bid_version",
  log_key:   "bid_id",
  snapshot:  &["name", "description", "status"],
  not_found: CoreError::BidNotFound,
};

impl Versioned {
  fn snapshot_list(&self) -> String { self.snapshot.join(", ") }

  /// Probe the current row scoped to its owner and return its stored
  /// status. Under `BEGIN IMMEDIATE` this runs with the write lock already
  /// held, so the status is the one the mutation will build on.
  pub fn lock(&self, conn: &Connection, id: Uuid, creator_id: Uuid) -> Result<String> {
    let sql = format!("SELECT status FROM {} WHERE id = ?1 AND creator_id = ?2", self.table);
    conn
      .query_row(&sql, params![encode_uuid(id), encode_uuid(creator_id)], |r| r.get(0))
      .optional()?
      .ok_or_else(|| (self.not_found)(id).into())
  }

  /// Set `changes` and advance `version_id` by one. With `creator_id` the
  /// write is owner-scoped; without it (quorum cascade) it is by id only.
  pub fn bump(
    &self,
    conn: &Connection,
    id: Uuid,
    creator_id: Option<Uuid>,
    changes: Vec<(&'static str, Value)>,
  ) -> Result<()> {
    let mut sets: Vec<String> = Vec::with_capacity(changes.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(changes.len() + 2);
    for (column, value) in changes {
      sets.push(format!("{column} = ?"));
      values.push(value);
    }
    sets.push("version_id = version_id + 1".to_owned());

    let mut sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
    values.push(encode_uuid(id).into());
    if let Some(creator) = creator_id {
      sql.push_str(" AND creator_id = ?");
      values.push(encode_uuid(creator).into());
    }

    match conn.execute(&sql, params_from_iter(values))? {
      1 => Ok(()),
      _ => Err((self.not_found)(id).into()),
    }
  }

  /// Copy the current row into the log under its current `version_id`.
  pub fn append_version(&self, conn: &Connection, id: Uuid) -> Result<()> {
    let cols = self.snapshot_list();
    let sql = format!(
      "INSERT INTO {log} ({key}, version_id, {cols}, created)
       SELECT id, version_id, {cols}, ?2 FROM {table} WHERE id = ?1",
      log = self.log,
      key = self.log_key,
      table = self.table,
    );
    match conn.execute(&sql, params![encode_uuid(id), encode_dt(Utc::now())])? {
      1 => Ok(()),
      _ => Err((self.not_found)(id).into()),
    }
  }

  /// The `status` recorded at `version`, or `VersionNotFound`.
  pub fn snapshot_status(&self, conn: &Connection, id: Uuid, version: u32) -> Result<String> {
    let sql = format!(
      "SELECT status FROM {} WHERE {} = ?1 AND version_id = ?2",
      self.log, self.log_key
    );
    conn
      .query_row(&sql, params![encode_uuid(id), version], |r| r.get(0))
      .optional()?
      .ok_or_else(|| CoreError::VersionNotFound { id, version }.into())
  }

  /// Overwrite the snapshot columns with the values logged at `version`
  /// and advance `version_id`. The log itself is never touched.
  pub fn restore(&self, conn: &Connection, id: Uuid, creator_id: Uuid, version: u32) -> Result<()> {
    self.snapshot_status(conn, id, version)?;
    let cols = self.snapshot_list();
    let sql = format!(
      "UPDATE {table}
       SET ({cols}) = (SELECT {cols} FROM {log} WHERE {key} = ?1 AND version_id = ?3),
           version_id = version_id + 1
       WHERE id = ?1 AND creator_id = ?2",
      table = self.table,
      log = self.log,
      key = self.log_key,
    );
    match conn.execute(&sql, params![encode_uuid(id), encode_uuid(creator_id), version])? {
      1 => Ok(()),
      _ => Err((self.not_found)(id).into()),
    }
  }
}
