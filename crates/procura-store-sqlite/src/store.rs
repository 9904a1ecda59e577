//! [`SqliteStore`] — the SQLite implementation of [`ProcurementStore`].

use std::{
  path::Path,
  time::{Duration, Instant},
};

use chrono::Utc;
use rusqlite::{
  Connection, OptionalExtension as _, Transaction, TransactionBehavior, params,
  params_from_iter, types::Value,
};
use uuid::Uuid;

use procura_core::{
  bid::{
    Bid, BidDecision, BidFilter, BidPatch, BidStatus, BidVersion, Decision, NewBid,
  },
  store::ProcurementStore,
  tender::{
    NewTender, Tender, TenderFilter, TenderPatch, TenderStatus, TenderVersion,
  },
};

use crate::{
  Error, Result, decision,
  encode::{
    BID_COLUMNS, RawBid, RawBidVersion, RawDecision, RawTender, RawTenderVersion,
    TENDER_COLUMNS, decode_enum, encode_dt, encode_enum, encode_uuid,
  },
  query::{Conditions, placeholders},
  schema::SCHEMA,
  versioned::{BID, TENDER},
};

/// How long a writer waits for another connection's lock when no deadline
/// is set.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

// ─── Deadline ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct Deadline(Option<Instant>);

impl Deadline {
  fn check(self) -> Result<()> {
    match self.0 {
      Some(at) if Instant::now() >= at => {
        Err(procura_core::Error::DeadlineExceeded.into())
      }
      _ => Ok(()),
    }
  }

  fn busy_timeout(self) -> Duration {
    self
      .0
      .map(|at| at.saturating_duration_since(Instant::now()))
      .unwrap_or(DEFAULT_BUSY_TIMEOUT)
  }
}

/// Run `f` inside a `BEGIN IMMEDIATE` transaction. Any error, including a
/// missed deadline, drops the transaction and so rolls it back.
fn run_write<R>(
  conn: &mut Connection,
  deadline: Deadline,
  f: impl FnOnce(&Transaction<'_>) -> Result<R>,
) -> Result<R> {
  conn.busy_timeout(deadline.busy_timeout())?;
  let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
  deadline.check()?;
  let out = f(&tx)?;
  deadline.check()?;
  tx.commit()?;
  Ok(out)
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Procura store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:          tokio_rusqlite::Connection,
  write_timeout: Option<Duration>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, write_timeout: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, write_timeout: None };
    store.init_schema().await?;
    Ok(store)
  }

  /// Give every write transaction issued through this handle a deadline of
  /// `timeout` from the moment the call is made. A transaction that misses
  /// it is rolled back and reports `DeadlineExceeded`.
  pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
    self.write_timeout = Some(timeout);
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read on the connection thread.
  pub(crate) async fn read<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&Connection) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` as one write transaction on the connection thread.
  pub(crate) async fn write<R, F>(&self, f: F) -> Result<R>
  where
    F: FnOnce(&Transaction<'_>) -> Result<R> + Send + 'static,
    R: Send + 'static,
  {
    let deadline = Deadline(self.write_timeout.map(|t| Instant::now() + t));
    self
      .conn
      .call(move |conn| Ok(run_write(conn, deadline, f)))
      .await?
  }
}

// ─── Row readers ─────────────────────────────────────────────────────────────

fn read_tender(conn: &Connection, id: Uuid) -> Result<Tender> {
  conn
    .query_row(
      &format!("SELECT {TENDER_COLUMNS} FROM tender t WHERE t.id = ?1"),
      params![encode_uuid(id)],
      RawTender::from_row,
    )
    .optional()?
    .ok_or(procura_core::Error::TenderNotFound(id))?
    .into_tender()
}

fn read_bid(conn: &Connection, id: Uuid) -> Result<Bid> {
  conn
    .query_row(
      &format!("SELECT {BID_COLUMNS} FROM bid b WHERE b.id = ?1"),
      params![encode_uuid(id)],
      RawBid::from_row,
    )
    .optional()?
    .ok_or(procura_core::Error::BidNotFound(id))?
    .into_bid()
}

/// Lock a bid for its creator. `Approved` and `Rejected` are terminal: a
/// decided bid is never edited or rolled back.
fn lock_open_bid(conn: &Connection, id: Uuid, creator_id: Uuid) -> Result<()> {
  let status: BidStatus = decode_enum(&BID.lock(conn, id, creator_id)?)?;
  if status.is_decided() {
    return Err(procura_core::Error::InvalidStatusChange(status).into());
  }
  Ok(())
}

fn tender_changes(patch: TenderPatch) -> Vec<(&'static str, Value)> {
  let mut changes = Vec::new();
  if let Some(name) = patch.name {
    changes.push(("name", Value::from(name)));
  }
  if let Some(description) = patch.description {
    changes.push(("description", Value::from(description)));
  }
  if let Some(service_type) = patch.service_type {
    changes.push(("service_type", Value::from(encode_enum(service_type))));
  }
  if let Some(status) = patch.status {
    changes.push(("status", Value::from(encode_enum(status))));
  }
  changes
}

fn bid_changes(patch: BidPatch) -> Vec<(&'static str, Value)> {
  let mut changes = Vec::new();
  if let Some(name) = patch.name {
    changes.push(("name", Value::from(name)));
  }
  if let Some(description) = patch.description {
    changes.push(("description", Value::from(description)));
  }
  if let Some(status) = patch.status {
    changes.push(("status", Value::from(encode_enum(status))));
  }
  changes
}

fn encode_ids(ids: &[Uuid]) -> Vec<Value> {
  ids.iter().map(|id| Value::from(encode_uuid(*id))).collect()
}

// ─── ProcurementStore impl ───────────────────────────────────────────────────

impl ProcurementStore for SqliteStore {
  type Error = Error;

  // ── Tenders ───────────────────────────────────────────────────────────────

  async fn create_tender(&self, draft: NewTender) -> Result<Tender> {
    let id = Uuid::new_v4();

    let tender = self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO tender (
             id, name, description, service_type, status,
             organization_id, creator_id, version_id, created
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8)",
          params![
            encode_uuid(id),
            draft.name,
            draft.description,
            encode_enum(draft.service_type),
            encode_enum(TenderStatus::Created),
            encode_uuid(draft.organization_id),
            encode_uuid(draft.creator_id),
            encode_dt(Utc::now()),
          ],
        )?;
        TENDER.append_version(tx, id)?;
        read_tender(tx, id)
      })
      .await?;

    tracing::debug!(tender_id = %tender.id, "tender created");
    Ok(tender)
  }

  async fn update_tender(
    &self,
    id:         Uuid,
    creator_id: Uuid,
    patch:      TenderPatch,
  ) -> Result<Tender> {
    let tender = self
      .write(move |tx| {
        TENDER.lock(tx, id, creator_id)?;
        TENDER.bump(tx, id, Some(creator_id), tender_changes(patch))?;
        TENDER.append_version(tx, id)?;
        read_tender(tx, id)
      })
      .await?;

    tracing::debug!(tender_id = %id, version = tender.version_id, "tender updated");
    Ok(tender)
  }

  async fn rollback_tender(
    &self,
    id:         Uuid,
    version:    u32,
    creator_id: Uuid,
  ) -> Result<Tender> {
    let tender = self
      .write(move |tx| {
        TENDER.lock(tx, id, creator_id)?;
        TENDER.restore(tx, id, creator_id, version)?;
        TENDER.append_version(tx, id)?;
        read_tender(tx, id)
      })
      .await?;

    tracing::debug!(
      tender_id = %id,
      restored = version,
      version = tender.version_id,
      "tender rolled back"
    );
    Ok(tender)
  }

  async fn list_tenders(&self, filter: &TenderFilter) -> Result<Vec<Tender>> {
    let orgs = encode_ids(&filter.organization_ids);
    let mut conds = Conditions::default();
    conds.push(
      format!(
        "(t.organization_id IN ({}) OR t.status = 'Published')",
        placeholders(orgs.len())
      ),
      orgs,
    );
    conds.eq("t.id", filter.tender_id.map(encode_uuid));
    conds.eq("t.creator_id", filter.creator_id.map(encode_uuid));
    conds.eq("t.service_type", filter.service_type.map(encode_enum));
    conds.any_of("t.status", filter.statuses.iter().copied().map(encode_enum));

    let (where_clause, mut values) = conds.finish();
    values.push(Value::from(filter.page.limit()));
    values.push(Value::from(filter.page.offset));
    let sql = format!(
      "SELECT {TENDER_COLUMNS} FROM tender t {where_clause}
       ORDER BY t.created, t.id
       LIMIT ? OFFSET ?"
    );

    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(params_from_iter(values), RawTender::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawTender::into_tender).collect()
      })
      .await
  }

  async fn tender_versions(&self, id: Uuid) -> Result<Vec<TenderVersion>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT tender_id, version_id, name, description, status, service_type, created
           FROM tender_version
           WHERE tender_id = ?1
           ORDER BY version_id",
        )?;
        let raws = stmt
          .query_map(params![encode_uuid(id)], RawTenderVersion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawTenderVersion::into_version).collect()
      })
      .await
  }

  // ── Bids ──────────────────────────────────────────────────────────────────

  async fn create_bid(&self, draft: NewBid) -> Result<Bid> {
    let id = Uuid::new_v4();

    let bid = self
      .write(move |tx| {
        let tender_exists = tx
          .query_row(
            "SELECT 1 FROM tender WHERE id = ?1",
            params![encode_uuid(draft.tender_id)],
            |_| Ok(()),
          )
          .optional()?
          .is_some();
        if !tender_exists {
          return Err(procura_core::Error::TenderNotFound(draft.tender_id).into());
        }

        tx.execute(
          "INSERT INTO bid (
             id, name, description, status, tender_id,
             creator_type, creator_id, organization_id, version_id, created
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9)",
          params![
            encode_uuid(id),
            draft.name,
            draft.description,
            encode_enum(BidStatus::Created),
            encode_uuid(draft.tender_id),
            encode_enum(draft.creator_type),
            encode_uuid(draft.creator_id),
            encode_uuid(draft.organization_id),
            encode_dt(Utc::now()),
          ],
        )?;
        BID.append_version(tx, id)?;
        read_bid(tx, id)
      })
      .await?;

    tracing::debug!(bid_id = %bid.id, tender_id = %bid.tender_id, "bid created");
    Ok(bid)
  }

  async fn update_bid(&self, id: Uuid, creator_id: Uuid, patch: BidPatch) -> Result<Bid> {
    patch.validate()?;

    let bid = self
      .write(move |tx| {
        lock_open_bid(tx, id, creator_id)?;
        BID.bump(tx, id, Some(creator_id), bid_changes(patch))?;
        BID.append_version(tx, id)?;
        read_bid(tx, id)
      })
      .await?;

    tracing::debug!(bid_id = %id, version = bid.version_id, "bid updated");
    Ok(bid)
  }

  async fn rollback_bid(&self, id: Uuid, version: u32, creator_id: Uuid) -> Result<Bid> {
    let bid = self
      .write(move |tx| {
        lock_open_bid(tx, id, creator_id)?;
        BID.restore(tx, id, creator_id, version)?;
        BID.append_version(tx, id)?;
        read_bid(tx, id)
      })
      .await?;

    tracing::debug!(
      bid_id = %id,
      restored = version,
      version = bid.version_id,
      "bid rolled back"
    );
    Ok(bid)
  }

  async fn list_bids(&self, filter: &BidFilter) -> Result<Vec<Bid>> {
    let orgs = encode_ids(&filter.organization_ids);
    let marks = placeholders(orgs.len());
    let mut conds = Conditions::default();
    conds.push(
      format!(
        "(b.organization_id IN ({marks})
          OR (b.status <> 'Created' AND t.organization_id IN ({marks})))"
      ),
      orgs.iter().cloned().chain(orgs.iter().cloned()),
    );
    conds.eq("b.id", filter.bid_id.map(encode_uuid));
    conds.eq("b.tender_id", filter.tender_id.map(encode_uuid));
    conds.eq("b.creator_id", filter.creator_id.map(encode_uuid));
    conds.any_of("b.status", filter.statuses.iter().copied().map(encode_enum));

    let (where_clause, mut values) = conds.finish();
    values.push(Value::from(filter.page.limit()));
    values.push(Value::from(filter.page.offset));
    let sql = format!(
      "SELECT {BID_COLUMNS}
       FROM bid b
       JOIN tender t ON t.id = b.tender_id
       {where_clause}
       ORDER BY b.created, b.id
       LIMIT ? OFFSET ?"
    );

    self
      .read(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
          .query_map(params_from_iter(values), RawBid::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawBid::into_bid).collect()
      })
      .await
  }

  async fn bid_versions(&self, id: Uuid) -> Result<Vec<BidVersion>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bid_id, version_id, name, description, status, created
           FROM bid_version
           WHERE bid_id = ?1
           ORDER BY version_id",
        )?;
        let raws = stmt
          .query_map(params![encode_uuid(id)], RawBidVersion::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawBidVersion::into_version).collect()
      })
      .await
  }

  // ── Decisions ─────────────────────────────────────────────────────────────

  async fn submit_decision(
    &self,
    bid_id:                    Uuid,
    employee_id:               Uuid,
    employee_organization_ids: &[Uuid],
    decision:                  Decision,
  ) -> Result<Bid> {
    let orgs = employee_organization_ids.to_vec();

    let (bid, outcome) = self
      .write(move |tx| {
        let outcome = decision::submit(tx, bid_id, employee_id, &orgs, decision)?;
        Ok((read_bid(tx, bid_id)?, outcome))
      })
      .await?;

    match outcome {
      Some(outcome) => tracing::info!(
        bid_id = %bid_id,
        tender_id = %bid.tender_id,
        %outcome,
        "quorum reached"
      ),
      None => tracing::debug!(bid_id = %bid_id, %employee_id, %decision, "decision recorded"),
    }
    Ok(bid)
  }

  async fn decisions(&self, bid_id: Uuid) -> Result<Vec<BidDecision>> {
    self
      .read(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bid_id, employee_id, status, created
           FROM bid_agreement
           WHERE bid_id = ?1
           ORDER BY created, employee_id",
        )?;
        let raws = stmt
          .query_map(params![encode_uuid(bid_id)], RawDecision::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        raws.into_iter().map(RawDecision::into_decision).collect()
      })
      .await
  }
}
