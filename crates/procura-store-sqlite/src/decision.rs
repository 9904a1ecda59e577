//! The approval quorum transaction.
//!
//! Recording a decision, recounting the quorum and cascading the outcome to
//! the bid and its tender all happen on one `Transaction`. The count is
//! taken after the write lock is held, so concurrent voters never see each
//! other's pre-commit state.

use chrono::Utc;
use procura_core::{
  Error as CoreError,
  bid::{BidStatus, Decision},
  quorum::{self, Tally},
  tender::TenderStatus,
};
use rusqlite::{Connection, OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_enum, decode_uuid, encode_dt, encode_enum, encode_uuid},
  query::placeholders,
  versioned::{BID, TENDER},
};

/// Insert or replace the decision, guarded by the eligibility predicate.
/// Returns whether a row was written.
fn record(
  conn: &Connection,
  bid_id: Uuid,
  employee_id: Uuid,
  organization_ids: &[Uuid],
  decision: Decision,
) -> Result<bool> {
  if organization_ids.is_empty() {
    return Ok(false);
  }

  let sql = format!(
    "INSERT INTO bid_agreement (bid_id, employee_id, status, created)
     SELECT b.id, ?, ?, ?
     FROM bid b
     JOIN tender t ON t.id = b.tender_id
     WHERE b.id = ?
       AND b.status = 'Published'
       AND t.status = 'Published'
       AND t.organization_id IN ({})
     ON CONFLICT (bid_id, employee_id)
     DO UPDATE SET status = excluded.status, created = excluded.created",
    placeholders(organization_ids.len())
  );

  let mut values: Vec<Value> = vec![
    encode_uuid(employee_id).into(),
    encode_enum(decision).into(),
    encode_dt(Utc::now()).into(),
    encode_uuid(bid_id).into(),
  ];
  values.extend(organization_ids.iter().map(|o| Value::from(encode_uuid(*o))));

  Ok(conn.execute(&sql, params_from_iter(values))? > 0)
}

/// Explain why [`record`] wrote nothing: a member-only failure on an
/// otherwise open bid is `Forbidden`, anything else is not found.
fn ineligible(conn: &Connection, bid_id: Uuid) -> Result<CoreError> {
  let statuses: Option<(String, String)> = conn
    .query_row(
      "SELECT b.status, t.status FROM bid b JOIN tender t ON t.id = b.tender_id
       WHERE b.id = ?1",
      params![encode_uuid(bid_id)],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()?;

  let open = match statuses {
    Some((bid, tender)) => {
      decode_enum::<BidStatus>(&bid)? == BidStatus::Published
        && decode_enum::<TenderStatus>(&tender)? == TenderStatus::Published
    }
    None => false,
  };

  Ok(if open { CoreError::Forbidden } else { CoreError::BidNotFound(bid_id) })
}

/// Employees in the organisation that owns the bid's tender.
fn organization_size(conn: &Connection, bid_id: Uuid) -> Result<u32> {
  Ok(conn.query_row(
    "SELECT COUNT(DISTINCT oe.employee_id)
     FROM bid b
     JOIN tender t ON t.id = b.tender_id
     JOIN organization_employee oe ON oe.organization_id = t.organization_id
     WHERE b.id = ?1",
    params![encode_uuid(bid_id)],
    |r| r.get(0),
  )?)
}

fn tally(conn: &Connection, bid_id: Uuid) -> Result<Tally> {
  let mut stmt = conn.prepare("SELECT status FROM bid_agreement WHERE bid_id = ?1")?;
  let statuses = stmt
    .query_map(params![encode_uuid(bid_id)], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  statuses.iter().map(|s| decode_enum::<Decision>(s)).collect()
}

/// Record a decision and apply the quorum outcome, if any. Returns the
/// outcome that fired.
pub fn submit(
  conn: &Connection,
  bid_id: Uuid,
  employee_id: Uuid,
  organization_ids: &[Uuid],
  decision: Decision,
) -> Result<Option<Decision>> {
  if !record(conn, bid_id, employee_id, organization_ids, decision)? {
    return Err(ineligible(conn, bid_id)?.into());
  }

  let threshold = quorum::threshold(organization_size(conn, bid_id)?);
  let Some(outcome) = tally(conn, bid_id)?.outcome(threshold) else {
    return Ok(None);
  };

  let status = encode_enum(BidStatus::from(outcome));
  BID.bump(conn, bid_id, None, vec![("status", status.into())])?;
  BID.append_version(conn, bid_id)?;

  if outcome == Decision::Approved {
    let tender_id: String = conn.query_row(
      "SELECT tender_id FROM bid WHERE id = ?1",
      params![encode_uuid(bid_id)],
      |r| r.get(0),
    )?;
    let tender_id = decode_uuid(&tender_id)?;
    let closed = encode_enum(TenderStatus::Closed);
    TENDER.bump(conn, tender_id, None, vec![("status", closed.into())])?;
    TENDER.append_version(conn, tender_id)?;
  }

  Ok(Some(outcome))
}
