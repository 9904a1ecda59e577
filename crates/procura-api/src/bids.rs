//! Handlers for `/bids` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/bids/my` | Bids the caller created |
//! | `GET`   | `/bids/{tender_id}/list` | Bids on a visible tender |
//! | `POST`  | `/bids/new` | Body: [`CreateBody`] |
//! | `GET`   | `/bids/{id}/status` | Plain-text status |
//! | `PUT`   | `/bids/{id}/status` | `?status=Published`; decided bids are frozen |
//! | `PATCH` | `/bids/{id}/edit` | Body: sparse [`BidPatch`] |
//! | `PUT`   | `/bids/{id}/rollback/{version}` | New version copying `version` |
//! | `GET`   | `/bids/{id}/versions` | Version log, bidding organisation only |
//! | `PUT`   | `/bids/{id}/submit_decision` | `?decision=Approved\|Rejected` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use procura_core::{
  Error as CoreError, access,
  bid::{
    Bid, BidFilter, BidPatch, BidStatus, BidVersion, CreatorType, Decision,
    NewBid,
  },
  employee::{Employee, EmployeeDirectory},
  store::ProcurementStore,
  tender::{TenderFilter, TenderStatus},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  PageParams,
  caller::{Caller, resolve},
  error::ApiError,
  tenders,
};

async fn visible<S>(store: &S, caller: &Employee, id: Uuid) -> Result<Bid, ApiError>
where
  S: ProcurementStore,
  S::Error: Into<CoreError>,
{
  store
    .list_bids(&BidFilter::visible_to(caller).with_id(id))
    .await
    .map_err(ApiError::store)?
    .pop()
    .ok_or(ApiError::Core(CoreError::BidNotFound(id)))
}

async fn owned<S>(store: &S, caller: &Employee, id: Uuid) -> Result<Bid, ApiError>
where
  S: ProcurementStore,
  S::Error: Into<CoreError>,
{
  let bid = visible(store, caller, id).await?;
  if !access::can_mutate(&bid, caller) {
    return Err(CoreError::Forbidden.into());
  }
  if bid.status.is_decided() {
    return Err(CoreError::InvalidStatusChange(bid.status).into());
  }
  Ok(bid)
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /bids/my[?limit=..][&offset=..]`
pub async fn mine<S>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Bid>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let filter = BidFilter {
    creator_id: Some(caller.id),
    page: page.page(),
    ..BidFilter::visible_to(&caller)
  };
  let bids = store.list_bids(&filter).await.map_err(ApiError::store)?;
  Ok(Json(bids))
}

/// `GET /bids/{tender_id}/list[?limit=..][&offset=..]`
pub async fn for_tender<S>(
  State(store): State<Arc<S>>,
  Path(tender_id): Path<Uuid>,
  Caller(caller): Caller,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Bid>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  tenders::visible(store.as_ref(), &caller, tender_id).await?;
  let filter = BidFilter {
    tender_id: Some(tender_id),
    page: page.page(),
    ..BidFilter::visible_to(&caller)
  };
  let bids = store.list_bids(&filter).await.map_err(ApiError::store)?;
  Ok(Json(bids))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /bids/new`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub name:             String,
  #[serde(default)]
  pub description:      String,
  pub tender_id:        Uuid,
  #[serde(default)]
  pub creator_type:     CreatorType,
  pub organization_id:  Uuid,
  pub creator_username: String,
}

/// `POST /bids/new` — the creator must belong to `organizationId` and be
/// able to see the tender.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<Bid>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let caller = resolve(store.as_ref(), &body.creator_username).await?;
  if !access::can_create_for(body.organization_id, &caller) {
    return Err(CoreError::Forbidden.into());
  }
  tenders::visible(store.as_ref(), &caller, body.tender_id).await?;

  let bid = store
    .create_bid(NewBid {
      name:            body.name,
      description:     body.description,
      tender_id:       body.tender_id,
      creator_type:    body.creator_type,
      creator_id:      caller.id,
      organization_id: body.organization_id,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bid))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `GET /bids/{id}/status`
pub async fn status<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
) -> Result<String, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let bid = visible(store.as_ref(), &caller, id).await?;
  Ok(bid.status.to_string())
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub status: BidStatus,
}

/// `PUT /bids/{id}/status?status=<status>`
pub async fn set_status<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
  Query(params): Query<StatusParams>,
) -> Result<Json<Bid>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let patch = BidPatch::status(params.status);
  patch.validate()?;
  owned(store.as_ref(), &caller, id).await?;
  let bid = store
    .update_bid(id, caller.id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bid))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

/// `PATCH /bids/{id}/edit`
pub async fn edit<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
  Json(patch): Json<BidPatch>,
) -> Result<Json<Bid>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  patch.validate()?;
  owned(store.as_ref(), &caller, id).await?;
  let bid = store
    .update_bid(id, caller.id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bid))
}

// ─── Versions ─────────────────────────────────────────────────────────────────

/// `PUT /bids/{id}/rollback/{version}`
pub async fn rollback<S>(
  State(store): State<Arc<S>>,
  Path((id, version)): Path<(Uuid, u32)>,
  Caller(caller): Caller,
) -> Result<Json<Bid>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  owned(store.as_ref(), &caller, id).await?;
  let bid = store
    .rollback_bid(id, version, caller.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bid))
}

/// `GET /bids/{id}/versions`
pub async fn versions<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
) -> Result<Json<Vec<BidVersion>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let bid = visible(store.as_ref(), &caller, id).await?;
  if !access::can_view_history(&bid, &caller) {
    return Err(CoreError::Forbidden.into());
  }
  let log = store.bid_versions(id).await.map_err(ApiError::store)?;
  Ok(Json(log))
}

// ─── Decisions ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DecisionParams {
  pub decision: Decision,
}

/// `PUT /bids/{id}/submit_decision?decision=<decision>`
///
/// Returns the bid after the quorum has been recounted; its status moves to
/// `Approved` or `Rejected` once an outcome fires.
pub async fn submit_decision<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
  Query(params): Query<DecisionParams>,
) -> Result<Json<Bid>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let bid = visible(store.as_ref(), &caller, id).await?;
  let tender = store
    .list_tenders(&TenderFilter::visible_to(&caller).with_id(bid.tender_id))
    .await
    .map_err(ApiError::store)?
    .pop();

  let eligible = tender
    .as_ref()
    .is_some_and(|t| access::can_decide(&bid, t, &caller));
  if !eligible {
    let open = bid.status == BidStatus::Published
      && tender.is_some_and(|t| t.status == TenderStatus::Published);
    return Err(if open { CoreError::Forbidden } else { CoreError::BidNotFound(id) }.into());
  }

  let bid = store
    .submit_decision(id, caller.id, &caller.organization_ids, params.decision)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(bid))
}
