//! Handlers for `/tenders` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/tenders` | Optional `service_type`, `limit`, `offset` |
//! | `GET`   | `/tenders/my` | Tenders the caller created |
//! | `POST`  | `/tenders/new` | Body: [`CreateBody`] |
//! | `GET`   | `/tenders/{id}/status` | Plain-text status |
//! | `PUT`   | `/tenders/{id}/status` | `?status=Published` |
//! | `PATCH` | `/tenders/{id}/edit` | Body: sparse [`TenderPatch`] |
//! | `PUT`   | `/tenders/{id}/rollback/{version}` | New version copying `version` |
//! | `GET`   | `/tenders/{id}/versions` | Version log, members only |
//!
//! Every endpoint except creation takes the acting user as `?username=`.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use procura_core::{
  Error as CoreError, access,
  employee::{Employee, EmployeeDirectory},
  store::{Page, ProcurementStore},
  tender::{
    NewTender, ServiceType, Tender, TenderFilter, TenderPatch, TenderStatus,
    TenderVersion,
  },
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  PageParams,
  caller::{Caller, resolve},
  error::ApiError,
};

/// The tender `id` if `caller` may see it.
pub(crate) async fn visible<S>(
  store: &S,
  caller: &Employee,
  id: Uuid,
) -> Result<Tender, ApiError>
where
  S: ProcurementStore,
  S::Error: Into<CoreError>,
{
  store
    .list_tenders(&TenderFilter::visible_to(caller).with_id(id))
    .await
    .map_err(ApiError::store)?
    .pop()
    .ok_or(ApiError::Core(CoreError::TenderNotFound(id)))
}

/// The tender `id` if `caller` may see it and is its creator.
async fn owned<S>(store: &S, caller: &Employee, id: Uuid) -> Result<Tender, ApiError>
where
  S: ProcurementStore,
  S::Error: Into<CoreError>,
{
  let tender = visible(store, caller, id).await?;
  if !access::can_mutate(&tender, caller) {
    return Err(CoreError::Forbidden.into());
  }
  Ok(tender)
}

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(alias = "serviceType")]
  pub service_type: Option<ServiceType>,
  pub limit:        Option<u32>,
  pub offset:       Option<u32>,
}

/// `GET /tenders[?service_type=...][&limit=..][&offset=..]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Tender>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let filter = TenderFilter {
    service_type: params.service_type,
    page: Page::new(params.offset, params.limit),
    ..TenderFilter::visible_to(&caller)
  };
  let tenders = store.list_tenders(&filter).await.map_err(ApiError::store)?;
  Ok(Json(tenders))
}

/// `GET /tenders/my[?limit=..][&offset=..]`
pub async fn mine<S>(
  State(store): State<Arc<S>>,
  Caller(caller): Caller,
  Query(page): Query<PageParams>,
) -> Result<Json<Vec<Tender>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let filter = TenderFilter {
    creator_id: Some(caller.id),
    page: page.page(),
    ..TenderFilter::visible_to(&caller)
  };
  let tenders = store.list_tenders(&filter).await.map_err(ApiError::store)?;
  Ok(Json(tenders))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /tenders/new`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub name:             String,
  #[serde(default)]
  pub description:      String,
  pub service_type:     ServiceType,
  pub organization_id:  Uuid,
  pub creator_username: String,
}

/// `POST /tenders/new` — the creator must belong to `organizationId`.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<Tender>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let caller = resolve(store.as_ref(), &body.creator_username).await?;
  if !access::can_create_for(body.organization_id, &caller) {
    return Err(CoreError::Forbidden.into());
  }

  let tender = store
    .create_tender(NewTender {
      name:            body.name,
      description:     body.description,
      service_type:    body.service_type,
      organization_id: body.organization_id,
      creator_id:      caller.id,
    })
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tender))
}

// ─── Status ───────────────────────────────────────────────────────────────────

/// `GET /tenders/{id}/status`
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
  let tender = visible(store.as_ref(), &caller, id).await?;
  Ok(tender.status.to_string())
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
  pub status: TenderStatus,
}

/// `PUT /tenders/{id}/status?status=<status>`
pub async fn set_status<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
  Query(params): Query<StatusParams>,
) -> Result<Json<Tender>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  owned(store.as_ref(), &caller, id).await?;
  let tender = store
    .update_tender(id, caller.id, TenderPatch::status(params.status))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tender))
}

// ─── Edit ─────────────────────────────────────────────────────────────────────

/// `PATCH /tenders/{id}/edit` — absent fields are left untouched.
pub async fn edit<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
  Json(patch): Json<TenderPatch>,
) -> Result<Json<Tender>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  owned(store.as_ref(), &caller, id).await?;
  let tender = store
    .update_tender(id, caller.id, patch)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tender))
}

// ─── Versions ─────────────────────────────────────────────────────────────────

/// `PUT /tenders/{id}/rollback/{version}`
pub async fn rollback<S>(
  State(store): State<Arc<S>>,
  Path((id, version)): Path<(Uuid, u32)>,
  Caller(caller): Caller,
) -> Result<Json<Tender>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  owned(store.as_ref(), &caller, id).await?;
  let tender = store
    .rollback_tender(id, version, caller.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(tender))
}

/// `GET /tenders/{id}/versions`
pub async fn versions<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  Caller(caller): Caller,
) -> Result<Json<Vec<TenderVersion>>, ApiError>
where
  S: ProcurementStore + EmployeeDirectory,
  <S as ProcurementStore>::Error: Into<CoreError>,
  <S as EmployeeDirectory>::Error: Into<CoreError>,
{
  let tender = visible(store.as_ref(), &caller, id).await?;
  if !access::can_view_history(&tender, &caller) {
    return Err(CoreError::Forbidden.into());
  }
  let log = store.tender_versions(id).await.map_err(ApiError::store)?;
  Ok(Json(log))
}
