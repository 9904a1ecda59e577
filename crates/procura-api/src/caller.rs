//! The acting employee, resolved from the `username` query parameter.

use std::sync::Arc;

use axum::{
  extract::{FromRequestParts, Query},
  http::request::Parts,
};
use procura_core::employee::{Employee, EmployeeDirectory};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Default, Deserialize)]
struct UsernameParam {
  #[serde(default)]
  username: String,
}

/// Present in a handler means `?username=` named a known employee. A
/// missing or unknown username is rejected with `401`.
#[derive(Debug, Clone)]
pub struct Caller(pub Employee);

/// Look `username` up in the directory.
pub async fn resolve<S>(store: &S, username: &str) -> Result<Employee, ApiError>
where
  S: EmployeeDirectory,
  S::Error: Into<procura_core::Error>,
{
  store.employee_by_username(username).await.map_err(ApiError::store)
}

impl<S> FromRequestParts<Arc<S>> for Caller
where
  S: EmployeeDirectory + 'static,
  S::Error: Into<procura_core::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    store: &Arc<S>,
  ) -> Result<Self, Self::Rejection> {
    let Query(param) = Query::<UsernameParam>::try_from_uri(&parts.uri)
      .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    resolve(store.as_ref(), &param.username).await.map(Caller)
  }
}
