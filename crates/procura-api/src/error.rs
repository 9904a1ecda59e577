//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use procura_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] CoreError),
}

impl ApiError {
  /// Lift a backend error into the taxonomy.
  pub fn store(e: impl Into<CoreError>) -> Self { Self::Core(e.into()) }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Core(e) if e.is_not_found() => StatusCode::NOT_FOUND,
      ApiError::Core(e) => match e {
        CoreError::UserNotFound(_) => StatusCode::UNAUTHORIZED,
        CoreError::Forbidden => StatusCode::FORBIDDEN,
        CoreError::InvalidStatusChange(_) | CoreError::UnknownVariant(_) => {
          StatusCode::BAD_REQUEST
        }
        CoreError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "reason": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use procura_core::bid::BidStatus;

  use super::*;

  #[test]
  fn taxonomy_maps_to_status() {
    let cases = [
      (CoreError::UserNotFound("x".into()), StatusCode::UNAUTHORIZED),
      (CoreError::Forbidden, StatusCode::FORBIDDEN),
      (CoreError::TenderNotFound(uuid::Uuid::nil()), StatusCode::NOT_FOUND),
      (CoreError::BidNotFound(uuid::Uuid::nil()), StatusCode::NOT_FOUND),
      (CoreError::InvalidStatusChange(BidStatus::Approved), StatusCode::BAD_REQUEST),
      (
        CoreError::VersionNotFound { id: uuid::Uuid::nil(), version: 4 },
        StatusCode::NOT_FOUND,
      ),
      (CoreError::DeadlineExceeded, StatusCode::GATEWAY_TIMEOUT),
      (CoreError::Persistence("disk".into()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }
}
