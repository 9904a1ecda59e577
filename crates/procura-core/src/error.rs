//! Error taxonomy shared by every layer.
//!
//! "Not found" deliberately covers both a missing row and a row owned by
//! somebody else; callers cannot tell the two apart.

use thiserror::Error;
use uuid::Uuid;

use crate::bid::BidStatus;

#[derive(Debug, Error)]
pub enum Error {
  #[error("tender not found: {0}")]
  TenderNotFound(Uuid),

  #[error("bid not found: {0}")]
  BidNotFound(Uuid),

  #[error("version {version} not found for {id}")]
  VersionNotFound { id: Uuid, version: u32 },

  #[error("user not found: {0:?}")]
  UserNotFound(String),

  #[error("insufficient rights to perform the action")]
  Forbidden,

  #[error("bid status {0} is set only by the decision quorum")]
  InvalidStatusChange(BidStatus),

  #[error("unknown variant: {0:?}")]
  UnknownVariant(String),

  #[error("deadline exceeded; transaction rolled back")]
  DeadlineExceeded,

  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// True for every "no matching row" variant.
  pub fn is_not_found(&self) -> bool {
    matches!(
      self,
      Self::TenderNotFound(_) | Self::BidNotFound(_) | Self::VersionNotFound { .. }
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
