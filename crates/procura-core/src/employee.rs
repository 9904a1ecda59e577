//! Employees, as seen through the (externally owned) directory.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An employee and the organisations they belong to. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
  pub id:               Uuid,
  pub username:         String,
  pub organization_ids: Vec<Uuid>,
}

impl Employee {
  pub fn belongs_to(&self, organization_id: Uuid) -> bool {
    self.organization_ids.contains(&organization_id)
  }
}

/// Resolves the acting user for the orchestration layer.
pub trait EmployeeDirectory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up an employee by username, with their organisation
  /// memberships. A miss is reported as
  /// [`Error::UserNotFound`](crate::Error::UserNotFound).
  fn employee_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + 'a;
}
