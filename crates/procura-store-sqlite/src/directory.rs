//! Employee directory lookups over `employee` / `organization_employee`.

use chrono::Utc;
use procura_core::employee::{Employee, EmployeeDirectory};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Error, Result, SqliteStore,
  encode::{decode_uuid, encode_dt, encode_uuid},
};

fn employee_by_username(conn: &Connection, username: &str) -> Result<Employee> {
  let id: String = conn
    .query_row(
      "SELECT id FROM employee WHERE username = ?1",
      params![username],
      |r| r.get(0),
    )
    .optional()?
    .ok_or_else(|| procura_core::Error::UserNotFound(username.to_owned()))?;

  let mut stmt = conn.prepare(
    "SELECT organization_id FROM organization_employee
     WHERE employee_id = ?1
     ORDER BY organization_id",
  )?;
  let orgs = stmt
    .query_map(params![id], |r| r.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok(Employee {
    id:               decode_uuid(&id)?,
    username:         username.to_owned(),
    organization_ids: orgs.iter().map(|o| decode_uuid(o)).collect::<Result<_>>()?,
  })
}

impl EmployeeDirectory for SqliteStore {
  type Error = Error;

  async fn employee_by_username(&self, username: &str) -> Result<Employee> {
    let username = username.to_owned();
    self.read(move |conn| employee_by_username(conn, &username)).await
  }
}

impl SqliteStore {
  /// Provision an employee and their memberships.
  ///
  /// The directory is owned by another system in production; this exists
  /// for seeding and tests.
  pub async fn add_employee(
    &self,
    username: &str,
    organization_ids: &[Uuid],
  ) -> Result<Employee> {
    let employee = Employee {
      id:               Uuid::new_v4(),
      username:         username.to_owned(),
      organization_ids: organization_ids.to_vec(),
    };
    let record = employee.clone();

    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO employee (id, username, created_at) VALUES (?1, ?2, ?3)",
          params![encode_uuid(record.id), record.username, encode_dt(Utc::now())],
        )?;
        for org in &record.organization_ids {
          tx.execute(
            "INSERT INTO organization_employee (organization_id, employee_id)
             VALUES (?1, ?2)",
            params![encode_uuid(*org), encode_uuid(record.id)],
          )?;
        }
        Ok(())
      })
      .await?;

    Ok(employee)
  }
}
