//! A small WHERE-clause builder for the list queries.
//!
//! Only column names from this crate are ever interpolated; every value is
//! bound as a positional `?` parameter.

use rusqlite::types::Value;

#[derive(Default)]
pub struct Conditions {
  clauses: Vec<String>,
  params:  Vec<Value>,
}

impl Conditions {
  /// Add a raw clause together with the values for its placeholders.
  pub fn push(&mut self, clause: impl Into<String>, params: impl IntoIterator<Item = Value>) {
    self.clauses.push(clause.into());
    self.params.extend(params);
  }

  pub fn eq(&mut self, column: &str, value: Option<impl Into<Value>>) {
    if let Some(v) = value {
      self.push(format!("{column} = ?"), [v.into()]);
    }
  }

  /// `column IN (...)`; skipped when `values` is empty.
  pub fn any_of<V: Into<Value>>(&mut self, column: &str, values: impl IntoIterator<Item = V>) {
    let values: Vec<Value> = values.into_iter().map(Into::into).collect();
    if !values.is_empty() {
      self.push(format!("{column} IN ({})", placeholders(values.len())), values);
    }
  }

  /// Render as `WHERE a AND b ...` (or nothing) and hand back the params.
  pub fn finish(self) -> (String, Vec<Value>) {
    let sql = if self.clauses.is_empty() {
      String::new()
    } else {
      format!("WHERE {}", self.clauses.join(" AND "))
    };
    (sql, self.params)
  }
}

/// `?, ?, ?` with `n` placeholders.
pub fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }
