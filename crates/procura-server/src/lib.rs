//! Procura HTTP server: configuration and the top-level router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::Router;
use config::{ConfigError, Environment, File, Source};
use procura_store_sqlite::SqliteStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PROCURA_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:             String,
  pub port:             u16,
  pub store_path:       PathBuf,
  /// Upper bound on each write transaction. Unset means no deadline.
  #[serde(default)]
  pub write_timeout_ms: Option<u64>,
}

impl ServerConfig {
  /// Load from the TOML file at `path` (optional) layered under the
  /// environment.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::from_source(File::from(path).required(false))
  }

  fn from_source<S>(file: S) -> Result<Self, ConfigError>
  where
    S: Source + Send + Sync + 'static,
  {
    config::Config::builder()
      .set_default("host", "127.0.0.1")?
      .set_default("port", 8080_i64)?
      .set_default("store_path", "procura.db")?
      .add_source(file)
      .add_source(Environment::with_prefix("PROCURA"))
      .build()?
      .try_deserialize()
  }

  pub fn write_timeout(&self) -> Option<Duration> {
    self.write_timeout_ms.map(Duration::from_millis)
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The API mounted under `/api`, with request tracing.
pub fn router(store: SqliteStore) -> Router {
  Router::new()
    .nest("/api", procura_api::api_router(Arc::new(store)))
    .layer(TraceLayer::new_for_http())
}
