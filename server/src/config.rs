// techlab_server/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Plain,
  Json,
}

impl LogFormat {
  /// `json` selects JSON lines; anything else is plain text.
  pub fn parse(raw: Option<&str>) -> Self {
    match raw.map(str::trim) {
      Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
      _ => LogFormat::Plain,
    }
  }
}

/// MinIO / S3 connection settings. Uploads go to an in-process store
/// unless both keys are set.
#[derive(Debug, Clone)]
pub struct StorageConfig {
  pub endpoint: String,
  pub port: u16,
  pub use_ssl: bool,
  pub access_key: Option<String>,
  pub secret_key: Option<String>,
  pub bucket: String,
}

impl StorageConfig {
  pub fn is_remote(&self) -> bool {
    self.access_key.is_some() && self.secret_key.is_some()
  }

  pub fn base_url(&self) -> String {
    let scheme = if self.use_ssl { "https" } else { "http" };
    format!("{}://{}:{}", scheme, self.endpoint, self.port)
  }

  /// Public URL of an object: `{scheme}://{host}:{port}/{bucket}/{key}`.
  pub fn public_url(&self, key: &str) -> String {
    format!("{}/{}/{}", self.base_url(), self.bucket, key)
  }
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self {
      endpoint: "localhost".to_string(),
      port: 9000,
      use_ssl: false,
      access_key: None,
      secret_key: None,
      bucket: "techlab".to_string(),
    }
  }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// Without a database URL the server runs on the in-memory store.
  pub database_url: Option<String>,
  pub jwt_secret: String,
  pub jwt_ttl_days: i64,
  pub storage: StorageConfig,
  pub max_upload_bytes: usize,
  pub seed_admin_email: Option<String>,
  pub seed_admin_password: Option<String>,
  pub log_format: LogFormat,
}

impl AppConfig {
  /// Local defaults around a signing secret.
  pub fn new(jwt_secret: impl Into<String>) -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 5000,
      database_url: None,
      jwt_secret: jwt_secret.into(),
      jwt_ttl_days: 30,
      storage: StorageConfig::default(),
      max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
      seed_admin_email: None,
      seed_admin_password: None,
      log_format: LogFormat::Plain,
    }
  }

  pub fn from_env() -> Result<Self> {
    dotenv().ok();

    let get_env = |var_name: &str| {
      env::var(var_name).map_err(|e| AppError::Config(format!("Missing environment variable '{}': {}", var_name, e)))
    };
    let opt_env = |var_name: &str| env::var(var_name).ok().filter(|v| !v.trim().is_empty());
    fn parse<T: std::str::FromStr>(var_name: &str, raw: String) -> Result<T>
    where
      T::Err: std::fmt::Display,
    {
      raw
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {}: {}", var_name, e)))
    }

    let mut config = Self::new(get_env("JWT_SECRET")?);

    if let Some(host) = opt_env("SERVER_HOST") {
      config.server_host = host;
    }
    if let Some(port) = opt_env("SERVER_PORT") {
      config.server_port = parse("SERVER_PORT", port)?;
    }
    config.database_url = opt_env("DATABASE_URL");
    if let Some(days) = opt_env("JWT_TTL_DAYS") {
      config.jwt_ttl_days = parse("JWT_TTL_DAYS", days)?;
    }

    if let Some(endpoint) = opt_env("MINIO_ENDPOINT") {
      config.storage.endpoint = endpoint;
    }
    if let Some(port) = opt_env("MINIO_PORT") {
      config.storage.port = parse("MINIO_PORT", port)?;
    }
    if let Some(use_ssl) = opt_env("MINIO_USE_SSL") {
      config.storage.use_ssl = parse("MINIO_USE_SSL", use_ssl)?;
    }
    if let Some(bucket) = opt_env("MINIO_BUCKET_NAME") {
      config.storage.bucket = bucket;
    }
    config.storage.access_key = opt_env("MINIO_ACCESS_KEY");
    config.storage.secret_key = opt_env("MINIO_SECRET_KEY");

    if let Some(limit) = opt_env("MAX_UPLOAD_BYTES") {
      config.max_upload_bytes = parse("MAX_UPLOAD_BYTES", limit)?;
    }
    config.seed_admin_email = opt_env("SEED_ADMIN_EMAIL");
    config.seed_admin_password = opt_env("SEED_ADMIN_PASSWORD");
    config.log_format = LogFormat::parse(opt_env("LOG_FORMAT").as_deref());

    tracing::info!(
      database = config.database_url.is_some(),
      remote_storage = config.storage.is_remote(),
      "Application configuration loaded."
    );
    Ok(config)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn public_url_follows_scheme_host_port_bucket_key() {
    let mut storage = StorageConfig::default();
    assert_eq!(storage.public_url("a.png"), "http://localhost:9000/techlab/a.png");

    storage.use_ssl = true;
    storage.endpoint = "cdn.techlab.test".into();
    storage.port = 443;
    assert_eq!(storage.public_url("x/y.jpg"), "https://cdn.techlab.test:443/techlab/x/y.jpg");
  }

  #[test]
  fn log_format_defaults_to_plain() {
    assert_eq!(LogFormat::parse(Some("JSON")), LogFormat::Json);
    assert_eq!(LogFormat::parse(Some("pretty")), LogFormat::Plain);
    assert_eq!(LogFormat::parse(None), LogFormat::Plain);
  }

  #[test]
  fn storage_is_remote_only_with_both_keys() {
    let mut storage = StorageConfig::default();
    storage.access_key = Some("minio".into());
    assert!(!storage.is_remote());
    storage.secret_key = Some("secret".into());
    assert!(storage.is_remote());
  }
}
