// techlab_server/src/state.rs

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{normalize_email, Role, User};
use crate::pipelines;
use crate::services::auth_service;
use crate::services::object_storage::{MemoryObjectStore, ObjectStore, S3ObjectStore};
use crate::store::{MemoryStore, PgStore, Store};
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use techlab_core::Registry;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
  pub store: Arc<dyn Store>,
  pub objects: Arc<dyn ObjectStore>,
  pub flows: Arc<Registry<AppError>>,
  pub config: Arc<AppConfig>,
}

impl AppState {
  /// Wires the shared services together and registers every pipeline.
  pub fn new(store: Arc<dyn Store>, objects: Arc<dyn ObjectStore>, config: AppConfig) -> Result<Self> {
    let state = Self {
      store,
      objects,
      flows: Arc::new(Registry::new()),
      config: Arc::new(config),
    };
    pipelines::register_all_pipelines(&state.flows)?;
    Ok(state)
  }

  /// In-process store and object store, for tests and database-less runs.
  pub fn in_memory(config: AppConfig) -> Result<Self> {
    let objects = Arc::new(MemoryObjectStore::new(&config.storage));
    Self::new(Arc::new(MemoryStore::new()), objects, config)
  }
}

/// Connects the configured backends, runs migrations, prepares the bucket
/// and seeds the admin account.
pub async fn bootstrap(config: AppConfig) -> anyhow::Result<AppState> {
  let store: Arc<dyn Store> = match config.database_url.as_deref() {
    Some(url) => {
      let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(url)
        .await
        .context("connecting to the database")?;
      let pg = PgStore::new(pool);
      pg.migrate().await.context("running database migrations")?;
      info!("Connected to Postgres and applied migrations.");
      Arc::new(pg)
    }
    None => {
      warn!("DATABASE_URL not set; data lives in memory and is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  let objects: Arc<dyn ObjectStore> = if config.storage.is_remote() {
    let s3 = S3ObjectStore::new(&config.storage).context("configuring object storage")?;
    Arc::new(s3)
  } else {
    warn!("Storage credentials not set; uploads are kept in memory.");
    Arc::new(MemoryObjectStore::new(&config.storage))
  };
  objects.ensure_bucket().await;

  let state = AppState::new(store, objects, config).context("registering pipelines")?;
  seed_admin(&state).await.context("seeding admin account")?;
  Ok(state)
}

async fn seed_admin(state: &AppState) -> Result<()> {
  let (Some(email), Some(password)) = (
    state.config.seed_admin_email.as_deref(),
    state.config.seed_admin_password.as_deref(),
  ) else {
    return Ok(());
  };

  let email = normalize_email(email);
  if state.store.find_user_by_email(&email).await?.is_some() {
    return Ok(());
  }

  let hash = auth_service::hash_password(password)?;
  let admin = User::new("Administrador".to_string(), email.clone(), hash, Role::Admin);
  state.store.insert_user(&admin).await?;
  info!(%email, "Seeded admin account.");
  Ok(())
}
