// techlab_server/src/services/object_storage.rs

//! Image storage. Uploaded files land in a MinIO/S3 bucket under a generated
//! key; callers only ever keep the resulting public URL.

use crate::config::StorageConfig;
use crate::errors::{AppError, Result};
use crate::web::upload::UploadedFile;
use async_trait::async_trait;
use parking_lot::RwLock;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;
use s3::BucketConfiguration;
use std::collections::HashMap;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[async_trait]
pub trait ObjectStore: Send + Sync {
  async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
  fn public_url(&self, key: &str) -> String;
  /// Makes sure the bucket exists. Failures are logged, never fatal.
  async fn ensure_bucket(&self);
}

pub struct S3ObjectStore {
  bucket: Box<Bucket>,
  config: StorageConfig,
}

impl S3ObjectStore {
  pub fn new(config: &StorageConfig) -> Result<Self> {
    let bucket = Bucket::new(&config.bucket, Self::region(config), Self::credentials(config)?)
      .map_err(|e| AppError::Storage(e.to_string()))?
      .with_path_style();
    Ok(Self {
      bucket,
      config: config.clone(),
    })
  }

  fn region(config: &StorageConfig) -> Region {
    Region::Custom {
      region: "us-east-1".to_string(),
      endpoint: config.base_url(),
    }
  }

  fn credentials(config: &StorageConfig) -> Result<Credentials> {
    Credentials::new(
      config.access_key.as_deref(),
      config.secret_key.as_deref(),
      None,
      None,
      None,
    )
    .map_err(|e| AppError::Storage(e.to_string()))
  }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
  #[instrument(name = "object_store::put", skip(self, bytes), fields(size = bytes.len()), err(Display))]
  async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
    let response = self
      .bucket
      .put_object_with_content_type(key, &bytes, content_type)
      .await
      .map_err(|e| AppError::Storage(e.to_string()))?;
    let status = response.status_code();
    if !(200..300).contains(&status) {
      return Err(AppError::Storage(format!("Upload of '{}' returned status {}", key, status)));
    }
    Ok(())
  }

  fn public_url(&self, key: &str) -> String {
    self.config.public_url(key)
  }

  async fn ensure_bucket(&self) {
    let credentials = match Self::credentials(&self.config) {
      Ok(c) => c,
      Err(e) => {
        error!(error = %e, "Cannot build storage credentials.");
        return;
      }
    };
    match Bucket::create_with_path_style(
      &self.config.bucket,
      Self::region(&self.config),
      credentials,
      BucketConfiguration::default(),
    )
    .await
    {
      Ok(response) if response.success() => info!(bucket = %self.config.bucket, "Bucket created."),
      // 409: the bucket is already there.
      Ok(response) if response.response_code == 409 => info!(bucket = %self.config.bucket, "Bucket already exists."),
      Ok(response) => warn!(
        bucket = %self.config.bucket,
        status = response.response_code,
        body = %response.response_text,
        "Unexpected bucket creation response."
      ),
      Err(e) => error!(bucket = %self.config.bucket, error = %e, "Bucket setup failed."),
    }
  }
}

/// In-process object store used when no storage credentials are configured.
#[derive(Default)]
pub struct MemoryObjectStore {
  base_url: String,
  objects: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl MemoryObjectStore {
  pub fn new(config: &StorageConfig) -> Self {
    Self {
      base_url: format!("{}/{}", config.base_url(), config.bucket),
      objects: RwLock::new(HashMap::new()),
    }
  }

  /// Content type and bytes of a stored object.
  pub fn get(&self, key: &str) -> Option<(String, Vec<u8>)> {
    self.objects.read().get(key).cloned()
  }

  pub fn len(&self) -> usize {
    self.objects.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.read().is_empty()
  }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
  async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
    self
      .objects
      .write()
      .insert(key.to_string(), (content_type.to_string(), bytes));
    Ok(())
  }

  fn public_url(&self, key: &str) -> String {
    format!("{}/{}", self.base_url, key)
  }

  async fn ensure_bucket(&self) {}
}

/// Object key for an upload: `{prefix}{uuid}{.ext}`, the extension taken from
/// the client's file name.
pub fn object_key(prefix: &str, file_name: Option<&str>) -> String {
  let ext = file_name
    .and_then(|name| name.rsplit_once('.'))
    .map(|(_, ext)| ext)
    .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
    .unwrap_or_default();
  format!("{}{}{}", prefix, Uuid::new_v4(), ext)
}

/// Stores `file` and returns its public URL.
pub async fn store_image(objects: &dyn ObjectStore, prefix: &str, file: UploadedFile) -> Result<String> {
  let key = object_key(prefix, file.file_name.as_deref());
  objects.put_object(&key, file.bytes, &file.content_type).await?;
  Ok(objects.public_url(&key))
}
