// tests/common/mod.rs
#![allow(dead_code)]

use actix_web::http::header::{self, HeaderName};
use once_cell::sync::Lazy;
use techlab_server::config::AppConfig;
use techlab_server::models::product::ProductPatch;
use techlab_server::models::service::ServicePatch;
use techlab_server::models::{Product, Role, Service, ServiceCategory, User};
use techlab_server::services::auth_service;
use techlab_server::services::object_storage::MemoryObjectStore;
use techlab_server::store::MemoryStore;
use std::sync::Arc;
use techlab_server::AppState;
use tracing::Level;

pub const PASSWORD: &str = "password123";
pub const BOUNDARY: &str = "techlab-test-boundary";

/// Builds the full route table around `$state` and initializes it as a test service.
#[allow(unused_macros)]
macro_rules! test_app {
  ($state:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($state.clone()))
        .configure(techlab_server::web::configure_app_routes),
    )
    .await
  };
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

pub fn test_state() -> AppState {
  setup_tracing();
  AppState::in_memory(AppConfig::new("integration-test-secret")).expect("state builds")
}

/// Same as [`test_state`] but keeps a handle on the object store for inspection.
pub fn test_state_with_objects() -> (AppState, Arc<MemoryObjectStore>) {
  setup_tracing();
  let config = AppConfig::new("integration-test-secret");
  let objects = Arc::new(MemoryObjectStore::new(&config.storage));
  let state = AppState::new(Arc::new(MemoryStore::new()), objects.clone(), config).expect("state builds");
  (state, objects)
}

/// Inserts a user with [`PASSWORD`] and returns it with a valid token.
pub async fn seed_user(state: &AppState, name: &str, email: &str, role: Role) -> (User, String) {
  let hash = auth_service::hash_password(PASSWORD).unwrap();
  let user = User::new(name.to_string(), email.to_string(), hash, role);
  state.store.insert_user(&user).await.unwrap();
  let token = auth_service::issue_token(user.id, &state.config).unwrap();
  (user, token)
}

pub async fn seed_customer(state: &AppState) -> (User, String) {
  seed_user(state, "Camila Cliente", "camila@techlab.test", Role::Customer).await
}

pub async fn seed_admin(state: &AppState) -> (User, String) {
  seed_user(state, "Andrés Admin", "admin@techlab.test", Role::Admin).await
}

pub async fn seed_product(state: &AppState, name: &str, price_cents: i64, stock: i32) -> Product {
  seed_product_described(state, name, &format!("{} de prueba", name), price_cents, stock).await
}

pub async fn seed_product_described(
  state: &AppState,
  name: &str,
  description: &str,
  price_cents: i64,
  stock: i32,
) -> Product {
  let product = Product::create(
    ProductPatch {
      name: Some(name.to_string()),
      description: Some(description.to_string()),
      price_cents: Some(price_cents),
      sku: Some(format!("SKU-{}", name.to_uppercase().replace(' ', "-"))),
      stock: Some(stock),
      category: Some("Electrónica".to_string()),
      specs: None,
    },
    None,
  )
  .unwrap();
  state.store.insert_product(&product).await.unwrap();
  product
}

pub async fn seed_service(state: &AppState, name: &str, description: &str) -> Service {
  let service = Service::create(
    ServicePatch {
      name: Some(name.to_string()),
      description: Some(description.to_string()),
      price_cents: Some(150_000),
      category: Some(ServiceCategory::Printing3d),
      availability: None,
    },
    None,
  )
  .unwrap();
  state.store.insert_service(&service).await.unwrap();
  service
}

pub fn bearer(token: &str) -> (HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}

/// A `multipart/form-data` body with text fields and at most one file part.
/// Returns the content-type header value and the body.
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &str, &[u8])>) -> (String, Vec<u8>) {
  let mut body = Vec::new();
  for (name, value) in fields {
    body.extend_from_slice(
      format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
      )
      .as_bytes(),
    );
  }
  if let Some((field, file_name, content_type, bytes)) = file {
    body.extend_from_slice(
      format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        BOUNDARY, field, file_name, content_type
      )
      .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
  }
  body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
  (format!("multipart/form-data; boundary={}", BOUNDARY), body)
}
