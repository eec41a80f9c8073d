// techlab_server/src/web/handlers/search_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  pub q: Option<String>,
}

#[instrument(name = "handler::search", skip(app_state))]
pub async fn search_handler(app_state: web::Data<AppState>, query: web::Query<SearchQuery>) -> Result<HttpResponse> {
  let needle = query.q.as_deref().map(str::trim).unwrap_or_default();
  if needle.is_empty() {
    return Err(AppError::Validation("El término de búsqueda es requerido".to_string()));
  }

  let products = app_state.store.search_products(needle).await?;
  let services = app_state.store.search_services(needle).await?;
  info!(products = products.len(), services = services.len(), "Search served.");
  Ok(HttpResponse::Ok().json(json!({ "products": products, "services": services })))
}
