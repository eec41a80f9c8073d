// techlab_server/src/web/handlers/quote_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::quote::QuoteRequest;
use crate::models::QuoteStatus;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct QuoteStatusRequest {
  pub status: QuoteStatus,
}

#[instrument(name = "handler::create_quote", skip_all, fields(service_id = %payload.service_id))]
pub async fn create_quote_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<QuoteRequest>,
) -> Result<HttpResponse> {
  let request = payload.into_inner();
  request.validate()?;

  if app_state.store.find_service(request.service_id).await?.is_none() {
    return Err(AppError::NotFound("Servicio no encontrado.".to_string()));
  }

  let quote = request.into_quote();
  app_state.store.insert_quote(&quote).await?;
  info!(quote_id = %quote.id, "Quote request stored.");
  Ok(HttpResponse::Created().json(json!({ "message": "Solicitud de cotización enviada con éxito." })))
}

#[instrument(name = "handler::list_quotes", skip_all)]
pub async fn list_quotes_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(app_state.store.list_quotes().await?))
}

#[instrument(name = "handler::update_quote_status", skip(app_state, _admin, path, payload), fields(quote_id = %path.as_ref(), status = ?payload.status))]
pub async fn update_quote_status_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<QuoteStatusRequest>,
) -> Result<HttpResponse> {
  let quote = app_state
    .store
    .update_quote_status(path.into_inner(), payload.status)
    .await?
    .ok_or_else(|| AppError::NotFound("Cotización no encontrada".to_string()))?;
  info!("Quote status updated.");
  Ok(HttpResponse::Ok().json(quote))
}
