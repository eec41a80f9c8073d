// techlab_server/src/web/handlers/service_handlers.rs

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::service::ServicePatch;
use crate::models::Service;
use crate::services::object_storage::store_image;
use crate::state::AppState;
use crate::web::extractors::AdminUser;
use crate::web::upload::read_form;

#[derive(Deserialize, Debug)]
pub struct ListServicesQuery {
  pub category: Option<String>,
}

fn not_found() -> AppError {
  AppError::NotFound("Servicio no encontrado".to_string())
}

pub async fn list_services_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListServicesQuery>,
) -> Result<HttpResponse> {
  let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
  Ok(HttpResponse::Ok().json(app_state.store.list_services(category).await?))
}

pub async fn get_service_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let service = app_state.store.find_service(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(service))
}

#[instrument(name = "handler::create_service", skip_all)]
pub async fn create_service_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: Multipart,
) -> Result<HttpResponse> {
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;
  let patch = ServicePatch::from_form(&form.fields)?;
  // Reject before touching storage.
  let mut service = Service::create(patch, None)?;
  if let Some(file) = form.file {
    service.image = Some(store_image(app_state.objects.as_ref(), "", file).await?);
  }
  app_state.store.insert_service(&service).await?;
  info!(service_id = %service.id, category = ?service.category, "Service created.");
  Ok(HttpResponse::Created().json(service))
}

#[instrument(name = "handler::update_service", skip(app_state, _admin, payload, path), fields(service_id = %path.as_ref()))]
pub async fn update_service_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: Multipart,
) -> Result<HttpResponse> {
  let mut service = app_state.store.find_service(path.into_inner()).await?.ok_or_else(not_found)?;
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;
  let patch = ServicePatch::from_form(&form.fields)?;

  if let Some(file) = form.file {
    service.image = Some(store_image(app_state.objects.as_ref(), "", file).await?);
  }
  service.apply(patch);
  app_state.store.update_service(&service).await?;
  Ok(HttpResponse::Ok().json(service))
}

pub async fn delete_service_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if !app_state.store.delete_service(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Servicio eliminado" })))
}
