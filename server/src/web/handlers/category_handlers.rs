// techlab_server/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::Category;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct CategoryRequest {
  pub name: Option<String>,
  pub description: Option<String>,
}

fn not_found() -> AppError {
  AppError::NotFound("Categoría no encontrada".to_string())
}

async fn ensure_name_free(state: &AppState, name: &str, owner: Option<Uuid>) -> Result<()> {
  match state.store.find_category_by_name(name).await? {
    Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict("La categoría ya existe".to_string())),
    _ => Ok(()),
  }
}

pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(app_state.store.list_categories().await?))
}

pub async fn get_category_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let category = app_state.store.find_category(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(category))
}

pub async fn create_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let name = payload.name.map(|n| n.trim().to_string()).unwrap_or_default();
  if name.is_empty() {
    return Err(AppError::Validation("El nombre de la categoría es requerido".to_string()));
  }
  ensure_name_free(&app_state, &name, None).await?;

  let category = Category::new(name, payload.description);
  app_state.store.insert_category(&category).await?;
  tracing::info!(category_id = %category.id, "Category created.");
  Ok(HttpResponse::Created().json(category))
}

pub async fn update_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<CategoryRequest>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let mut category = app_state.store.find_category(path.into_inner()).await?.ok_or_else(not_found)?;

  if let Some(name) = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
    ensure_name_free(&app_state, &name, Some(category.id)).await?;
    category.name = name;
  }
  if payload.description.is_some() {
    category.description = payload.description;
  }
  category.updated_at = Utc::now();

  app_state.store.update_category(&category).await?;
  Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if !app_state.store.delete_category(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Categoría eliminada" })))
}
