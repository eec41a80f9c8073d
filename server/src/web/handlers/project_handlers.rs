// techlab_server/src/web/handlers/project_handlers.rs

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, FieldError, Result};
use crate::models::Project;
use crate::services::object_storage::store_image;
use crate::state::AppState;
use crate::web::extractors::{AdminUser, AuthUser};
use crate::web::upload::read_form;

const IMAGE_PREFIX: &str = "project-";

#[derive(Deserialize, Debug)]
pub struct CommentRequest {
  #[serde(default)]
  pub text: String,
}

fn not_found() -> AppError {
  AppError::NotFound("Proyecto no encontrado".to_string())
}

fn non_blank(value: Option<&String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub async fn list_projects_handler(app_state: web::Data<AppState>) -> Result<HttpResponse> {
  Ok(HttpResponse::Ok().json(app_state.store.list_projects().await?))
}

pub async fn get_project_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse> {
  let project = app_state.store.find_project(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(project))
}

#[instrument(name = "handler::create_project", skip_all, fields(admin_id = %admin.0.id))]
pub async fn create_project_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: Multipart,
) -> Result<HttpResponse> {
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;
  let title = non_blank(form.fields.get("title"));
  let description = non_blank(form.fields.get("description"));

  let (Some(title), Some(description)) = (title.clone(), description.clone()) else {
    let mut errors = Vec::new();
    if title.is_none() {
      errors.push(FieldError::new("title", "El título es requerido."));
    }
    if description.is_none() {
      errors.push(FieldError::new("description", "La descripción es requerida."));
    }
    return Err(AppError::FieldErrors(errors));
  };

  let image = match form.file {
    Some(file) => Some(store_image(app_state.objects.as_ref(), IMAGE_PREFIX, file).await?),
    None => None,
  };
  let project = Project::new(admin.0.id, title, description, image);
  app_state.store.insert_project(&project).await?;
  info!(project_id = %project.id, "Project created.");

  let created = app_state.store.find_project(project.id).await?.unwrap_or(project);
  Ok(HttpResponse::Created().json(created))
}

#[instrument(name = "handler::update_project", skip(app_state, _admin, path, payload), fields(project_id = %path.as_ref()))]
pub async fn update_project_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: Multipart,
) -> Result<HttpResponse> {
  let mut project = app_state.store.find_project(path.into_inner()).await?.ok_or_else(not_found)?;
  let form = read_form(payload, "image", app_state.config.max_upload_bytes).await?;

  if let Some(title) = non_blank(form.fields.get("title")) {
    project.title = title;
  }
  if let Some(description) = non_blank(form.fields.get("description")) {
    project.description = description;
  }
  if let Some(file) = form.file {
    project.image = Some(store_image(app_state.objects.as_ref(), IMAGE_PREFIX, file).await?);
  }
  project.updated_at = Utc::now();

  app_state.store.update_project(&project).await?;
  Ok(HttpResponse::Ok().json(project))
}

pub async fn delete_project_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  if !app_state.store.delete_project(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(HttpResponse::Ok().json(json!({ "message": "Proyecto eliminado" })))
}

#[instrument(name = "handler::like_project", skip(app_state, user, path), fields(user_id = %user.0.id, project_id = %path.as_ref()))]
pub async fn like_project_handler(
  app_state: web::Data<AppState>,
  user: AuthUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let project = app_state
    .store
    .toggle_project_like(path.into_inner(), user.0.id)
    .await?
    .ok_or_else(not_found)?;
  Ok(HttpResponse::Ok().json(project))
}

/// Appends a comment carrying a snapshot of the commenter's current name.
#[instrument(name = "handler::comment_project", skip(app_state, user, path, payload), fields(user_id = %user.0.id, project_id = %path.as_ref()))]
pub async fn comment_project_handler(
  app_state: web::Data<AppState>,
  user: AuthUser,
  path: web::Path<Uuid>,
  payload: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
  let project_id = path.into_inner();
  let mut project = app_state.store.find_project(project_id).await?.ok_or_else(not_found)?;
  let comment = project.add_comment(user.0.id, &user.0.name, &payload.text)?;

  let project = app_state
    .store
    .add_project_comment(project_id, &comment)
    .await?
    .ok_or_else(not_found)?;
  Ok(HttpResponse::Created().json(project))
}
