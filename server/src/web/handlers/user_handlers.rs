// techlab_server/src/web/handlers/user_handlers.rs

//! Admin user management.

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::{is_valid_email, normalize_email, Role, User};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::AdminUser;

#[derive(Deserialize, Debug)]
pub struct CreateUserRequest {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  pub role: Option<Role>,
}

#[derive(Deserialize, Debug, Default)]
pub struct UpdateUserRequest {
  pub name: Option<String>,
  pub email: Option<String>,
  pub role: Option<Role>,
  pub password: Option<String>,
}

fn user_not_found() -> AppError {
  AppError::NotFound("Usuario no encontrado".to_string())
}

async fn ensure_email_free(state: &AppState, email: &str, owner: Option<Uuid>) -> Result<()> {
  match state.store.find_user_by_email(email).await? {
    Some(existing) if Some(existing.id) != owner => Err(AppError::Conflict("El usuario ya existe".to_string())),
    _ => Ok(()),
  }
}

pub async fn list_users_handler(app_state: web::Data<AppState>, _admin: AdminUser) -> Result<HttpResponse> {
  let users = app_state.store.list_users().await?;
  Ok(HttpResponse::Ok().json(users))
}

#[instrument(name = "handler::create_user", skip(app_state, payload, admin), fields(admin_id = %admin.0.id))]
pub async fn create_user_handler(
  app_state: web::Data<AppState>,
  admin: AdminUser,
  payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse> {
  let payload = payload.into_inner();
  let name = payload.name.trim().to_string();
  let email = normalize_email(&payload.email);
  if name.is_empty() || email.is_empty() || payload.password.is_empty() {
    return Err(AppError::Validation("Por favor, completa todos los campos".to_string()));
  }
  if !is_valid_email(&email) {
    return Err(AppError::Validation("El correo electrónico no es válido".to_string()));
  }
  ensure_email_free(&app_state, &email, None).await?;

  let hash = auth_service::hash_password(&payload.password)?;
  let user = User::new(name, email, hash, payload.role.unwrap_or(Role::Customer));
  app_state.store.insert_user(&user).await?;
  info!(user_id = %user.id, role = ?user.role, "Admin created a user.");
  Ok(HttpResponse::Created().json(user))
}

#[instrument(name = "handler::update_user", skip(app_state, payload, _admin, path), fields(user_id = %*path))]
pub async fn update_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
  payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse> {
  let user_id = path.into_inner();
  let payload = payload.into_inner();
  let mut user = app_state.store.find_user(user_id).await?.ok_or_else(user_not_found)?;

  if let Some(name) = payload.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
    user.name = name;
  }
  if let Some(email) = payload.email.map(|e| normalize_email(&e)).filter(|e| !e.is_empty()) {
    if !is_valid_email(&email) {
      return Err(AppError::Validation("El correo electrónico no es válido".to_string()));
    }
    ensure_email_free(&app_state, &email, Some(user.id)).await?;
    user.email = email;
  }
  if let Some(role) = payload.role {
    user.role = role;
  }
  if let Some(password) = payload.password.filter(|p| !p.is_empty()) {
    user.password_hash = auth_service::hash_password(&password)?;
  }
  user.updated_at = Utc::now();

  app_state.store.update_user(&user).await?;
  Ok(HttpResponse::Ok().json(user))
}

pub async fn delete_user_handler(
  app_state: web::Data<AppState>,
  _admin: AdminUser,
  path: web::Path<Uuid>,
) -> Result<HttpResponse> {
  let user_id = path.into_inner();
  if !app_state.store.delete_user(user_id).await? {
    return Err(user_not_found());
  }
  info!(%user_id, "User deleted.");
  Ok(HttpResponse::Ok().json(json!({ "message": "Usuario eliminado" })))
}
