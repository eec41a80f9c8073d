// techlab_server/src/web/handlers/profile_handlers.rs

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use tracing::{info, instrument};

use crate::errors::{AppError, Result};
use crate::models::{is_valid_email, normalize_email};
use crate::services::auth_service;
use crate::services::object_storage::store_image;
use crate::state::AppState;
use crate::web::extractors::AuthUser;
use crate::web::upload::read_form;

pub async fn get_profile_handler(AuthUser(user): AuthUser) -> HttpResponse {
  HttpResponse::Ok().json(user)
}

/// Partial update from a multipart form. Absent fields are left alone; a
/// present but blank name or nickname is rejected.
#[instrument(name = "handler::update_profile", skip_all, fields(user_id = %auth.0.id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  auth: AuthUser,
  payload: Multipart,
) -> Result<HttpResponse> {
  let AuthUser(mut user) = auth;
  let form = read_form(payload, "profilePicture", app_state.config.max_upload_bytes).await?;
  let field = |key: &str| form.fields.get(key).map(|v| v.trim().to_string());

  if let Some(name) = field("name") {
    if name.is_empty() {
      return Err(AppError::Validation("El nombre no puede estar vacío.".to_string()));
    }
    user.name = name;
  }

  if let Some(email) = field("email").filter(|e| !e.is_empty()) {
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
      return Err(AppError::Validation("El email debe ser válido.".to_string()));
    }
    if email != user.email {
      if app_state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("Este email ya está registrado.".to_string()));
      }
      user.email = email;
    }
  }

  if let Some(nickname) = field("nickname") {
    if nickname.is_empty() {
      return Err(AppError::Validation("El nickname no puede estar vacío.".to_string()));
    }
    if user.nickname.as_deref() != Some(nickname.as_str()) {
      if app_state.store.find_user_by_nickname(&nickname).await?.is_some() {
        return Err(AppError::Conflict("Este nickname ya está en uso.".to_string()));
      }
      user.nickname = Some(nickname);
    }
  }

  if let Some(password) = form.fields.get("password").filter(|p| !p.is_empty()) {
    user.password_hash = auth_service::hash_password(password)?;
  }

  if let Some(file) = form.file {
    let prefix = format!("profile-{}-", user.id);
    user.profile_picture = Some(store_image(app_state.objects.as_ref(), &prefix, file).await?);
  }

  user.updated_at = Utc::now();
  app_state.store.update_user(&user).await?;
  info!("Profile updated.");
  Ok(HttpResponse::Ok().json(user))
}
