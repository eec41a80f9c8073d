// techlab_server/src/web/extractors.rs

//! Capability extractors. A handler that takes one of these only runs for a
//! caller holding a valid bearer token (and, for the role-bound ones, the
//! right role).

use crate::errors::AppError;
use crate::models::{Role, User};
use crate::services::auth_service;
use crate::state::AppState;
use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

/// Any signed-in user.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// A signed-in user with the `admin` role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

/// A signed-in user with the `cliente` role.
#[derive(Debug, Clone)]
pub struct CustomerUser(pub User);

fn bearer_token(req: &HttpRequest) -> Result<String, AppError> {
  let header = req
    .headers()
    .get(AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or_else(|| AppError::Unauthorized("No autorizado, no hay token".to_string()))?;
  match header.strip_prefix("Bearer ") {
    Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
    _ => Err(AppError::Unauthorized("No autorizado, no hay token".to_string())),
  }
}

async fn resolve_user(state: Option<web::Data<AppState>>, token: Result<String, AppError>) -> Result<User, AppError> {
  let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
  let token = token?;
  let claims = auth_service::decode_token(&token, &state.config.jwt_secret)?;
  state.store.find_user(claims.sub).await?.ok_or_else(|| {
    warn!(user_id = %claims.sub, "Token refers to a user that no longer exists.");
    AppError::Unauthorized("No autorizado, token inválido".to_string())
  })
}

fn extract(req: &HttpRequest) -> LocalBoxFuture<'static, Result<User, AppError>> {
  let state = req.app_data::<web::Data<AppState>>().cloned();
  let token = bearer_token(req);
  Box::pin(resolve_user(state, token))
}

impl FromRequest for AuthUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user = extract(req);
    Box::pin(async move { user.await.map(AuthUser) })
  }
}

impl FromRequest for AdminUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user = extract(req);
    Box::pin(async move {
      let user = user.await?;
      if user.role != Role::Admin {
        return Err(AppError::Forbidden("No autorizado. Solo administradores.".to_string()));
      }
      Ok(AdminUser(user))
    })
  }
}

impl FromRequest for CustomerUser {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let user = extract(req);
    Box::pin(async move {
      let user = user.await?;
      if user.role != Role::Customer {
        return Err(AppError::Forbidden("No autorizado. Solo clientes.".to_string()));
      }
      Ok(CustomerUser(user))
    })
  }
}
