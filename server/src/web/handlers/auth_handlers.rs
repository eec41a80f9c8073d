// techlab_server/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use techlab_core::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Role, User};
use crate::pipelines::contexts::{SigninCtxData, SignupCtxData};
use crate::state::AppState;
use crate::web::extractors::AuthUser;

#[derive(Deserialize, Debug)]
pub struct RegisterRequest {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
  pub role: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

#[derive(Serialize, Debug)]
pub struct AuthResponse {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub role: Role,
  pub token: String,
}

impl AuthResponse {
  fn new(user: &User, token: String) -> Self {
    Self {
      id: user.id,
      name: user.name.clone(),
      email: user.email.clone(),
      role: user.role,
      token,
    }
  }
}

#[instrument(name = "handler::register", skip(app_state, payload), fields(email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(SignupCtxData::new(
    app_state.get_ref().clone(),
    payload.name,
    payload.email,
    payload.password,
    payload.role,
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx.read();
      match (guard.created_user.as_ref(), guard.token.clone()) {
        (Some(user), Some(token)) => {
          info!(user_id = %user.id, "Registration complete.");
          Ok(HttpResponse::Created().json(AuthResponse::new(user, token)))
        }
        _ => Err(AppError::Internal("Registration finished without a user or token.".to_string())),
      }
    }
    Ok(PipelineResult::Stopped) => {
      warn!("Sign-up pipeline was stopped by a handler.");
      Err(AppError::PipelineHalted)
    }
    Err(e) => Err(e),
  }
}

#[instrument(name = "handler::login", skip(app_state, payload), fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
  let payload = payload.into_inner();
  let ctx = ContextData::new(SigninCtxData::new(
    app_state.get_ref().clone(),
    payload.email,
    payload.password,
  ));

  match app_state.flows.run(ctx.clone()).await {
    Ok(PipelineResult::Completed) => {
      let guard = ctx.read();
      match (guard.user.as_ref(), guard.token.clone()) {
        (Some(user), Some(token)) => Ok(HttpResponse::Ok().json(AuthResponse::new(user, token))),
        _ => Err(AppError::Internal("Sign-in finished without a user or token.".to_string())),
      }
    }
    Ok(PipelineResult::Stopped) => Err(AppError::PipelineHalted),
    Err(e) => Err(e),
  }
}

pub async fn me_handler(AuthUser(user): AuthUser) -> HttpResponse {
  HttpResponse::Ok().json(user)
}
