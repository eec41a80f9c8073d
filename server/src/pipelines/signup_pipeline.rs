// techlab_server/src/pipelines/signup_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::{is_valid_email, normalize_email, Role, User};
use crate::pipelines::contexts::SignupCtxData;
use crate::services::auth_service;
use techlab_core::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{event, info, instrument, warn, Level};

pub fn register_signup_pipeline(flows: &Registry<AppError>) -> Result<()> {
  let mut signup_p = Pipeline::<SignupCtxData, AppError>::new(&[
    ("validate_signup_input", false, None),
    ("check_existing_user_signup", false, None),
    ("create_user_signup", false, None),
    ("issue_token_signup", false, None),
  ]);

  signup_p.on("validate_signup_input", validate_signup_input)?;
  signup_p.on("check_existing_user_signup", check_existing_user)?;
  signup_p.on("create_user_signup", create_user)?;
  signup_p.on("issue_token_signup", |ctx: ContextData<SignupCtxData>| async move {
    let (user_id, state) = {
      let guard = ctx.read();
      (guard.created_user.as_ref().map(|u| u.id), guard.app_state.clone())
    };
    let user_id = user_id.ok_or_else(|| AppError::Internal("Signup reached token issue without a user.".to_string()))?;
    let token = auth_service::issue_token(user_id, &state.config)?;
    ctx.write().token = Some(token);
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  flows.register(signup_p);
  info!("Sign-up pipeline registered.");
  Ok(())
}

async fn validate_signup_input(ctx: ContextData<SignupCtxData>) -> Result<PipelineControl> {
  let (name, email, password_empty) = {
    let guard = ctx.read();
    (guard.name.trim().to_string(), normalize_email(&guard.email), guard.password.is_empty())
  };

  if name.is_empty() || email.is_empty() || password_empty {
    return Err(AppError::Validation("Por favor, completa todos los campos".to_string()));
  }
  if !is_valid_email(&email) {
    warn!(%email, "Malformed email on signup.");
    return Err(AppError::Validation("El correo electrónico no es válido".to_string()));
  }

  {
    let mut guard = ctx.write();
    guard.name = name;
    guard.email = email;
  }
  Ok(PipelineControl::Continue)
}

async fn check_existing_user(ctx: ContextData<SignupCtxData>) -> Result<PipelineControl> {
  let (email, state) = {
    let guard = ctx.read();
    (guard.email.clone(), guard.app_state.clone())
  };

  event!(Level::DEBUG, %email, "Checking whether the email is taken.");
  if state.store.find_user_by_email(&email).await?.is_some() {
    warn!(%email, "Signup with an existing email.");
    return Err(AppError::Conflict("El usuario ya existe".to_string()));
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "signup::create_user", skip(ctx), err(Display))]
async fn create_user(ctx: ContextData<SignupCtxData>) -> Result<PipelineControl> {
  let (name, email, password, requested_role, state) = {
    let guard = ctx.read();
    (
      guard.name.clone(),
      guard.email.clone(),
      guard.password.clone(),
      guard.requested_role.clone(),
      guard.app_state.clone(),
    )
  };

  let role = Role::for_self_registration(requested_role.as_deref());
  let hash = auth_service::hash_password(&password)?;
  let user = User::new(name, email, hash, role);
  state.store.insert_user(&user).await?;
  info!(user_id = %user.id, role = ?user.role, "User registered.");

  ctx.write().created_user = Some(user);
  Ok(PipelineControl::Continue)
}
