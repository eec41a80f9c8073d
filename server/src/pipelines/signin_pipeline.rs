// techlab_server/src/pipelines/signin_pipeline.rs

use crate::errors::{AppError, Result};
use crate::models::normalize_email;
use crate::pipelines::contexts::SigninCtxData;
use crate::services::auth_service;
use techlab_core::{ContextData, Pipeline, PipelineControl, Registry};
use tracing::{info, warn};

fn invalid_credentials() -> AppError {
  AppError::Validation("Credenciales inválidas".to_string())
}

pub fn register_signin_pipeline(flows: &Registry<AppError>) -> Result<()> {
  let mut signin_p = Pipeline::<SigninCtxData, AppError>::new(&[
    ("validate_signin_input", false, None),
    ("fetch_user_signin", false, None),
    ("verify_password_signin", false, None),
    ("issue_token_signin", false, None),
  ]);

  signin_p.on("validate_signin_input", |ctx: ContextData<SigninCtxData>| async move {
    let mut guard = ctx.write();
    let email = normalize_email(&guard.email);
    guard.email = email;
    if guard.email.is_empty() || guard.password.is_empty() {
      return Err(invalid_credentials());
    }
    Ok(PipelineControl::Continue)
  })?;

  signin_p.on("fetch_user_signin", |ctx: ContextData<SigninCtxData>| async move {
    let (email, state) = {
      let guard = ctx.read();
      (guard.email.clone(), guard.app_state.clone())
    };
    let Some(user) = state.store.find_user_by_email(&email).await? else {
      warn!(%email, "Sign-in for unknown email.");
      return Err(invalid_credentials());
    };
    ctx.write().user = Some(user);
    Ok(PipelineControl::Continue)
  })?;

  signin_p.on("verify_password_signin", |ctx: ContextData<SigninCtxData>| async move {
    let guard = ctx.read();
    let hash = guard.user.as_ref().map(|u| u.password_hash.as_str()).unwrap_or_default();
    if !auth_service::verify_password(hash, &guard.password)? {
      warn!(email = %guard.email, "Sign-in with a wrong password.");
      return Err(invalid_credentials());
    }
    Ok(PipelineControl::Continue)
  })?;

  signin_p.on("issue_token_signin", |ctx: ContextData<SigninCtxData>| async move {
    let (user_id, state) = {
      let guard = ctx.read();
      (guard.user.as_ref().map(|u| u.id), guard.app_state.clone())
    };
    let user_id = user_id.ok_or_else(invalid_credentials)?;
    let token = auth_service::issue_token(user_id, &state.config)?;
    ctx.write().token = Some(token);
    info!(%user_id, "User signed in.");
    Ok::<_, AppError>(PipelineControl::Continue)
  })?;

  flows.register(signin_p);
  info!("Sign-in pipeline registered.");
  Ok(())
}
