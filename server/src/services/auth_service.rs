// techlab_server/src/services/auth_service.rs

//! Password hashing and bearer-token issuance.

use crate::config::AppConfig;
use crate::errors::AppError;
use argon2::{
  password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};
use uuid::Uuid;

/// Token payload: the user id and its validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: Uuid,
  pub iat: i64,
  pub exp: i64,
}

#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    return Err(AppError::Validation("La contraseña es requerida".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(hash) => Ok(hash.to_string()),
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing failed: {}", argon_err)))
    }
  }
}

/// `Ok(false)` on a mismatch; errors only when the stored hash is unreadable.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Stored password hash is malformed.");
    AppError::Internal(format!("Invalid stored password hash: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password mismatch.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 verification failed.");
      Err(AppError::Internal(format!("Password verification failed: {}", other)))
    }
  }
}

#[instrument(name = "auth_service::issue_token", skip(config), fields(%user_id), err(Display))]
pub fn issue_token(user_id: Uuid, config: &AppConfig) -> Result<String, AppError> {
  let now = Utc::now();
  let claims = Claims {
    sub: user_id,
    iat: now.timestamp(),
    exp: (now + Duration::days(config.jwt_ttl_days)).timestamp(),
  };
  encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
  )
  .map_err(|e| AppError::Internal(format!("Token encoding failed: {}", e)))
}

/// Signature and expiry are both checked; any failure is a 401.
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
  decode::<Claims>(
    token,
    &DecodingKey::from_secret(secret.as_bytes()),
    &Validation::default(),
  )
  .map(|data| data.claims)
  .map_err(|e| {
    debug!(error = %e, "Rejected bearer token.");
    AppError::Unauthorized("No autorizado, token inválido".to_string())
  })
}
