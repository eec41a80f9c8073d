// techlab_server/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role")]
pub enum Role {
  #[serde(rename = "cliente")]
  #[sqlx(rename = "cliente")]
  Customer,
  #[serde(rename = "escuela")]
  #[sqlx(rename = "escuela")]
  School,
  #[serde(rename = "admin")]
  #[sqlx(rename = "admin")]
  Admin,
}

impl Role {
  /// Role granted on public registration. Only `escuela` may be requested;
  /// anything else, including `admin`, falls back to customer.
  pub fn for_self_registration(requested: Option<&str>) -> Role {
    match requested.map(str::trim) {
      Some("escuela") => Role::School,
      _ => Role::Customer,
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
  #[serde(rename = "_id")]
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub role: Role,
  pub nickname: Option<String>,
  pub profile_picture: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn new(name: String, email: String, password_hash: String, role: Role) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      name,
      email,
      password_hash,
      role,
      nickname: None,
      profile_picture: None,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
