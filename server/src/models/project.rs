// techlab_server/src/models/project.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(rename = "user")]
  pub user_id: Uuid,
  /// Author name when the comment was posted; later renames do not touch it.
  pub name: String,
  pub text: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
  #[serde(rename = "_id")]
  pub id: Uuid,
  #[serde(rename = "user")]
  pub user_id: Uuid,
  #[sqlx(default)]
  #[serde(skip_serializing_if = "Option::is_none")]
  pub author_name: Option<String>,
  pub title: String,
  pub description: String,
  pub image: Option<String>,
  pub likes: Vec<Uuid>,
  pub comments: Json<Vec<Comment>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Project {
  pub fn new(user_id: Uuid, title: String, description: String, image: Option<String>) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id,
      author_name: None,
      title,
      description,
      image,
      likes: Vec::new(),
      comments: Json(Vec::new()),
      created_at: now,
      updated_at: now,
    }
  }

  /// Adds or removes `user_id` from the like set. Returns whether the user now likes the project.
  pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
    if let Some(pos) = self.likes.iter().position(|id| *id == user_id) {
      self.likes.remove(pos);
      false
    } else {
      self.likes.push(user_id);
      true
    }
  }

  pub fn add_comment(&mut self, user_id: Uuid, author_name: &str, text: &str) -> Result<Comment> {
    let text = text.trim();
    if text.is_empty() {
      return Err(AppError::Validation("El texto del comentario es requerido".to_string()));
    }
    let comment = Comment {
      id: Uuid::new_v4(),
      user_id,
      name: author_name.to_string(),
      text: text.to_string(),
      created_at: Utc::now(),
    };
    self.comments.push(comment.clone());
    Ok(comment)
  }
}
