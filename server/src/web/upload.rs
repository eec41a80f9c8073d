// techlab_server/src/web/upload.rs

//! Multipart form reading for the catalog, profile and project forms.

use crate::errors::{AppError, Result};
use actix_multipart::{Field, Multipart, MultipartError};
use futures_util::TryStreamExt;
use std::collections::HashMap;
use tracing::{debug, warn};

const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct UploadedFile {
  pub file_name: Option<String>,
  pub content_type: String,
  pub bytes: Vec<u8>,
}

/// Text fields of a form plus the single file part it may carry.
#[derive(Debug, Default)]
pub struct MultipartForm {
  pub fields: HashMap<String, String>,
  pub file: Option<UploadedFile>,
}

impl From<MultipartError> for AppError {
  fn from(err: MultipartError) -> Self {
    AppError::Validation(format!("Formulario inválido: {}", err))
  }
}

async fn read_limited(field: &mut Field, limit: usize, too_large: &str) -> Result<Vec<u8>> {
  let mut buf = Vec::new();
  while let Some(chunk) = field.try_next().await? {
    if buf.len() + chunk.len() > limit {
      return Err(AppError::Validation(too_large.to_string()));
    }
    buf.extend_from_slice(&chunk);
  }
  Ok(buf)
}

/// Reads the whole form. Only the part named `file_field` is treated as a
/// file; it must be an `image/*` of at most `max_file_bytes`.
pub async fn read_form(mut payload: Multipart, file_field: &str, max_file_bytes: usize) -> Result<MultipartForm> {
  let mut form = MultipartForm::default();

  while let Some(mut field) = payload.try_next().await? {
    let Some(name) = field.name().map(str::to_string) else {
      continue;
    };

    if name == file_field {
      let file_name = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string);
      let content_type = field.content_type().map(|m| m.essence_str().to_string());

      // An empty file input still sends a nameless part.
      if file_name.as_deref().map_or(true, str::is_empty) {
        read_limited(&mut field, max_file_bytes, "La imagen supera el tamaño máximo permitido.").await?;
        continue;
      }

      let content_type = match content_type {
        Some(ct) if ct.starts_with("image/") => ct,
        other => {
          warn!(field = %name, content_type = ?other, "Rejected non-image upload.");
          return Err(AppError::Validation(
            "El archivo no es una imagen. Solo se permiten tipos de archivo de imagen.".to_string(),
          ));
        }
      };

      let bytes = read_limited(&mut field, max_file_bytes, "La imagen supera el tamaño máximo permitido.").await?;
      debug!(field = %name, size = bytes.len(), %content_type, "Received file part.");
      form.file = Some(UploadedFile {
        file_name,
        content_type,
        bytes,
      });
    } else {
      let bytes = read_limited(&mut field, MAX_TEXT_FIELD_BYTES, "Campo de formulario demasiado grande.").await?;
      let value = String::from_utf8(bytes)
        .map_err(|_| AppError::Validation(format!("El campo '{}' no es texto válido.", name)))?;
      form.fields.insert(name, value);
    }
  }

  Ok(form)
}
