// techlab_core/src/error.rs
use thiserror::Error;

/// Framework-level failures raised while building or running a pipeline.
#[derive(Debug, Error)]
pub enum FlowError {
  #[error("step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("step already defined: {step_name}")]
  DuplicateStep { step_name: String },

  #[error("handler missing for required step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("no pipeline registered for context type {type_name}")]
  NotRegistered { type_name: String },

  #[error("context type mismatch, expected {expected_type}")]
  TypeMismatch { expected_type: String },

  #[error("handler failed: {source}")]
  Handler {
    #[source]
    source: anyhow::Error,
  },
}

impl From<anyhow::Error> for FlowError {
  fn from(source: anyhow::Error) -> Self {
    FlowError::Handler { source }
  }
}

pub type FlowResult<T, E = FlowError> = std::result::Result<T, E>;
