// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use techlab_core::{ContextData, FlowError, Handler, PipelineControl};
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct OrderDraft {
  pub lines: Vec<(String, u32)>,
  pub total_cents: i64,
  pub steps_executed: Vec<String>,
  pub stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("flow error: {0}")]
  Flow(String),

  #[error("step rejected input: {0}")]
  Rejected(String),
}

impl From<FlowError> for TestError {
  fn from(err: FlowError) -> Self {
    TestError::Flow(format!("{:?}", err))
  }
}

/// Records the step name and adds `cents` to the draft total.
pub fn add_to_total(step_name: &'static str, cents: i64) -> Handler<OrderDraft, TestError> {
  Box::new(move |ctx: ContextData<OrderDraft>| {
    Box::pin(async move {
      let mut draft = ctx.write();
      draft.total_cents += cents;
      draft.steps_executed.push(step_name.to_string());
      if draft.stop_at.as_deref() == Some(step_name) {
        return Ok(PipelineControl::Stop);
      }
      Ok(PipelineControl::Continue)
    })
  })
}

pub fn reject(step_name: &'static str, reason: &'static str) -> Handler<OrderDraft, TestError> {
  Box::new(move |ctx: ContextData<OrderDraft>| {
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name.to_string());
      Err(TestError::Rejected(reason.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
