// techlab_core/src/pipeline/hooks.rs

//! Handler registration. Closures may fail with any error convertible
//! into the pipeline's error type.

use super::definition::{Handler, Pipeline};
use crate::context_data::ContextData;
use crate::control::PipelineControl;
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, Level};

#[derive(Clone, Copy, Debug)]
enum Phase {
  Before,
  On,
  After,
}

fn boxed<T, E, F, HE>(handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static) -> Handler<T, E>
where
  T: Send + Sync + 'static,
  F: Future<Output = Result<PipelineControl, HE>> + Send + 'static,
  HE: Into<E> + Send + 'static,
  E: 'static,
{
  Box::new(move |ctx| {
    let fut = handler_fn(ctx);
    Box::pin(async move { fut.await.map_err(Into::into) })
  })
}

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn phase_map(&mut self, phase: Phase) -> &mut HashMap<String, Vec<Handler<T, E>>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }

  fn push_handler(&mut self, phase: Phase, step_name: &str, handler: Handler<T, E>) -> FlowResult<()> {
    self.position(step_name)?;
    self.phase_map(phase).entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, step_name, ?phase, "Handler registered.");
    Ok(())
  }

  pub fn before<F, HE>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<PipelineControl, HE>> + Send + 'static,
    HE: Into<E> + Send + 'static,
  {
    self.push_handler(Phase::Before, step_name, boxed(handler_fn))
  }

  /// Registers the main handler of a step. A step may have several; they run in registration order.
  pub fn on<F, HE>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<PipelineControl, HE>> + Send + 'static,
    HE: Into<E> + Send + 'static,
  {
    self.push_handler(Phase::On, step_name, boxed(handler_fn))
  }

  pub fn after<F, HE>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<T>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<PipelineControl, HE>> + Send + 'static,
    HE: Into<E> + Send + 'static,
  {
    self.push_handler(Phase::After, step_name, boxed(handler_fn))
  }
}
