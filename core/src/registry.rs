// techlab_core/src/registry.rs

//! Type-keyed registry: one pipeline per context type.

use crate::context_data::ContextData;
use crate::control::PipelineResult;
use crate::error::FlowError;
use crate::pipeline::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, Level};

#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync {
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct Runner<T, PE, AppErr>
where
  T: Send + Sync + 'static,
  PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<T, PE>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<T, PE, AppErr> ErasedRunner<AppErr> for Runner<T, PE, AppErr>
where
  T: Send + Sync + 'static,
  PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: From<PE> + From<FlowError> + Send + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let ctx = ctx.downcast::<ContextData<T>>().map_err(|_| {
      AppErr::from(FlowError::TypeMismatch {
        expected_type: std::any::type_name::<ContextData<T>>().to_string(),
      })
    })?;
    self.pipeline.run(*ctx).await.map_err(AppErr::from)
  }
}

/// Holds the application's pipelines and dispatches runs by context type.
pub struct Registry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Default for Registry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Registry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for context type `T`, replacing any previous one.
  pub fn register<T, PE>(&self, pipeline: Pipeline<T, PE>)
  where
    T: Send + Sync + 'static,
    PE: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<PE>,
  {
    event!(Level::DEBUG, context_type = %std::any::type_name::<T>(), steps = ?pipeline.step_names(), "Registering pipeline.");
    let runner = Runner::<T, PE, AppErr> {
      pipeline,
      _app_err: PhantomData,
    };
    self.runners.write().insert(TypeId::of::<T>(), Arc::new(runner));
  }

  pub fn contains<T: Send + Sync + 'static>(&self) -> bool {
    self.runners.read().contains_key(&TypeId::of::<T>())
  }

  pub fn len(&self) -> usize {
    self.runners.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.runners.read().is_empty()
  }

  /// Runs the pipeline registered for `T`.
  pub async fn run<T: Send + Sync + 'static>(&self, ctx: ContextData<T>) -> Result<PipelineResult, AppErr> {
    let runner = self.runners.read().get(&TypeId::of::<T>()).cloned();
    let Some(runner) = runner else {
      let type_name = std::any::type_name::<T>();
      event!(Level::ERROR, context_type = %type_name, "No pipeline registered.");
      return Err(AppErr::from(FlowError::NotRegistered {
        type_name: type_name.to_string(),
      }));
    };
    runner.run_erased(Box::new(ctx)).await
  }
}
