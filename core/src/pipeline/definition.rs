// techlab_core/src/pipeline/definition.rs
use crate::context_data::ContextData;
use crate::control::PipelineControl;
use crate::error::{FlowError, FlowResult};
use crate::step::{SkipCondition, StepDef};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// A boxed async step handler. Built by `Pipeline::before`/`on`/`after`
/// from plain closures, so callers rarely name this type.
pub type Handler<T, E> =
  Box<dyn Fn(ContextData<T>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, E>> + Send>> + Send + Sync>;

/// Ordered, named steps over a context `T`, failing with `E`.
pub struct Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<T>>,
  pub(crate) before: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) on: HashMap<String, Vec<Handler<T, E>>>,
  pub(crate) after: HashMap<String, Vec<Handler<T, E>>>,
}

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Builds a pipeline from `(name, optional, skip_if)` triples. Names must be unique.
  pub fn new(step_defs: &[(&str, bool, Option<SkipCondition<T>>)]) -> Self {
    let steps: Vec<StepDef<T>> = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();
    debug_assert!(
      steps
        .iter()
        .enumerate()
        .all(|(i, s)| steps[..i].iter().all(|p| p.name != s.name)),
      "duplicate step names"
    );

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn position(&self, step_name: &str) -> FlowResult<usize> {
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  fn ensure_absent(&self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      return Err(FlowError::DuplicateStep {
        step_name: step_name.to_string(),
      });
    }
    Ok(())
  }

  pub fn insert_before(&mut self, existing: &str, step: StepDef<T>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(&step.name)?;
    self.steps.insert(idx, step);
    Ok(())
  }

  pub fn insert_after(&mut self, existing: &str, step: StepDef<T>) -> FlowResult<()> {
    let idx = self.position(existing)?;
    self.ensure_absent(&step.name)?;
    self.steps.insert(idx + 1, step);
    Ok(())
  }

  /// Removes a step and its handlers. Returns `false` if no such step existed.
  pub fn remove_step(&mut self, step_name: &str) -> bool {
    let Ok(idx) = self.position(step_name) else {
      return false;
    };
    self.steps.remove(idx);
    self.before.remove(step_name);
    self.on.remove(step_name);
    self.after.remove(step_name);
    true
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.position(step_name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<T>>) -> FlowResult<()> {
    let idx = self.position(step_name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }
}
