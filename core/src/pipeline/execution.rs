// techlab_core/src/pipeline/execution.rs
use super::definition::{Handler, Pipeline};
use crate::context_data::ContextData;
use crate::control::{PipelineControl, PipelineResult};
use crate::error::FlowError;
use tracing::{event, instrument, Instrument, Level};

impl<T, E> Pipeline<T, E>
where
  T: Send + Sync + 'static,
  E: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// A step whose `skip_if` holds is passed over. A step without handlers is
  /// skipped when optional and fails with [`FlowError::HandlerMissing`]
  /// otherwise. The first handler error aborts the run.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(context_type = %std::any::type_name::<T>(), num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx: ContextData<T>) -> Result<PipelineResult, E> {
    for (step_index, step) in self.steps.iter().enumerate() {
      let step_name = step.name.as_str();

      if let Some(skip_if) = &step.skip_if {
        if skip_if(&ctx) {
          event!(Level::DEBUG, step_name, "Step skipped by condition.");
          continue;
        }
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];

      if phases.iter().all(|(_, handlers)| handlers.map_or(true, Vec::is_empty)) {
        if step.optional {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step_name, "Required step has no handlers.");
        return Err(E::from(FlowError::HandlerMissing {
          step_name: step.name.clone(),
        }));
      }

      let span = tracing::info_span!("pipeline_step", step_name, step_index);
      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        if Self::run_phase(handlers, &ctx, phase).instrument(span.clone()).await? == PipelineControl::Stop {
          event!(Level::INFO, step_name, phase, "Pipeline stopped by handler.");
          return Ok(PipelineResult::Stopped);
        }
      }
    }

    Ok(PipelineResult::Completed)
  }

  async fn run_phase(handlers: &[Handler<T, E>], ctx: &ContextData<T>, phase: &str) -> Result<PipelineControl, E> {
    for handler in handlers {
      match handler(ctx.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return Ok(PipelineControl::Stop),
        Err(e) => {
          event!(Level::WARN, phase, error = %e, "Handler failed.");
          return Err(e);
        }
      }
    }
    Ok(PipelineControl::Continue)
  }
}
