// techlab_core/src/lib.rs

//! Async step pipelines for multi-step business flows.
//!
//! A [`Pipeline`] is an ordered list of named steps. Each step carries
//! `before`, `on` and `after` handlers that operate on a shared
//! [`ContextData`] and decide whether the run continues or stops.
//! A [`Registry`] keys pipelines by their context type so application
//! code only needs the context to dispatch a run.
//!
//! Lock guards taken from `ContextData` are blocking and must be dropped
//! before any `.await` inside a handler.

pub mod context_data;
pub mod control;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod step;

pub use crate::context_data::ContextData;
pub use crate::control::{PipelineControl, PipelineResult};
pub use crate::error::{FlowError, FlowResult};
pub use crate::pipeline::{Handler, Pipeline};
pub use crate::registry::Registry;
pub use crate::step::{SkipCondition, StepDef};
