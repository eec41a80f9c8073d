// techlab_core/src/pipeline/mod.rs

mod definition;
mod execution;
mod hooks;

pub use definition::{Handler, Pipeline};
