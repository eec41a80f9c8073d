// techlab_server/src/lib.rs

//! TechLab Solutions backend: catalog, cart, checkout and community feed
//! served over a JSON REST API.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;

pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use state::AppState;
