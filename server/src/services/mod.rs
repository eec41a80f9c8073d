// techlab_server/src/services/mod.rs

pub mod auth_service;
pub mod export;
pub mod object_storage;
