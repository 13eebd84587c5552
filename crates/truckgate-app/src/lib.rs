//! Application service layer - use cases, config, wiring

pub mod app;
pub mod config;
pub mod repository;
