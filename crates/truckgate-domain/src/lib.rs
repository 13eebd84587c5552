//! Domain layer: repository traits and plate format rules

pub mod repository;
pub mod service;
