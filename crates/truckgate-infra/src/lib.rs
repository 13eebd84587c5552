//! Infrastructure layer - record store implementations and camera capture

pub mod camera;
pub mod persistence;
