//! Domain services

pub mod plate_format;

pub use plate_format::{extract_plate, normalize_response, PLATE_PATTERN};
