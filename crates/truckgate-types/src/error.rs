//! Error types for truckgate

use crate::{RecordId, TruckStatus};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration not found")]
    NotFound,

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Failed to save configuration: {0}")]
    SaveError(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// Camera capture errors
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No camera configured (set CAMERA_URL or camera_url)")]
    NotConfigured,

    #[error("Camera capture failed: {0}")]
    NoFrame(String),
}

/// Failures of the vision inference call itself.
///
/// An answer that simply contains no plate is not an error; see `PlateReading`.
#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("No API key configured for the vision service (set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("Cannot reach vision service at {0}")]
    Connection(String),

    #[error("Vision request timed out after {0}s")]
    Timeout(u64),

    #[error("Vision service rejected credentials (HTTP {0})")]
    Unauthorized(u16),

    #[error("Vision service error (HTTP {status}): {body}")]
    Service { status: u16, body: String },

    #[error("Malformed vision response: {0}")]
    MalformedResponse(String),
}

/// Record store errors
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Record store unavailable: {0}")]
    Unavailable(String),

    #[error("Record store rejected write: {0}")]
    Rejected(String),

    #[error("Record store data corrupted: {0}")]
    Corrupted(String),
}

/// Announcement artifact errors
#[derive(Debug, Error)]
pub enum AnnouncementError {
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Local speech failed: {0}")]
    LocalSpeech(String),

    #[error("Audio artifact IO error: {0}")]
    Io(String),
}

/// Recognition cache errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache data corrupted: {0}")]
    Corrupted(String),

    #[error("Cache IO error: {0}")]
    IoError(String),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Plate recognition failed: {0}")]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Announcement error: {0}")]
    Announcement(#[from] AnnouncementError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Truck record {0} not found")]
    NotFound(RecordId),

    #[error("Truck record {id} is already {status}")]
    InvalidTransition { id: RecordId, status: TruckStatus },

    #[error("Truck {truck_number} (record {id}) was admitted but its announcement failed: {source}")]
    AnnouncementFailed {
        id: RecordId,
        truck_number: String,
        #[source]
        source: AnnouncementError,
    },

    #[error("All fields required: missing {0}")]
    MissingDocument(&'static str),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Intake failed: {0}")]
    IntakeFailed(String),
}

pub type Result<T> = std::result::Result<T, Error>;
