//! Vision module - license plate recognition through a vision inference service

pub mod ai;
pub mod cache;

pub use ai::backend_impl::OpenAiVisionBackend;
pub use ai::prompts::PLATE_INSTRUCTION;
pub use ai::{ImagePayload, VisionBackend};
pub use cache::Cache;

use std::sync::Arc;
use truckgate_domain::service::extract_plate;
use truckgate_types::{PlateReading, Result};

/// Turns a captured image into a plate reading
pub trait PlateRecognition: Send + Sync {
    /// Infrastructure failures are errors; an unreadable plate is
    /// `PlateReading::Unrecognized`.
    fn recognize(&self, image: &[u8]) -> Result<PlateReading>;
}

/// Plate recognizer backed by a vision service, with an optional cache
pub struct PlateRecognizer {
    backend: Arc<dyn VisionBackend>,
    cache: Option<Cache>,
}

impl PlateRecognizer {
    pub fn new(backend: Arc<dyn VisionBackend>) -> Self {
        Self { backend, cache: None }
    }

    pub fn with_cache(mut self, cache: Cache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn cached(&self, image: &[u8]) -> Option<PlateReading> {
        let cache = self.cache.as_ref()?;
        match cache.get(image) {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }
}

impl PlateRecognition for PlateRecognizer {
    fn recognize(&self, image: &[u8]) -> Result<PlateReading> {
        if let Some(reading) = self.cached(image) {
            tracing::debug!(truck_number = reading.truck_number(), "using cached plate reading");
            return Ok(reading);
        }

        let payload = ImagePayload::new(image);
        let text = self.backend.complete(PLATE_INSTRUCTION, &payload)?;
        let reading = extract_plate(&text);

        match &reading {
            PlateReading::Recognized { plate } => tracing::info!(plate = %plate, "plate recognized"),
            PlateReading::Unrecognized { raw } => {
                tracing::warn!(response = %raw, "no plate in vision response, recording UNKNOWN")
            }
        }

        // An unreadable frame may still be read on the next attempt.
        if let (Some(cache), PlateReading::Recognized { plate }) = (&self.cache, &reading) {
            if let Err(e) = cache.set_plate(image, plate) {
                tracing::warn!(error = %e, "failed to cache plate reading");
            }
        }

        Ok(reading)
    }
}
