//! Grab a plate frame from the gate camera into the upload directory

use std::path::PathBuf;

use truckgate_infra::camera::FrameSource;
use truckgate_store::DocumentStore;
use truckgate_types::Result;

pub struct CaptureService {
    source: Box<dyn FrameSource>,
    documents: DocumentStore,
}

impl CaptureService {
    pub fn new(source: Box<dyn FrameSource>, documents: DocumentStore) -> Self {
        Self { source, documents }
    }

    /// Capture one frame and return where it was saved.
    ///
    /// Nothing is written when the camera yields no frame.
    pub fn capture(&self) -> Result<PathBuf> {
        let frame = self.source.grab_frame()?;
        let path = self.documents.save_frame(&frame)?;
        tracing::info!(path = %path.display(), bytes = frame.len(), "plate frame captured");
        Ok(path)
    }
}
