//! Vision inference backends and prompts

pub mod backend_impl;
pub mod prompts;

use truckgate_types::RecognitionError;

/// A vision-capable inference service: one instruction plus one image in,
/// free text out. Parsing of the text belongs to the recognizer.
pub trait VisionBackend: Send + Sync {
    fn complete(&self, instruction: &str, image: &ImagePayload<'_>) -> Result<String, RecognitionError>;
}

/// Image bytes with their sniffed MIME type
#[derive(Debug, Clone, Copy)]
pub struct ImagePayload<'a> {
    pub bytes: &'a [u8],
    pub mime: &'static str,
}

impl<'a> ImagePayload<'a> {
    /// Sniff the format from the bytes; unknown data is sent as JPEG
    pub fn new(bytes: &'a [u8]) -> Self {
        let mime = match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => "image/png",
            Ok(image::ImageFormat::WebP) => "image/webp",
            Ok(image::ImageFormat::Bmp) => "image/bmp",
            _ => "image/jpeg",
        };
        Self { bytes, mime }
    }

    /// `data:` URL with base64 payload
    pub fn data_url(&self) -> String {
        use base64::Engine;
        let encoded = base64::engine::general_purpose::STANDARD.encode(self.bytes);
        format!("data:{};base64,{}", self.mime, encoded)
    }
}
