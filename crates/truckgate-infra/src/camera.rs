//! Still-frame capture from the gate camera

use std::process::Command;
use truckgate_types::CaptureError;

/// Grabs one frame from a stream URL and writes it as MJPEG to stdout.
pub const DEFAULT_CAPTURE_COMMAND: &str =
    "ffmpeg -hide_banner -loglevel error -i {url} -frames:v 1 -f image2pipe -vcodec mjpeg -";

/// Supplies single still frames on demand
pub trait FrameSource: Send + Sync {
    fn grab_frame(&self) -> Result<Vec<u8>, CaptureError>;
}

/// Runs a capture command and reads the encoded frame from its stdout.
///
/// Every `{url}` in the command line is replaced with the camera URL.
#[derive(Debug)]
pub struct CommandFrameSource {
    program: String,
    args: Vec<String>,
}

impl CommandFrameSource {
    /// `NotConfigured` when no camera URL is set
    pub fn new(camera_url: Option<&str>, command: &str) -> Result<Self, CaptureError> {
        let url = match camera_url.map(str::trim) {
            Some(url) if !url.is_empty() => url,
            _ => return Err(CaptureError::NotConfigured),
        };

        let mut parts = shell_words::split(command)
            .map_err(|e| CaptureError::NoFrame(format!("invalid capture command: {}", e)))?;
        if parts.is_empty() {
            return Err(CaptureError::NoFrame("capture command is empty".to_string()));
        }

        let program = parts.remove(0);
        let args = parts.into_iter().map(|a| a.replace("{url}", url)).collect();
        Ok(Self { program, args })
    }
}

impl FrameSource for CommandFrameSource {
    fn grab_frame(&self) -> Result<Vec<u8>, CaptureError> {
        tracing::debug!(program = %self.program, args = ?self.args, "capturing frame");

        let output = Command::new(&self.program)
            .args(&self.args)
            .output()
            .map_err(|e| CaptureError::NoFrame(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CaptureError::NoFrame(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        check_frame(output.stdout)
    }
}

/// Reject empty output and bytes that are not a known image format
pub fn check_frame(frame: Vec<u8>) -> Result<Vec<u8>, CaptureError> {
    if frame.is_empty() {
        return Err(CaptureError::NoFrame("camera returned no data".to_string()));
    }
    image::guess_format(&frame)
        .map_err(|_| CaptureError::NoFrame("camera returned data that is not an image".to_string()))?;
    Ok(frame)
}
