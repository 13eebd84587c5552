//! Local (gate-side) spoken announcements

use std::process::Command;
use truckgate_types::AnnouncementError;

use crate::LocalSpeaker;

/// Speaks by running an external TTS command with the text as last argument,
/// e.g. `espeak -s 150` or `say -r 150`. Blocks until playback ends.
pub struct CommandSpeaker {
    program: String,
    args: Vec<String>,
}

impl CommandSpeaker {
    /// Parse a shell-style command line
    pub fn from_command_line(command: &str) -> Result<Self, AnnouncementError> {
        let mut parts = shell_words::split(command)
            .map_err(|e| AnnouncementError::LocalSpeech(format!("invalid speech command {:?}: {}", command, e)))?;
        if parts.is_empty() {
            return Err(AnnouncementError::LocalSpeech("speech command is empty".to_string()));
        }
        let program = parts.remove(0);
        Ok(Self { program, args: parts })
    }
}

impl LocalSpeaker for CommandSpeaker {
    fn speak(&self, text: &str) -> Result<(), AnnouncementError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(text)
            .output()
            .map_err(|e| AnnouncementError::LocalSpeech(format!("{}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AnnouncementError::LocalSpeech(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Used when no local speech command is configured
pub struct SilentSpeaker;

impl LocalSpeaker for SilentSpeaker {
    fn speak(&self, text: &str) -> Result<(), AnnouncementError> {
        tracing::debug!(text, "local speech disabled");
        Ok(())
    }
}
