//! Gate announcements
//!
//! One `announce` call produces two independent outputs:
//! - a spoken announcement at the gate, best effort (failures are logged)
//! - a bilingual MP3 saved under a name derived from the truck number, which
//!   must exist before the caller reports the admission

pub mod gtts;
pub mod local;

pub use gtts::GoogleTtsSynthesizer;
pub use local::{CommandSpeaker, SilentSpeaker};

use truckgate_store::AudioStore;
use truckgate_types::{AnnouncementError, AudioArtifactRef};

/// Language of the stored artifact
pub const DEFAULT_ARTIFACT_LANG: &str = "hi";

/// Synchronous local playback
pub trait LocalSpeaker: Send + Sync {
    fn speak(&self, text: &str) -> Result<(), AnnouncementError>;
}

/// Text to encoded audio
pub trait SpeechSynthesizer: Send + Sync {
    fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AnnouncementError>;
}

/// Announces an admitted truck
pub trait Announcer: Send + Sync {
    fn announce(&self, truck_number: &str) -> Result<AudioArtifactRef, AnnouncementError>;
}

/// English sentence spoken at the gate
pub fn gate_message(truck_number: &str) -> String {
    format!("Truck number {} please come inside the gate.", truck_number)
}

/// English sentence followed by its Hindi translation
pub fn bilingual_message(truck_number: &str) -> String {
    format!(
        "{} Truck number {} कृपया गेट के अंदर आइए।",
        gate_message(truck_number),
        truck_number
    )
}

pub struct AnnouncementDispatcher {
    speaker: Box<dyn LocalSpeaker>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    audio: AudioStore,
    lang: String,
}

impl AnnouncementDispatcher {
    pub fn new(
        speaker: Box<dyn LocalSpeaker>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        audio: AudioStore,
    ) -> Self {
        Self {
            speaker,
            synthesizer,
            audio,
            lang: DEFAULT_ARTIFACT_LANG.to_string(),
        }
    }

    pub fn with_lang(mut self, lang: &str) -> Self {
        self.lang = lang.to_string();
        self
    }

    pub fn audio_store(&self) -> &AudioStore {
        &self.audio
    }

    /// Write the bilingual artifact; errors propagate
    pub fn render_artifact(&self, truck_number: &str) -> Result<AudioArtifactRef, AnnouncementError> {
        let audio = self
            .synthesizer
            .synthesize(&bilingual_message(truck_number), &self.lang)?;
        self.audio
            .save(truck_number, &audio)
            .map_err(|e| AnnouncementError::Io(e.to_string()))
    }
}

impl Announcer for AnnouncementDispatcher {
    fn announce(&self, truck_number: &str) -> Result<AudioArtifactRef, AnnouncementError> {
        if let Err(e) = self.speaker.speak(&gate_message(truck_number)) {
            tracing::warn!(truck_number, error = %e, "local announcement failed");
        }

        let artifact = self.render_artifact(truck_number)?;
        tracing::info!(truck_number, artifact = %artifact.name, "announcement ready");
        Ok(artifact)
    }
}
