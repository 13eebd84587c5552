//! Build the shared clients and services from configuration.
//!
//! Each external client (vision, TTS, camera) is constructed once here and
//! injected into the services.

use std::sync::Arc;

use truckgate_infra::camera::CommandFrameSource;
use truckgate_speech::{
    AnnouncementDispatcher, CommandSpeaker, GoogleTtsSynthesizer, LocalSpeaker, SilentSpeaker,
    gtts::DEFAULT_TTS_URL,
};
use truckgate_types::Result;
use truckgate_vision::{OpenAiVisionBackend, PlateRecognizer};

use super::{AdmissionController, CaptureService, IntakeService};
use crate::config::Config;
use crate::repository::{open_audio_store, open_cache, open_document_store, open_truck_repo};

const TTS_TIMEOUT_SECS: u64 = 30;

/// Plate recognizer over the configured vision service
pub fn build_recognizer(config: &Config) -> Result<PlateRecognizer> {
    let backend = OpenAiVisionBackend::new(
        &config.api_base_url,
        config.api_key.as_deref().unwrap_or_default(),
        &config.model,
        config.recognition_timeout_secs,
    )?;

    let mut recognizer = PlateRecognizer::new(Arc::new(backend));
    if config.cache_enabled {
        recognizer = recognizer.with_cache(open_cache(config)?);
    }
    Ok(recognizer)
}

/// Announcement dispatcher: optional local speech plus the stored MP3
pub fn build_announcer(config: &Config) -> Result<AnnouncementDispatcher> {
    let speaker: Box<dyn LocalSpeaker> = match config.local_speech_command.as_deref() {
        Some(command) => Box::new(CommandSpeaker::from_command_line(command)?),
        None => Box::new(SilentSpeaker),
    };
    let synthesizer = GoogleTtsSynthesizer::new(DEFAULT_TTS_URL, TTS_TIMEOUT_SECS)?;

    Ok(
        AnnouncementDispatcher::new(speaker, Box::new(synthesizer), open_audio_store(config)?)
            .with_lang(&config.tts_lang),
    )
}

pub fn build_frame_source(config: &Config) -> Result<CommandFrameSource> {
    Ok(CommandFrameSource::new(
        config.camera_url.as_deref(),
        &config.capture_command,
    )?)
}

pub fn open_intake_service(config: &Config) -> Result<IntakeService> {
    Ok(IntakeService::new(
        open_truck_repo(config)?,
        Arc::new(build_recognizer(config)?),
        open_document_store(config)?,
    ))
}

pub fn open_admission_controller(config: &Config) -> Result<AdmissionController> {
    Ok(AdmissionController::new(
        open_truck_repo(config)?,
        Arc::new(build_announcer(config)?),
    ))
}

pub fn open_capture_service(config: &Config) -> Result<CaptureService> {
    Ok(CaptureService::new(
        Box::new(build_frame_source(config)?),
        open_document_store(config)?,
    ))
}
