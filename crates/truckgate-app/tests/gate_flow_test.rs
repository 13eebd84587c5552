//! Intake through admission with fake external services

use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use tempfile::tempdir;
use truckgate_app::app::{AdmissionController, IntakeRequest, IntakeService, IntakeServiceError};
use truckgate_domain::repository::TruckRecordRepository;
use truckgate_infra::persistence::{FileTruckRepository, SqliteTruckRepository};
use truckgate_speech::{
    AnnouncementDispatcher, Announcer, LocalSpeaker, SpeechSynthesizer,
};
use truckgate_store::{AudioStore, DocumentStore};
use truckgate_types::{
    AnnouncementError, AudioArtifactRef, RecognitionError, TruckStatus,
};
use truckgate_vision::{ImagePayload, PlateRecognizer, VisionBackend};

/// Vision service answering with fixed text
struct ScriptedVision(Result<String, u16>);

impl VisionBackend for ScriptedVision {
    fn complete(&self, _instruction: &str, image: &ImagePayload<'_>) -> Result<String, RecognitionError> {
        assert!(image.data_url().starts_with("data:image/jpeg;base64,"));
        match &self.0 {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(RecognitionError::Service {
                status: *status,
                body: "overloaded".to_string(),
            }),
        }
    }
}

struct QuietSpeaker;

impl LocalSpeaker for QuietSpeaker {
    fn speak(&self, _text: &str) -> Result<(), AnnouncementError> {
        Ok(())
    }
}

struct EchoSynth;

impl SpeechSynthesizer for EchoSynth {
    fn synthesize(&self, text: &str, lang: &str) -> Result<Vec<u8>, AnnouncementError> {
        Ok(format!("[{}] {}", lang, text).into_bytes())
    }
}

/// Counts calls before delegating to the real dispatcher
struct CountingAnnouncer {
    inner: AnnouncementDispatcher,
    calls: Mutex<Vec<String>>,
}

impl Announcer for CountingAnnouncer {
    fn announce(&self, truck_number: &str) -> Result<AudioArtifactRef, AnnouncementError> {
        self.calls.lock().unwrap().push(truck_number.to_string());
        self.inner.announce(truck_number)
    }
}

fn write_inputs(dir: &Path) -> IntakeRequest {
    let uploads = dir.join("uploads");
    fs::create_dir_all(&uploads).unwrap();
    fs::write(uploads.join("plate_20240601_083000.jpg"), [0xFF, 0xD8, 0xFF, 0xE0, 0x10]).unwrap();
    fs::write(dir.join("dl.jpg"), b"driving license").unwrap();
    fs::write(dir.join("challan 42.pdf"), b"challan").unwrap();

    IntakeRequest::new()
        .with_plate_image("plate_20240601_083000.jpg")
        .with_license(dir.join("dl.jpg"))
        .with_challan(dir.join("challan 42.pdf"))
}

fn gate(
    dir: &Path,
    repo: Arc<dyn TruckRecordRepository>,
    vision: ScriptedVision,
) -> (IntakeService, AdmissionController, Arc<CountingAnnouncer>) {
    let recognizer = PlateRecognizer::new(Arc::new(vision));
    let intake = IntakeService::new(
        repo.clone(),
        Arc::new(recognizer),
        DocumentStore::open(dir.join("uploads")).unwrap(),
    );

    let announcer = Arc::new(CountingAnnouncer {
        inner: AnnouncementDispatcher::new(
            Box::new(QuietSpeaker),
            Box::new(EchoSynth),
            AudioStore::open(dir.join("audio")).unwrap(),
        ),
        calls: Mutex::new(Vec::new()),
    });
    let admission = AdmissionController::new(repo, announcer.clone());
    (intake, admission, announcer)
}

#[test]
fn test_intake_then_admission_end_to_end() {
    let dir = tempdir().unwrap();
    let request = write_inputs(dir.path());
    let repo: Arc<dyn TruckRecordRepository> =
        Arc::new(SqliteTruckRepository::open(&dir.path().join("trucks.sqlite")).unwrap());
    let (intake, admission, announcer) = gate(
        dir.path(),
        repo.clone(),
        ScriptedVision(Ok("The vehicle number is xy 99 zz 0001.".to_string())),
    );

    let receipt = intake.submit(&request).unwrap();
    assert_eq!(receipt.truck_number, "XY99ZZ0001");

    let record = repo.find_by_id(receipt.id).unwrap().unwrap();
    assert_eq!(record.status, TruckStatus::Queued);
    assert_eq!(record.truck_number, "XY99ZZ0001");
    assert_eq!(admission.queue().unwrap().len(), 1);

    let admitted = admission.admit_next().unwrap().unwrap();

    assert_eq!(admitted.id, receipt.id);
    assert_eq!(admitted.truck_number, "XY99ZZ0001");
    assert_eq!(admitted.artifact.name, "XY99ZZ0001_announcement.mp3");
    assert!(fs::metadata(&admitted.artifact.path).unwrap().len() > 0);
    assert_eq!(announcer.calls.lock().unwrap().as_slice(), ["XY99ZZ0001"]);
    assert_eq!(repo.find_by_id(receipt.id).unwrap().unwrap().status, TruckStatus::Entered);

    let audio = String::from_utf8(fs::read(&admitted.artifact.path).unwrap()).unwrap();
    assert!(audio.starts_with("[hi] Truck number XY99ZZ0001 please come inside the gate."));

    assert_eq!(admission.admit_next().unwrap(), None);
    assert_eq!(announcer.calls.lock().unwrap().len(), 1);
}

#[test]
fn test_unreadable_plate_queued_as_unknown() {
    let dir = tempdir().unwrap();
    let request = write_inputs(dir.path());
    let repo: Arc<dyn TruckRecordRepository> =
        Arc::new(FileTruckRepository::open(dir.path().join("store")).unwrap());
    let (intake, admission, _) = gate(
        dir.path(),
        repo.clone(),
        ScriptedVision(Ok("no plate visible".to_string())),
    );

    let receipt = intake.submit(&request).unwrap();
    assert_eq!(receipt.truck_number, "UNKNOWN");

    let admitted = admission.admit_next().unwrap().unwrap();
    assert_eq!(admitted.artifact.name, "UNKNOWN_announcement.mp3");
}

#[test]
fn test_recognition_outage_creates_no_record() {
    let dir = tempdir().unwrap();
    let request = write_inputs(dir.path());
    let repo: Arc<dyn TruckRecordRepository> = Arc::new(SqliteTruckRepository::open_in_memory().unwrap());
    let (intake, admission, announcer) = gate(dir.path(), repo.clone(), ScriptedVision(Err(503)));

    let err = intake.submit(&request).unwrap_err();

    assert!(matches!(err, IntakeServiceError::RecognitionFailed(_)));
    assert!(err.to_string().contains("503"));
    assert!(repo.list_all().unwrap().is_empty());
    assert_eq!(fs::read_dir(dir.path().join("uploads")).unwrap().count(), 1);
    assert_eq!(admission.admit_next().unwrap(), None);
    assert!(announcer.calls.lock().unwrap().is_empty());
}

#[test]
fn test_queue_order_follows_intake_order() {
    let dir = tempdir().unwrap();
    let request = write_inputs(dir.path());
    let repo: Arc<dyn TruckRecordRepository> = Arc::new(SqliteTruckRepository::open_in_memory().unwrap());

    let plates = ["AB12CD3456", "MH04K987", "DL1CA1111"];
    let mut ids = Vec::new();
    for plate in plates {
        let (intake, _, _) = gate(dir.path(), repo.clone(), ScriptedVision(Ok(plate.to_lowercase())));
        ids.push(intake.submit(&request).unwrap().id);
    }

    let (_, admission, announcer) = gate(dir.path(), repo.clone(), ScriptedVision(Err(500)));
    let queued: Vec<_> = admission.queue().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(queued, ids);

    while admission.admit_next().unwrap().is_some() {}
    assert_eq!(announcer.calls.lock().unwrap().as_slice(), plates);
}
