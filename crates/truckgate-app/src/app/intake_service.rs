//! Intake Service - registers a truck in the gate queue
//!
//! Workflow:
//! 1. Check that a plate image, a license and a challan were all given
//! 2. Recognize the plate number from the captured frame
//! 3. Copy the license and challan into the upload directory
//! 4. Insert a `Queued` record
//!
//! Documents are copied only once recognition has succeeded and are removed
//! again if the record cannot be written, so a failed intake leaves nothing
//! behind.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use truckgate_domain::repository::TruckRecordRepository;
use truckgate_store::{DocumentKind, DocumentStore};
use truckgate_types::{Error, NewTruckRecord, PlateReading, RecordId};
use truckgate_vision::PlateRecognition;

/// Errors specific to the intake service
#[derive(Debug, Error)]
pub enum IntakeServiceError {
    #[error("All fields required: missing {0}")]
    MissingInput(&'static str),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Plate recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("Could not save truck record: {0}")]
    StoreFailed(String),

    #[error("{0}")]
    Other(String),
}

impl From<Error> for IntakeServiceError {
    fn from(err: Error) -> Self {
        match err {
            Error::MissingDocument(what) => IntakeServiceError::MissingInput(what),
            Error::FileNotFound(path) => IntakeServiceError::DocumentNotFound(path),
            Error::Recognition(e) => IntakeServiceError::RecognitionFailed(e.to_string()),
            Error::Persistence(e) => IntakeServiceError::StoreFailed(e.to_string()),
            _ => IntakeServiceError::Other(err.to_string()),
        }
    }
}

/// One intake submission
#[derive(Debug, Clone, Default)]
pub struct IntakeRequest {
    /// Captured plate frame: a path, or a file name in the upload directory
    pub plate_image: Option<PathBuf>,

    pub license: Option<PathBuf>,

    pub challan: Option<PathBuf>,
}

impl IntakeRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plate_image(mut self, path: impl Into<PathBuf>) -> Self {
        self.plate_image = Some(path.into());
        self
    }

    pub fn with_license(mut self, path: impl Into<PathBuf>) -> Self {
        self.license = Some(path.into());
        self
    }

    pub fn with_challan(mut self, path: impl Into<PathBuf>) -> Self {
        self.challan = Some(path.into());
        self
    }
}

/// Confirmation returned to the operator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntakeReceipt {
    pub id: RecordId,
    pub truck_number: String,
    pub reading: PlateReading,
    pub plate_path: PathBuf,
    pub license_path: PathBuf,
    pub challan_path: PathBuf,
}

pub struct IntakeService {
    repo: Arc<dyn TruckRecordRepository>,
    recognizer: Arc<dyn PlateRecognition>,
    documents: DocumentStore,
}

impl IntakeService {
    pub fn new(
        repo: Arc<dyn TruckRecordRepository>,
        recognizer: Arc<dyn PlateRecognition>,
        documents: DocumentStore,
    ) -> Self {
        Self {
            repo,
            recognizer,
            documents,
        }
    }

    /// Register one truck; see the module docs for the order of steps
    pub fn submit(&self, request: &IntakeRequest) -> Result<IntakeReceipt, IntakeServiceError> {
        self.run(request).map_err(Into::into)
    }

    fn run(&self, request: &IntakeRequest) -> Result<IntakeReceipt, Error> {
        let plate_ref = required(&request.plate_image, "plate image")?;
        let license = required(&request.license, "license")?;
        let challan = required(&request.challan, "challan")?;

        let plate_path = self.documents.resolve(plate_ref)?;
        for document in [license, challan] {
            if !document.is_file() {
                return Err(Error::FileNotFound(document.display().to_string()));
            }
        }

        let image = std::fs::read(&plate_path)?;
        let reading = self.recognizer.recognize(&image)?;
        let truck_number = reading.truck_number().to_string();

        let license_path = self.documents.store_document(DocumentKind::License, license)?;
        let challan_path = match self.documents.store_document(DocumentKind::Challan, challan) {
            Ok(path) => path,
            Err(e) => {
                self.documents.discard(&license_path);
                return Err(e);
            }
        };

        let record = NewTruckRecord {
            truck_number: truck_number.clone(),
            license_path: license_path.display().to_string(),
            challan_path: challan_path.display().to_string(),
            plate_path: plate_path.display().to_string(),
        };

        let id = match self.repo.create_record(&record) {
            Ok(id) => id,
            Err(e) => {
                self.documents.discard(&license_path);
                self.documents.discard(&challan_path);
                return Err(e);
            }
        };

        tracing::info!(id = %id, truck_number = %truck_number, "truck registered");
        Ok(IntakeReceipt {
            id,
            truck_number,
            reading,
            plate_path,
            license_path,
            challan_path,
        })
    }
}

fn required<'a>(value: &'a Option<PathBuf>, what: &'static str) -> Result<&'a Path, Error> {
    match value.as_deref() {
        Some(path) if !path.as_os_str().is_empty() => Ok(path),
        _ => Err(Error::MissingDocument(what)),
    }
}
