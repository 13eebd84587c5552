//! Use cases: frame capture, intake, gate admission

pub mod admission_service;
pub mod capture_service;
pub mod components;
pub mod intake_service;

pub use admission_service::{AdmissionController, AdmittedTruck};
pub use capture_service::CaptureService;
pub use components::{
    build_announcer, build_frame_source, build_recognizer, open_admission_controller,
    open_capture_service, open_intake_service,
};
pub use intake_service::{IntakeReceipt, IntakeRequest, IntakeService, IntakeServiceError};
