//! Shared data types for the intake and admission pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Truck number stored when the plate could not be read
pub const UNKNOWN_PLATE: &str = "UNKNOWN";

/// Store-assigned record identifier. Ascending ids are the queue order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a truck record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TruckStatus {
    /// Waiting at the gate
    Queued,
    /// Admitted through the gate (terminal)
    Entered,
}

impl TruckStatus {
    /// Stored label ("Queued" / "Entered")
    pub fn as_str(&self) -> &'static str {
        match self {
            TruckStatus::Queued => "Queued",
            TruckStatus::Entered => "Entered",
        }
    }

    /// Parse a stored label
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Queued" => Some(TruckStatus::Queued),
            "Entered" => Some(TruckStatus::Entered),
            _ => None,
        }
    }
}

impl std::fmt::Display for TruckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted truck intake record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TruckRecord {
    pub id: RecordId,

    /// Normalized plate, or `UNKNOWN`
    pub truck_number: String,

    pub license_path: String,
    pub challan_path: String,
    pub plate_path: String,

    pub status: TruckStatus,

    /// When the truck was queued
    pub created_at: DateTime<Utc>,

    /// When the truck was admitted
    #[serde(default)]
    pub entered_at: Option<DateTime<Utc>>,
}

impl TruckRecord {
    pub fn is_queued(&self) -> bool {
        self.status == TruckStatus::Queued
    }

    pub fn is_unknown_plate(&self) -> bool {
        self.truck_number == UNKNOWN_PLATE
    }
}

/// Fields supplied by intake; the store assigns id, status and timestamps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTruckRecord {
    pub truck_number: String,
    pub license_path: String,
    pub challan_path: String,
    pub plate_path: String,
}

/// Outcome of plate recognition on a successful inference response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlateReading {
    /// A plate-shaped string was found in the response
    Recognized { plate: String },
    /// The service answered but nothing matched the plate format
    Unrecognized { raw: String },
}

impl PlateReading {
    /// Value stored as the record's truck number
    pub fn truck_number(&self) -> &str {
        match self {
            PlateReading::Recognized { plate } => plate,
            PlateReading::Unrecognized { .. } => UNKNOWN_PLATE,
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, PlateReading::Recognized { .. })
    }
}

/// Reference to a stored announcement audio file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioArtifactRef {
    /// File name, derived from the truck number only
    pub name: String,
    /// Full path of the artifact on disk
    pub path: PathBuf,
}

impl std::fmt::Display for AudioArtifactRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
