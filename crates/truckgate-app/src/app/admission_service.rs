//! Gate admission: pop the oldest queued truck and announce it

use std::sync::Arc;

use serde::Serialize;
use truckgate_domain::repository::TruckRecordRepository;
use truckgate_speech::Announcer;
use truckgate_types::{AudioArtifactRef, Error, RecordId, Result, TruckRecord};

/// A truck let through the gate, with its announcement
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmittedTruck {
    pub id: RecordId,
    pub truck_number: String,
    pub artifact: AudioArtifactRef,
}

pub struct AdmissionController {
    repo: Arc<dyn TruckRecordRepository>,
    announcer: Arc<dyn Announcer>,
}

impl AdmissionController {
    pub fn new(repo: Arc<dyn TruckRecordRepository>, announcer: Arc<dyn Announcer>) -> Self {
        Self { repo, announcer }
    }

    /// Admit the oldest queued truck, if any.
    ///
    /// The status flip is durable before the announcer runs. When the
    /// announcement artifact cannot be produced the truck stays `Entered`
    /// and `Error::AnnouncementFailed` tells the operator to re-announce.
    pub fn admit_next(&self) -> Result<Option<AdmittedTruck>> {
        let Some(record) = self.repo.admit_next()? else {
            tracing::info!("queue empty, nothing to admit");
            return Ok(None);
        };
        tracing::info!(id = %record.id, truck_number = %record.truck_number, "truck admitted");

        match self.announcer.announce(&record.truck_number) {
            Ok(artifact) => Ok(Some(AdmittedTruck {
                id: record.id,
                truck_number: record.truck_number,
                artifact,
            })),
            Err(source) => {
                tracing::error!(id = %record.id, error = %source, "announcement failed after admission");
                Err(Error::AnnouncementFailed {
                    id: record.id,
                    truck_number: record.truck_number,
                    source,
                })
            }
        }
    }

    /// Announce a truck again without touching the queue
    pub fn reannounce(&self, truck_number: &str) -> Result<AudioArtifactRef> {
        Ok(self.announcer.announce(truck_number)?)
    }

    /// Trucks waiting at the gate, oldest first
    pub fn queue(&self) -> Result<Vec<TruckRecord>> {
        self.repo.list_queued()
    }

    pub fn history(&self) -> Result<Vec<TruckRecord>> {
        self.repo.list_all()
    }
}
