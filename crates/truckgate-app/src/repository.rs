//! Repository adapters for persistence layer

use std::sync::Arc;

use truckgate_domain::repository::TruckRecordRepository;
use truckgate_infra::persistence::{FileTruckRepository, SqliteTruckRepository};
use truckgate_store::{AudioStore, DocumentStore};
use truckgate_types::Result;
use truckgate_vision::Cache;

use crate::config::{Config, StoreBackend};

/// Open the truck record store selected by `store_backend`
pub fn open_truck_repo(config: &Config) -> Result<Arc<dyn TruckRecordRepository>> {
    let repo: Arc<dyn TruckRecordRepository> = match config.store_backend {
        StoreBackend::Sqlite => {
            let path = config.database_path()?;
            tracing::debug!(path = %path.display(), "opening sqlite record store");
            Arc::new(SqliteTruckRepository::open(&path)?)
        }
        StoreBackend::Json => {
            let dir = config.data_dir()?;
            tracing::debug!(dir = %dir.display(), "opening json record store");
            Arc::new(FileTruckRepository::open(dir)?)
        }
    };
    Ok(repo)
}

/// Open the upload directory for documents and captured frames
pub fn open_document_store(config: &Config) -> Result<DocumentStore> {
    DocumentStore::open(config.uploads_dir()?)
}

/// Open the announcement audio directory
pub fn open_audio_store(config: &Config) -> Result<AudioStore> {
    AudioStore::open(config.audio_dir()?)
}

/// Open the plate reading cache
pub fn open_cache(config: &Config) -> Result<Cache> {
    Cache::new(config.cache_dir()?)
}
