//! File-based truck record repository
//!
//! Keeps the queue in `trucks.json`. Several processes may share one store
//! directory, so nothing is cached between calls: every operation takes an
//! OS lock on `trucks.lock`, reads the file, and (for mutations) writes the
//! whole queue back with a temp-file rename before the lock is released.
//! A failed write leaves the previous file in place.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use truckgate_domain::repository::TruckRecordRepository;
use truckgate_types::{
    Error, NewTruckRecord, PersistenceError, RecordId, Result, TruckRecord, TruckStatus,
};

const STORE_FILE: &str = "trucks.json";
const LOCK_FILE: &str = "trucks.lock";

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueFile {
    next_id: u64,
    records: Vec<TruckRecord>,
}

#[derive(Debug)]
struct QueueState {
    next_id: u64,
    records: BTreeMap<RecordId, TruckRecord>,
}

impl QueueState {
    fn from_file(file: QueueFile) -> Self {
        let records: BTreeMap<RecordId, TruckRecord> =
            file.records.into_iter().map(|r| (r.id, r)).collect();
        // Never hand out an id at or below one already on disk.
        let max_id = records.keys().next_back().map(|id| id.0).unwrap_or(0);
        let next_id = file.next_id.max(max_id + 1);
        Self { next_id, records }
    }

    fn to_file(&self) -> QueueFile {
        QueueFile {
            next_id: self.next_id,
            records: self.records.values().cloned().collect(),
        }
    }

    fn first_queued(&self) -> Option<&TruckRecord> {
        self.records.values().find(|r| r.is_queued())
    }
}

/// Held for the duration of one operation; dropping the file releases the lock.
struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// File-based implementation of TruckRecordRepository
pub struct FileTruckRepository {
    store_path: PathBuf,
    lock_path: PathBuf,
}

impl FileTruckRepository {
    /// Create or load a repository in `store_dir/trucks.json`
    pub fn open(store_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&store_dir)
            .map_err(|e| PersistenceError::Unavailable(format!("{}: {}", store_dir.display(), e)))?;

        let repo = Self {
            store_path: store_dir.join(STORE_FILE),
            lock_path: store_dir.join(LOCK_FILE),
        };
        // Surface a corrupted file now rather than on first use.
        let _lock = repo.lock_shared()?;
        repo.read_state()?;
        Ok(repo)
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    fn open_lock_file(&self) -> Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| {
                PersistenceError::Unavailable(format!("{}: {}", self.lock_path.display(), e)).into()
            })
    }

    /// Exclusive lock for select-and-flip and insert
    fn lock_exclusive(&self) -> Result<StoreLock> {
        let file = self.open_lock_file()?;
        file.lock_exclusive().map_err(|e| {
            PersistenceError::Unavailable(format!("{}: {}", self.lock_path.display(), e))
        })?;
        Ok(StoreLock { file })
    }

    fn lock_shared(&self) -> Result<StoreLock> {
        let file = self.open_lock_file()?;
        file.lock_shared().map_err(|e| {
            PersistenceError::Unavailable(format!("{}: {}", self.lock_path.display(), e))
        })?;
        Ok(StoreLock { file })
    }

    /// Current state on disk; call with a lock held
    fn read_state(&self) -> Result<QueueState> {
        if !self.store_path.exists() {
            return Ok(QueueState::from_file(QueueFile::default()));
        }
        let file = File::open(&self.store_path).map_err(|e| {
            PersistenceError::Unavailable(format!("{}: {}", self.store_path.display(), e))
        })?;
        let queue = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            PersistenceError::Corrupted(format!("{}: {}", self.store_path.display(), e))
        })?;
        Ok(QueueState::from_file(queue))
    }

    /// Write the whole queue atomically; call with the exclusive lock held
    fn persist(&self, state: &QueueState) -> Result<()> {
        let dir = self.store_path.parent().unwrap_or_else(|| Path::new("."));
        let write = || -> std::io::Result<()> {
            let tmp = tempfile::NamedTempFile::new_in(dir)?;
            {
                let mut writer = BufWriter::new(tmp.as_file());
                serde_json::to_writer_pretty(&mut writer, &state.to_file())?;
                writer.flush()?;
            }
            tmp.as_file().sync_all()?;
            tmp.persist(&self.store_path).map_err(|e| e.error)?;
            Ok(())
        };

        write().map_err(|e| {
            PersistenceError::Rejected(format!("{}: {}", self.store_path.display(), e)).into()
        })
    }

    /// Flip a queued record and write it back, under the exclusive lock
    fn flip_entered(&self, mut state: QueueState, id: RecordId) -> Result<TruckRecord> {
        let record = state.records.get_mut(&id).ok_or(Error::NotFound(id))?;
        if record.status != TruckStatus::Queued {
            return Err(Error::InvalidTransition {
                id,
                status: record.status,
            });
        }

        record.status = TruckStatus::Entered;
        record.entered_at = Some(Utc::now());
        let updated = record.clone();

        self.persist(&state)?;
        Ok(updated)
    }
}

impl TruckRecordRepository for FileTruckRepository {
    fn create_record(&self, record: &NewTruckRecord) -> Result<RecordId> {
        let _lock = self.lock_exclusive()?;
        let mut state = self.read_state()?;
        let id = RecordId(state.next_id);

        state.records.insert(
            id,
            TruckRecord {
                id,
                truck_number: record.truck_number.clone(),
                license_path: record.license_path.clone(),
                challan_path: record.challan_path.clone(),
                plate_path: record.plate_path.clone(),
                status: TruckStatus::Queued,
                created_at: Utc::now(),
                entered_at: None,
            },
        );
        state.next_id += 1;

        self.persist(&state)?;
        Ok(id)
    }

    fn next_queued(&self) -> Result<Option<TruckRecord>> {
        let _lock = self.lock_shared()?;
        Ok(self.read_state()?.first_queued().cloned())
    }

    fn mark_entered(&self, id: RecordId) -> Result<()> {
        let _lock = self.lock_exclusive()?;
        let state = self.read_state()?;
        self.flip_entered(state, id).map(|_| ())
    }

    fn list_queued(&self) -> Result<Vec<TruckRecord>> {
        let _lock = self.lock_shared()?;
        let state = self.read_state()?;
        Ok(state.records.into_values().filter(|r| r.is_queued()).collect())
    }

    fn admit_next(&self) -> Result<Option<TruckRecord>> {
        let _lock = self.lock_exclusive()?;
        let state = self.read_state()?;
        let Some(id) = state.first_queued().map(|r| r.id) else {
            return Ok(None);
        };
        self.flip_entered(state, id).map(Some)
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<TruckRecord>> {
        let _lock = self.lock_shared()?;
        Ok(self.read_state()?.records.remove(&id))
    }

    fn list_all(&self) -> Result<Vec<TruckRecord>> {
        let _lock = self.lock_shared()?;
        Ok(self.read_state()?.records.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_record(truck_number: &str) -> NewTruckRecord {
        NewTruckRecord {
            truck_number: truck_number.to_string(),
            license_path: "uploads/license.jpg".to_string(),
            challan_path: "uploads/challan.pdf".to_string(),
            plate_path: "uploads/plate.jpg".to_string(),
        }
    }

    #[test]
    fn test_state_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let repo = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
            repo.create_record(&new_record("AB12CD3456")).unwrap();
            repo.create_record(&new_record("XY99ZZ0001")).unwrap();
            repo.admit_next().unwrap();
        }

        let repo = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        let queued = repo.list_queued().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].truck_number, "XY99ZZ0001");
        assert_eq!(repo.list_all().unwrap()[0].status, TruckStatus::Entered);

        let id = repo.create_record(&new_record("KA01AB1234")).unwrap();
        assert_eq!(id, RecordId(3));
    }

    #[test]
    fn test_handle_opened_earlier_sees_later_admission() {
        let dir = tempdir().unwrap();
        let gate = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        let first = gate.create_record(&new_record("AB12CD3456")).unwrap();

        // A slow intake opens its handle before the gate admits the first truck.
        let intake = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(gate.admit_next().unwrap().unwrap().id, first);

        let second = intake.create_record(&new_record("XY99ZZ0001")).unwrap();
        assert_eq!(second, RecordId(2));

        let reopened = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(reopened.find_by_id(first).unwrap().unwrap().status, TruckStatus::Entered);
        assert_eq!(reopened.next_queued().unwrap().unwrap().id, second);
        assert_eq!(intake.admit_next().unwrap().unwrap().id, second);
        assert_eq!(gate.admit_next().unwrap(), None);
    }

    #[test]
    fn test_corrupted_file_is_reported() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("trucks.json"), "{ not json").unwrap();

        let result = FileTruckRepository::open(dir.path().to_path_buf());
        assert!(matches!(
            result,
            Err(Error::Persistence(PersistenceError::Corrupted(_)))
        ));
    }

    #[test]
    fn test_next_id_never_below_stored_records() {
        let dir = tempdir().unwrap();
        let json = r#"{
            "next_id": 1,
            "records": [{
                "id": 7,
                "truck_number": "AB12CD3456",
                "license_path": "l", "challan_path": "c", "plate_path": "p",
                "status": "Queued",
                "created_at": "2024-01-01T00:00:00Z"
            }]
        }"#;
        fs::write(dir.path().join("trucks.json"), json).unwrap();

        let repo = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        assert_eq!(repo.create_record(&new_record("XY99ZZ0001")).unwrap(), RecordId(8));
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_write_rolls_back() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let repo = FileTruckRepository::open(dir.path().to_path_buf()).unwrap();
        let id = repo.create_record(&new_record("AB12CD3456")).unwrap();

        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o555)).unwrap();
        // Root ignores directory permissions; nothing to observe then.
        let writable = tempfile::NamedTempFile::new_in(dir.path()).is_ok();
        let admit = repo.admit_next();
        let create = repo.create_record(&new_record("XY99ZZ0001"));
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();

        if writable {
            return;
        }
        assert!(matches!(admit, Err(Error::Persistence(_))));
        assert!(create.is_err());
        assert_eq!(repo.next_queued().unwrap().map(|r| r.id), Some(id));
        assert_eq!(repo.list_all().unwrap().len(), 1);
        assert_eq!(repo.create_record(&new_record("XY99ZZ0001")).unwrap(), RecordId(2));
    }
}
