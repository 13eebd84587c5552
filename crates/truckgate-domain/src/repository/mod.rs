//! Repository trait definitions for data persistence

use truckgate_types::{Error, NewTruckRecord, RecordId, TruckRecord};

/// Repository for truck intake records.
///
/// The repository is the only component that changes a record's status.
/// Implementations must be safe to share between threads and must make
/// `admit_next` a single atomic select-and-flip.
pub trait TruckRecordRepository: Send + Sync {
    /// Insert a new `Queued` record and return its id
    fn create_record(&self, record: &NewTruckRecord) -> Result<RecordId, Error>;

    /// Oldest `Queued` record by ascending id
    fn next_queued(&self) -> Result<Option<TruckRecord>, Error>;

    /// Flip one record from `Queued` to `Entered`.
    ///
    /// Fails with `NotFound` for an unknown id and `InvalidTransition` if the
    /// record was already admitted.
    fn mark_entered(&self, id: RecordId) -> Result<(), Error>;

    /// All `Queued` records ordered by ascending id
    fn list_queued(&self) -> Result<Vec<TruckRecord>, Error>;

    /// Atomically flip the oldest `Queued` record to `Entered` and return it.
    ///
    /// Returns `None` without writing anything when the queue is empty. Two
    /// concurrent callers never receive the same record.
    fn admit_next(&self) -> Result<Option<TruckRecord>, Error>;

    /// Find a record by id
    fn find_by_id(&self, id: RecordId) -> Result<Option<TruckRecord>, Error>;

    /// Every record, ascending id
    fn list_all(&self) -> Result<Vec<TruckRecord>, Error>;
}
