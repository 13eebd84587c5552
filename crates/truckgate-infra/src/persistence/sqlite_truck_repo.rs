//! SQLite truck record repository

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row, TransactionBehavior};

use truckgate_domain::repository::TruckRecordRepository;
use truckgate_types::{
    Error, NewTruckRecord, PersistenceError, RecordId, Result, TruckRecord, TruckStatus,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS trucks (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    truck_number TEXT NOT NULL,
    license_path TEXT NOT NULL,
    challan_path TEXT NOT NULL,
    plate_path   TEXT NOT NULL,
    status       TEXT NOT NULL DEFAULT 'Queued' CHECK (status IN ('Queued', 'Entered')),
    created_at   TEXT NOT NULL,
    entered_at   TEXT
);
CREATE INDEX IF NOT EXISTS idx_trucks_status_id ON trucks (status, id);
";

const COLUMNS: &str =
    "id, truck_number, license_path, challan_path, plate_path, status, created_at, entered_at";

/// SQLite implementation of TruckRecordRepository.
///
/// `AUTOINCREMENT` keeps ids strictly increasing even across deletes done
/// outside this program.
pub struct SqliteTruckRepository {
    conn: Mutex<Connection>,
}

impl SqliteTruckRepository {
    /// Open (and if needed create) the database file
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PersistenceError::Unavailable(format!("{}: {}", parent.display(), e)))?;
        }
        let conn = Connection::open(path).map_err(map_sql_error)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;").map_err(map_sql_error)?;
        Self::init(conn)
    }

    /// In-memory database (tests, dry runs)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(map_sql_error)?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        // Other processes (a second operator console) may hold the write lock briefly.
        conn.busy_timeout(Duration::from_secs(5)).map_err(map_sql_error)?;
        conn.execute_batch(SCHEMA).map_err(map_sql_error)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| PersistenceError::Unavailable("database lock poisoned".to_string()).into())
    }

    fn status_of(conn: &Connection, id: RecordId) -> Result<Option<TruckStatus>> {
        let status: Option<String> = conn
            .query_row("SELECT status FROM trucks WHERE id = ?1", params![id.0 as i64], |row| {
                row.get(0)
            })
            .optional()
            .map_err(map_sql_error)?;

        status
            .map(|s| {
                TruckStatus::parse(&s).ok_or_else(|| {
                    PersistenceError::Corrupted(format!("record {}: unknown status {:?}", id, s)).into()
                })
            })
            .transpose()
    }
}

fn map_sql_error(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            PersistenceError::Rejected(e.to_string()).into()
        }
        rusqlite::Error::FromSqlConversionFailure(..) | rusqlite::Error::InvalidColumnType(..) => {
            PersistenceError::Corrupted(e.to_string()).into()
        }
        other => PersistenceError::Unavailable(other.to_string()).into(),
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<TruckRecord> {
    let status: String = row.get(5)?;
    let status = TruckStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            Box::new(PersistenceError::Corrupted(format!("unknown status {:?}", status))),
        )
    })?;

    Ok(TruckRecord {
        id: RecordId(row.get::<_, i64>(0)? as u64),
        truck_number: row.get(1)?,
        license_path: row.get(2)?,
        challan_path: row.get(3)?,
        plate_path: row.get(4)?,
        status,
        created_at: row.get::<_, DateTime<Utc>>(6)?,
        entered_at: row.get::<_, Option<DateTime<Utc>>>(7)?,
    })
}

impl TruckRecordRepository for SqliteTruckRepository {
    fn create_record(&self, record: &NewTruckRecord) -> Result<RecordId> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO trucks (truck_number, license_path, challan_path, plate_path, status, created_at)
             VALUES (?1, ?2, ?3, ?4, 'Queued', ?5)",
            params![
                record.truck_number,
                record.license_path,
                record.challan_path,
                record.plate_path,
                Utc::now(),
            ],
        )
        .map_err(map_sql_error)?;
        Ok(RecordId(conn.last_insert_rowid() as u64))
    }

    fn next_queued(&self) -> Result<Option<TruckRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM trucks WHERE status = 'Queued' ORDER BY id LIMIT 1"),
            [],
            row_to_record,
        )
        .optional()
        .map_err(map_sql_error)
    }

    fn mark_entered(&self, id: RecordId) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        let changed = tx
            .execute(
                "UPDATE trucks SET status = 'Entered', entered_at = ?2
                 WHERE id = ?1 AND status = 'Queued'",
                params![id.0 as i64, Utc::now()],
            )
            .map_err(map_sql_error)?;

        if changed == 0 {
            return match Self::status_of(&tx, id)? {
                None => Err(Error::NotFound(id)),
                Some(status) => Err(Error::InvalidTransition { id, status }),
            };
        }

        tx.commit().map_err(map_sql_error)
    }

    fn list_queued(&self) -> Result<Vec<TruckRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM trucks WHERE status = 'Queued' ORDER BY id"))
            .map_err(map_sql_error)?;
        let records = stmt
            .query_map([], row_to_record)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(records)
    }

    fn admit_next(&self) -> Result<Option<TruckRecord>> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(map_sql_error)?;

        // Select and flip in one statement; the status guard makes a lost
        // race update nothing rather than admit twice.
        let admitted = tx
            .query_row(
                &format!(
                    "UPDATE trucks SET status = 'Entered', entered_at = ?1
                     WHERE status = 'Queued'
                       AND id = (SELECT MIN(id) FROM trucks WHERE status = 'Queued')
                     RETURNING {COLUMNS}"
                ),
                params![Utc::now()],
                row_to_record,
            )
            .optional()
            .map_err(map_sql_error)?;

        tx.commit().map_err(map_sql_error)?;
        Ok(admitted)
    }

    fn find_by_id(&self, id: RecordId) -> Result<Option<TruckRecord>> {
        let conn = self.lock()?;
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM trucks WHERE id = ?1"),
            params![id.0 as i64],
            row_to_record,
        )
        .optional()
        .map_err(map_sql_error)
    }

    fn list_all(&self) -> Result<Vec<TruckRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {COLUMNS} FROM trucks ORDER BY id"))
            .map_err(map_sql_error)?;
        let records = stmt
            .query_map([], row_to_record)
            .map_err(map_sql_error)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(map_sql_error)?;
        Ok(records)
    }
}
