//! Persistence implementations
//!
//! Both implement `TruckRecordRepository`: SQLite for deployments, a JSON
//! file for single-operator setups without a database.

mod file_truck_repo;
mod sqlite_truck_repo;

pub use file_truck_repo::FileTruckRepository;
pub use sqlite_truck_repo::SqliteTruckRepository;
