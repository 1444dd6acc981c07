//! Import/Export Orchestrator
//!
//! Moves the whole dataset between the record store and a snapshot file.
//! Imports check the whole snapshot before clearing anything, but the writes
//! themselves are not transactional: a store failure midway can leave the
//! tables cleared. Enable `snapshot.backup_before_import` to keep a copy.

use crate::engine::database::DatabaseError;
use crate::engine::models::DataContainer;
use crate::engine::records::RecordStore;
use crate::engine::snapshot::{self, SnapshotError};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

#[derive(Debug)]
pub enum ImportOutcome {
    Imported { fuel_types: usize, cars: usize },
    /// No snapshot file; the store was left untouched.
    NoSnapshot,
    /// The snapshot could not be used; the store was left untouched.
    Unreadable { cause: SnapshotError },
}

impl ImportOutcome {
    pub fn is_imported(&self) -> bool {
        matches!(self, ImportOutcome::Imported { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSummary {
    pub fuel_types: usize,
    pub cars: usize,
}

/// Replaces the store contents with the snapshot at `path`.
///
/// The snapshot is read and validated before anything is deleted. Fuel types
/// go in before cars so every car's `fuelTypeId` already exists when the car
/// is inserted.
pub fn import_all(store: &RecordStore, path: &Path) -> Result<ImportOutcome, TransferError> {
    let checked = snapshot::read_snapshot(path).and_then(|data| match data {
        Some(data) => data.validate().map(|_| Some(data)).map_err(SnapshotError::Invalid),
        None => Ok(None),
    });
    let data = match checked {
        Ok(Some(data)) => data,
        Ok(None) => {
            info!(path = %path.display(), "No data imported: snapshot not found");
            return Ok(ImportOutcome::NoSnapshot);
        }
        Err(cause) => {
            warn!(path = %path.display(), error = %cause, "No data imported: snapshot unreadable");
            return Ok(ImportOutcome::Unreadable { cause });
        }
    };

    // cars hold the foreign key, so they go first
    store.clear_cars()?;
    store.clear_fuel_types()?;

    for fuel_type in &data.fuel_types {
        store.add_fuel_type(fuel_type)?;
    }
    for car in &data.cars {
        store.restore_car(car)?;
    }

    info!(
        fuel_types = data.fuel_types.len(),
        cars = data.cars.len(),
        "Snapshot imported"
    );
    Ok(ImportOutcome::Imported {
        fuel_types: data.fuel_types.len(),
        cars: data.cars.len(),
    })
}

/// Dumps every car and fuel type to `path`, overwriting it.
pub fn export_all(
    store: &RecordStore,
    path: &Path,
    file_version: Option<u32>,
) -> Result<ExportSummary, TransferError> {
    let container = DataContainer {
        file_version,
        cars: store.list_cars()?,
        fuel_types: store.list_fuel_types()?,
    };
    snapshot::export_snapshot(path, &container)?;

    let summary = ExportSummary {
        fuel_types: container.fuel_types.len(),
        cars: container.cars.len(),
    };
    info!(
        path = %path.display(),
        fuel_types = summary.fuel_types,
        cars = summary.cars,
        "Snapshot exported"
    );
    Ok(summary)
}
