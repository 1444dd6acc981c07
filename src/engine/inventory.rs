//! CarApp Inventory
//! The store handle the presentation layer works with. Built once at startup
//! and passed to whoever needs persistence.

use crate::engine::config::{Config, ConfigError};
use crate::engine::database::DatabaseError;
use crate::engine::migrations::{AppliedMigration, MigrationError, MigrationStatus, Migrator};
use crate::engine::models::{Car, FuelType};
use crate::engine::records::RecordStore;
use crate::engine::transfer::{self, ExportSummary, ImportOutcome, TransferError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

pub struct Inventory {
    store: RecordStore,
    migrator: Migrator,
    snapshot_path: PathBuf,
    file_version: Option<u32>,
    backup_path: Option<PathBuf>,
    applied_on_open: Vec<AppliedMigration>,
}

impl Inventory {
    /// Opens the store described by `config`, creating it and applying any
    /// pending migrations first.
    pub fn open(project_dir: &Path, config: &Config) -> Result<Self, InventoryError> {
        let migrator = Migrator::from_config(project_dir, config);
        let db = migrator.ensure_initialized(&config.db_path(project_dir), &config.database)?;
        let applied_on_open = migrator.apply_pending(&db)?;

        info!(
            project = %project_dir.display(),
            migrations = applied_on_open.len(),
            "Inventory opened"
        );

        Ok(Self {
            store: RecordStore::new(db),
            migrator,
            snapshot_path: config.snapshot_path(project_dir),
            file_version: config.snapshot.file_version,
            backup_path: config
                .snapshot
                .backup_before_import
                .then(|| config.backup_path(project_dir)),
            applied_on_open,
        })
    }

    /// Loads `carapp.config.json` from `project_dir` (or defaults) and opens.
    pub fn open_project(project_dir: &Path) -> Result<Self, InventoryError> {
        let config = Config::load_or_default(project_dir)?;
        Self::open(project_dir, &config)
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Migrations applied while opening this handle.
    pub fn applied_on_open(&self) -> &[AppliedMigration] {
        &self.applied_on_open
    }

    pub fn list_cars(&self) -> Result<Vec<Car>, DatabaseError> {
        self.store.list_cars()
    }

    pub fn get_car(&self, id: i64) -> Result<Option<Car>, DatabaseError> {
        self.store.get_car(id)
    }

    pub fn list_fuel_types(&self) -> Result<Vec<FuelType>, DatabaseError> {
        self.store.list_fuel_types()
    }

    pub fn get_fuel_type(&self, id: i64) -> Result<Option<FuelType>, DatabaseError> {
        self.store.get_fuel_type(id)
    }

    pub fn add_car(&self, car: &Car) -> Result<i64, DatabaseError> {
        self.store.add_car(car)
    }

    pub fn update_car(&self, car: &Car) -> Result<(), DatabaseError> {
        self.store.update_car(car)
    }

    pub fn delete_car(&self, car: &Car) -> Result<(), DatabaseError> {
        self.store.delete_car(car)
    }

    pub fn add_fuel_type(&self, fuel_type: &FuelType) -> Result<(), DatabaseError> {
        self.store.add_fuel_type(fuel_type)
    }

    /// Cost of driving `distance` km, or `None` when the car has no usable
    /// efficiency or no known fuel type.
    pub fn trip_cost(&self, car: &Car, distance: u32) -> Result<Option<f64>, DatabaseError> {
        let Some(fuel_needed) = car.fuel_needed(distance) else {
            return Ok(None);
        };
        let Some(fuel_type_id) = car.fuel_type_id else {
            return Ok(None);
        };
        Ok(self
            .store
            .get_fuel_type(fuel_type_id)?
            .map(|fuel_type| Car::trip_cost(fuel_needed, &fuel_type)))
    }

    pub fn migration_status(&self) -> Result<MigrationStatus, MigrationError> {
        self.migrator.status(self.store.database())
    }

    pub fn create_migration(&self, name: &str) -> Result<PathBuf, MigrationError> {
        self.migrator.create(name)
    }

    /// Replaces the dataset with the default snapshot file.
    pub fn import_from_snapshot(&self) -> Result<ImportOutcome, InventoryError> {
        if let Some(backup_path) = &self.backup_path {
            if self.snapshot_path.exists() {
                self.store.database().backup(backup_path)?;
            }
        }
        Ok(transfer::import_all(&self.store, &self.snapshot_path)?)
    }

    /// Writes the dataset to the default snapshot file.
    pub fn export_to_snapshot(&self) -> Result<ExportSummary, InventoryError> {
        Ok(transfer::export_all(
            &self.store,
            &self.snapshot_path,
            self.file_version,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::models::GearType;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_store() {
        let dir = tempdir().unwrap();
        let inventory = Inventory::open_project(dir.path()).unwrap();

        assert!(dir.path().join("CarApp.db").exists());
        assert!(inventory.list_cars().unwrap().is_empty());
        assert_eq!(inventory.migration_status().unwrap().current_version, 0);
        assert_eq!(inventory.snapshot_path(), dir.path().join("CarAppData.json"));
    }

    #[test]
    fn test_open_applies_pending_migrations() {
        let dir = tempdir().unwrap();
        std::fs::write(
            dir.path().join("CreateDatabase.1.sql"),
            "INSERT INTO FuelTypes (Id, Name, Price) VALUES (1, 'Diesel', 12.5);",
        )
        .unwrap();

        let inventory = Inventory::open_project(dir.path()).unwrap();
        assert_eq!(inventory.applied_on_open().len(), 1);
        assert_eq!(inventory.list_fuel_types().unwrap().len(), 1);
        drop(inventory);

        let inventory = Inventory::open_project(dir.path()).unwrap();
        assert!(inventory.applied_on_open().is_empty());
        assert_eq!(inventory.list_fuel_types().unwrap().len(), 1);
    }

    #[test]
    fn test_trip_cost() {
        let dir = tempdir().unwrap();
        let inventory = Inventory::open_project(dir.path()).unwrap();
        inventory.add_fuel_type(&FuelType::new(1, "Diesel", 12.5)).unwrap();

        let mut car = Car::new("Toyota", "Yaris");
        car.gear_type = GearType::Automatic;
        car.fuel_efficiency = 25.0;
        assert_eq!(inventory.trip_cost(&car, 100).unwrap(), None);

        car.fuel_type_id = Some(1);
        let cost = inventory.trip_cost(&car, 100).unwrap().unwrap();
        assert!((cost - 50.0).abs() < 1e-9);

        car.fuel_type_id = Some(7);
        assert_eq!(inventory.trip_cost(&car, 100).unwrap(), None);
    }

    #[test]
    fn test_backup_before_import() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.snapshot.backup_before_import = true;
        let inventory = Inventory::open(dir.path(), &config).unwrap();
        inventory.add_fuel_type(&FuelType::new(1, "Diesel", 12.5)).unwrap();

        // nothing to import: no backup either
        inventory.import_from_snapshot().unwrap();
        assert!(!config.backup_path(dir.path()).exists());

        inventory.export_to_snapshot().unwrap();
        let outcome = inventory.import_from_snapshot().unwrap();
        assert!(outcome.is_imported());
        assert!(config.backup_path(dir.path()).exists());
    }
}
