//! CarApp Record Store
//! CRUD over the Cars and FuelTypes tables. Each call checks out its own
//! pooled connection and returns it on every exit path.

use crate::engine::database::{Database, DatabaseError, OperationContext};
use crate::engine::models::{Car, FuelType};
use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

const CAR_COLUMNS: &str =
    "Id, Brand, Model, Year, GearType, FuelTypeId, FuelEfficiency, Mileage, Description";

fn car_from_row(row: &Row<'_>) -> rusqlite::Result<Car> {
    Ok(Car {
        id: row.get(0)?,
        brand: row.get(1)?,
        model: row.get(2)?,
        year: row.get(3)?,
        gear_type: row.get(4)?,
        fuel_type_id: row.get(5)?,
        fuel_efficiency: row.get(6)?,
        mileage: row.get(7)?,
        description: row.get(8)?,
        is_engine_running: false,
    })
}

fn fuel_type_from_row(row: &Row<'_>) -> rusqlite::Result<FuelType> {
    Ok(FuelType {
        id: row.get(0)?,
        name: row.get(1)?,
        price: row.get(2)?,
    })
}

#[derive(Clone)]
pub struct RecordStore {
    db: Database,
}

impl RecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn list_cars(&self) -> Result<Vec<Car>, DatabaseError> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {} FROM Cars", CAR_COLUMNS))
            .context("list cars")?;
        let cars = stmt
            .query_map([], car_from_row)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .context("list cars")?;
        Ok(cars)
    }

    pub fn get_car(&self, id: i64) -> Result<Option<Car>, DatabaseError> {
        let conn = self.db.get_connection()?;
        let car = conn
            .query_row(
                &format!("SELECT {} FROM Cars WHERE Id = ?1", CAR_COLUMNS),
                params![id],
                car_from_row,
            )
            .optional()
            .context("get car")?;
        Ok(car)
    }

    /// Fuel types ordered by name.
    pub fn list_fuel_types(&self) -> Result<Vec<FuelType>, DatabaseError> {
        let conn = self.db.get_connection()?;
        let mut stmt = conn
            .prepare("SELECT Id, Name, Price FROM FuelTypes ORDER BY Name")
            .context("list fuel types")?;
        let fuel_types = stmt
            .query_map([], fuel_type_from_row)
            .and_then(|rows| rows.collect::<Result<Vec<_>, _>>())
            .context("list fuel types")?;
        Ok(fuel_types)
    }

    pub fn get_fuel_type(&self, id: i64) -> Result<Option<FuelType>, DatabaseError> {
        let conn = self.db.get_connection()?;
        let fuel_type = conn
            .query_row(
                "SELECT Id, Name, Price FROM FuelTypes WHERE Id = ?1",
                params![id],
                fuel_type_from_row,
            )
            .optional()
            .context("get fuel type")?;
        Ok(fuel_type)
    }

    /// Inserts a car. The store assigns the id; `car.id` is ignored.
    /// Returns the assigned id.
    pub fn add_car(&self, car: &Car) -> Result<i64, DatabaseError> {
        car.validate().map_err(DatabaseError::InvalidRecord)?;
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO Cars (Brand, Model, Year, GearType, FuelTypeId, FuelEfficiency, Mileage, Description)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                car.brand,
                car.model,
                car.year,
                car.gear_type,
                car.fuel_type_id,
                car.fuel_efficiency,
                car.mileage,
                car.description
            ],
        )
        .context("add car")?;
        let id = conn.last_insert_rowid();
        debug!(id, brand = %car.brand, model = %car.model, "Car added");
        Ok(id)
    }

    /// Inserts a car keeping its id when it has one. Used when restoring a snapshot.
    pub fn restore_car(&self, car: &Car) -> Result<i64, DatabaseError> {
        if car.id == 0 {
            return self.add_car(car);
        }
        car.validate().map_err(DatabaseError::InvalidRecord)?;
        let conn = self.db.get_connection()?;
        conn.execute(
            &format!(
                "INSERT INTO Cars ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                CAR_COLUMNS
            ),
            params![
                car.id,
                car.brand,
                car.model,
                car.year,
                car.gear_type,
                car.fuel_type_id,
                car.fuel_efficiency,
                car.mileage,
                car.description
            ],
        )
        .context("restore car")?;
        debug!(id = car.id, "Car restored");
        Ok(car.id)
    }

    /// Deletes by id. A missing id is not an error.
    pub fn delete_car(&self, car: &Car) -> Result<(), DatabaseError> {
        let conn = self.db.get_connection()?;
        let affected = conn
            .execute("DELETE FROM Cars WHERE Id = ?1", params![car.id])
            .context("delete car")?;
        debug!(id = car.id, affected, "Car deleted");
        Ok(())
    }

    /// Replaces every stored field of the car with the same id. A missing id is not an error.
    pub fn update_car(&self, car: &Car) -> Result<(), DatabaseError> {
        car.validate().map_err(DatabaseError::InvalidRecord)?;
        let conn = self.db.get_connection()?;
        let affected = conn
            .execute(
                "UPDATE Cars SET Brand = ?1, Model = ?2, Year = ?3, GearType = ?4, FuelTypeId = ?5,
                 FuelEfficiency = ?6, Mileage = ?7, Description = ?8
                 WHERE Id = ?9",
                params![
                    car.brand,
                    car.model,
                    car.year,
                    car.gear_type,
                    car.fuel_type_id,
                    car.fuel_efficiency,
                    car.mileage,
                    car.description,
                    car.id
                ],
            )
            .context("update car")?;
        debug!(id = car.id, affected, "Car updated");
        Ok(())
    }

    /// Inserts a fuel type with the caller's id, so imported cars keep valid references.
    pub fn add_fuel_type(&self, fuel_type: &FuelType) -> Result<(), DatabaseError> {
        fuel_type.validate().map_err(DatabaseError::InvalidRecord)?;
        let conn = self.db.get_connection()?;
        conn.execute(
            "INSERT INTO FuelTypes (Id, Name, Price) VALUES (?1, ?2, ?3)",
            params![fuel_type.id, fuel_type.name, fuel_type.price],
        )
        .context("add fuel type")?;
        debug!(id = fuel_type.id, name = %fuel_type.name, "Fuel type added");
        Ok(())
    }

    pub fn clear_cars(&self) -> Result<usize, DatabaseError> {
        let conn = self.db.get_connection()?;
        let removed = conn.execute("DELETE FROM Cars", []).context("clear cars")?;
        debug!(removed, "Cars table cleared");
        Ok(removed)
    }

    pub fn clear_fuel_types(&self) -> Result<usize, DatabaseError> {
        let conn = self.db.get_connection()?;
        let removed = conn
            .execute("DELETE FROM FuelTypes", [])
            .context("clear fuel types")?;
        debug!(removed, "FuelTypes table cleared");
        Ok(removed)
    }

    pub fn count_cars(&self) -> Result<usize, DatabaseError> {
        self.count("Cars", "count cars")
    }

    pub fn count_fuel_types(&self) -> Result<usize, DatabaseError> {
        self.count("FuelTypes", "count fuel types")
    }

    fn count(&self, table: &str, operation: &'static str) -> Result<usize, DatabaseError> {
        let conn = self.db.get_connection()?;
        // Out of range values surface as a conversion error rather than wrapping.
        let count: usize = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .context(operation)?;
        Ok(count)
    }
}
