//! CarApp Domain Model
//! Fuel types, cars and the snapshot container shared by the store and the codec

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A kind of fuel and its price per unit.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FuelType {
    pub id: i64,
    pub name: String,
    pub price: f64,
}

impl FuelType {
    pub fn new(id: i64, name: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("fuel type {} has an empty name", self.id));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(format!(
                "fuel type '{}' has an invalid price: {}",
                self.name, self.price
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GearType {
    #[serde(rename = "A")]
    Automatic,
    #[default]
    #[serde(rename = "M")]
    Manual,
}

impl GearType {
    pub fn as_char(self) -> char {
        match self {
            GearType::Automatic => 'A',
            GearType::Manual => 'M',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(GearType::Automatic),
            'M' => Some(GearType::Manual),
            _ => None,
        }
    }
}

impl fmt::Display for GearType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GearType::Automatic => write!(f, "Automatic"),
            GearType::Manual => write!(f, "Manual"),
        }
    }
}

impl std::str::FromStr for GearType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.trim().chars();
        let gear = match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_char(c),
            _ => match s.trim().to_ascii_lowercase().as_str() {
                "automatic" => Some(GearType::Automatic),
                "manual" => Some(GearType::Manual),
                _ => None,
            },
        };
        gear.ok_or_else(|| format!("unknown gear type '{}' (expected A or M)", s))
    }
}

impl ToSql for GearType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_char().to_string()))
    }
}

impl FromSql for GearType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        let mut chars = text.chars();
        match (chars.next().and_then(GearType::from_char), chars.next()) {
            (Some(gear), None) => Ok(gear),
            _ => Err(FromSqlError::Other(
                format!("invalid gear type '{}'", text).into(),
            )),
        }
    }
}

/// A car record.
///
/// `id` is 0 until the store assigns one. `is_engine_running` lives only in
/// the caller's session and is never persisted or exported.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Car {
    pub id: i64,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub gear_type: GearType,
    pub fuel_type_id: Option<i64>,
    pub fuel_efficiency: f64,
    pub mileage: u32,
    pub description: String,
    #[serde(skip)]
    pub is_engine_running: bool,
}

impl Car {
    pub fn new(brand: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            brand: brand.into(),
            model: model.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.brand.trim().is_empty() {
            return Err("car brand must not be empty".to_string());
        }
        if self.model.trim().is_empty() {
            return Err(format!("car model for '{}' must not be empty", self.brand));
        }
        if !self.fuel_efficiency.is_finite() || self.fuel_efficiency < 0.0 {
            return Err(format!(
                "car '{} {}' has an invalid fuel efficiency: {}",
                self.brand, self.model, self.fuel_efficiency
            ));
        }
        Ok(())
    }

    pub fn start_engine(&mut self) {
        self.is_engine_running = true;
    }

    pub fn stop_engine(&mut self) {
        self.is_engine_running = false;
    }

    /// Adds a tour to the odometer. With the engine off the tour is only simulated.
    pub fn drive(&mut self, km: u32) -> bool {
        if self.is_engine_running {
            self.mileage = self.mileage.saturating_add(km);
        }
        self.is_engine_running
    }

    /// Fuel required for `distance` km, or `None` without a usable efficiency.
    pub fn fuel_needed(&self, distance: u32) -> Option<f64> {
        if self.fuel_efficiency > 0.0 {
            Some(f64::from(distance) / self.fuel_efficiency)
        } else {
            None
        }
    }

    pub fn trip_cost(fuel_needed: f64, fuel_type: &FuelType) -> f64 {
        fuel_needed * fuel_type.price
    }

    pub fn has_palindrome_mileage(&self) -> bool {
        let odometer = self.mileage.to_string();
        odometer.bytes().eq(odometer.bytes().rev())
    }
}

/// Full-dataset snapshot as written to and read from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataContainer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_version: Option<u32>,
    #[serde(default)]
    pub cars: Vec<Car>,
    #[serde(default)]
    pub fuel_types: Vec<FuelType>,
}

impl DataContainer {
    pub fn is_empty(&self) -> bool {
        self.cars.is_empty() && self.fuel_types.is_empty()
    }

    /// Checks that the whole container can be inserted into an empty store:
    /// every record is valid, ids are unique and every car points at a fuel
    /// type from the same container.
    pub fn validate(&self) -> Result<(), String> {
        let mut fuel_ids = HashSet::new();
        for fuel_type in &self.fuel_types {
            fuel_type.validate()?;
            if !fuel_ids.insert(fuel_type.id) {
                return Err(format!("duplicate fuel type id {}", fuel_type.id));
            }
        }

        let mut car_ids = HashSet::new();
        for car in &self.cars {
            car.validate()?;
            // 0 means "assign on insert"
            if car.id != 0 && !car_ids.insert(car.id) {
                return Err(format!("duplicate car id {}", car.id));
            }
            if let Some(fuel_id) = car.fuel_type_id {
                if !fuel_ids.contains(&fuel_id) {
                    return Err(format!(
                        "car '{} {}' references unknown fuel type {}",
                        car.brand, car.model, fuel_id
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_car_json_shape() {
        let mut car = Car::new("Toyota", "Yaris");
        car.fuel_type_id = Some(1);
        car.mileage = 50000;
        car.start_engine();

        let value = serde_json::to_value(&car).unwrap();
        assert_eq!(value["brand"], json!("Toyota"));
        assert_eq!(value["fuelTypeId"], json!(1));
        assert_eq!(value["gearType"], json!("M"));
        assert!(value.get("isEngineRunning").is_none());
        assert!(value.get("is_engine_running").is_none());
    }

    #[test]
    fn test_car_defaults_for_missing_fields() {
        let car: Car = serde_json::from_value(json!({
            "brand": "Toyota",
            "model": "Yaris",
            "fuelTypeId": 1,
            "mileage": 50000
        }))
        .unwrap();

        assert_eq!(car.id, 0);
        assert_eq!(car.gear_type, GearType::Manual);
        assert_eq!(car.description, "");
        assert!(!car.is_engine_running);
    }

    #[test]
    fn test_gear_type_parsing() {
        assert_eq!("a".parse::<GearType>().unwrap(), GearType::Automatic);
        assert_eq!("Manual".parse::<GearType>().unwrap(), GearType::Manual);
        assert!("X".parse::<GearType>().is_err());
        assert!(serde_json::from_value::<GearType>(json!("Q")).is_err());
    }

    #[test]
    fn test_drive_requires_running_engine() {
        let mut car = Car::new("VW", "Golf");
        car.mileage = 100;

        assert!(!car.drive(50));
        assert_eq!(car.mileage, 100);

        car.start_engine();
        assert!(car.drive(50));
        assert_eq!(car.mileage, 150);

        car.stop_engine();
        car.drive(10);
        assert_eq!(car.mileage, 150);
    }

    #[test]
    fn test_trip_cost() {
        let mut car = Car::new("Skoda", "Octavia");
        assert_eq!(car.fuel_needed(100), None);

        car.fuel_efficiency = 20.0;
        let fuel = car.fuel_needed(100).unwrap();
        assert!((fuel - 5.0).abs() < f64::EPSILON);

        let diesel = FuelType::new(1, "Diesel", 12.5);
        assert!((Car::trip_cost(fuel, &diesel) - 62.5).abs() < 1e-9);
    }

    #[test]
    fn test_palindrome_mileage() {
        let mut car = Car::new("Fiat", "Panda");
        car.mileage = 12321;
        assert!(car.has_palindrome_mileage());
        car.mileage = 0;
        assert!(car.has_palindrome_mileage());
        car.mileage = 50000;
        assert!(!car.has_palindrome_mileage());
    }

    #[test]
    fn test_validation() {
        assert!(FuelType::new(1, "", 1.0).validate().is_err());
        assert!(FuelType::new(1, "Diesel", -1.0).validate().is_err());
        assert!(FuelType::new(1, "Diesel", 0.0).validate().is_ok());

        assert!(Car::new("", "Yaris").validate().is_err());
        assert!(Car::new("Toyota", " ").validate().is_err());
        assert!(Car::new("Toyota", "Yaris").validate().is_ok());
    }

    #[test]
    fn test_container_omits_missing_version() {
        let container = DataContainer::default();
        let value = serde_json::to_value(&container).unwrap();
        assert!(value.get("fileVersion").is_none());
        assert_eq!(value["cars"], json!([]));
        assert_eq!(value["fuelTypes"], json!([]));
        assert!(container.is_empty());
    }

    #[test]
    fn test_container_validation() {
        let mut car = Car::new("VW", "Up");
        car.fuel_type_id = Some(1);
        let mut container = DataContainer {
            file_version: Some(1),
            cars: vec![car, Car::new("Fiat", "Panda")],
            fuel_types: vec![FuelType::new(1, "Diesel", 12.5)],
        };
        assert!(container.validate().is_ok());

        container.cars[0].fuel_type_id = Some(2);
        let err = container.validate().unwrap_err();
        assert!(err.contains("unknown fuel type 2"), "{}", err);
        container.cars[0].fuel_type_id = Some(1);

        container.fuel_types.push(FuelType::new(1, "Benzin", 13.8));
        assert!(container.validate().unwrap_err().contains("duplicate fuel type id 1"));
        container.fuel_types.pop();

        container.cars[0].id = 4;
        container.cars[1].id = 4;
        assert!(container.validate().unwrap_err().contains("duplicate car id 4"));
        container.cars[1].id = 0;
        assert!(container.validate().is_ok());

        container.fuel_types[0].name = String::new();
        assert!(container.validate().is_err());
    }
}
