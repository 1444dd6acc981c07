// CarApp Engine - Core module structure
pub mod config;
pub mod models;
pub mod database;
pub mod migrations;
pub mod records;
pub mod snapshot;
pub mod transfer;
pub mod inventory;
pub mod cli;

pub use config::Config;
pub use database::Database;
pub use inventory::Inventory;
pub use models::{Car, DataContainer, FuelType, GearType};
pub use records::RecordStore;
