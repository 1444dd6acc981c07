//! CarApp - Car inventory backed by SQLite
//!
//! The engine owns the schema, numbered migrations, CRUD over cars and fuel
//! types, and full-dataset JSON snapshots. Terminal handling lives in the
//! `carapp-cli` binary.

pub mod engine;

pub use engine::{Car, Config, DataContainer, FuelType, GearType, Inventory};
