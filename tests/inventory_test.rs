use carapp_lib::engine::config::Config;
use carapp_lib::engine::transfer::ImportOutcome;
use carapp_lib::{Car, FuelType, Inventory};
use serde_json::{json, Value};
use std::fs;

#[test]
fn test_snapshot_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let inventory = Inventory::open_project(root.path())?;

    let snapshot = json!({
        "fileVersion": 1,
        "fuelTypes": [
            {"id": 1, "name": "Diesel", "price": 12.5},
            {"id": 2, "name": "Benzin", "price": 13.8}
        ],
        "cars": [
            {"brand": "Toyota", "model": "Yaris", "fuelTypeId": 1, "mileage": 50000}
        ]
    });
    fs::write(inventory.snapshot_path(), serde_json::to_string_pretty(&snapshot)?)?;

    let outcome = inventory.import_from_snapshot()?;
    assert!(matches!(outcome, ImportOutcome::Imported { fuel_types: 2, cars: 1 }));

    let cars = inventory.list_cars()?;
    assert_eq!(cars.len(), 1);
    assert!(cars[0].id > 0);
    assert_eq!((cars[0].brand.as_str(), cars[0].model.as_str()), ("Toyota", "Yaris"));
    assert_eq!(cars[0].fuel_type_id, Some(1));
    assert_eq!(cars[0].mileage, 50000);

    let names: Vec<String> = inventory.list_fuel_types()?.into_iter().map(|f| f.name).collect();
    assert_eq!(names, vec!["Benzin", "Diesel"]);

    Ok(())
}

#[test]
fn test_session_persists_across_reopen() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;

    let id = {
        let inventory = Inventory::open_project(root.path())?;
        inventory.add_fuel_type(&FuelType::new(1, "Diesel", 12.5))?;
        let mut car = Car::new("Skoda", "Octavia");
        car.fuel_type_id = Some(1);
        car.fuel_efficiency = 20.0;
        inventory.add_car(&car)?
    };

    let inventory = Inventory::open_project(root.path())?;
    let mut car = inventory.get_car(id)?.expect("car survives reopen");
    car.start_engine();
    car.drive(12_321);
    inventory.update_car(&car)?;

    let stored = inventory.get_car(id)?.expect("car still present");
    assert_eq!(stored.mileage, 12_321);
    assert!(stored.has_palindrome_mileage());
    assert!(!stored.is_engine_running);

    let cost = inventory.trip_cost(&stored, 100)?.expect("cost available");
    assert!((cost - 62.5).abs() < 1e-9);

    inventory.delete_car(&stored)?;
    assert!(inventory.list_cars()?.is_empty());
    Ok(())
}

#[test]
fn test_export_empty_store_writes_file() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let inventory = Inventory::open_project(root.path())?;

    let summary = inventory.export_to_snapshot()?;
    assert_eq!((summary.fuel_types, summary.cars), (0, 0));

    let value: Value = serde_json::from_str(&fs::read_to_string(inventory.snapshot_path())?)?;
    assert_eq!(value, json!({"fileVersion": 1, "cars": [], "fuelTypes": []}));
    Ok(())
}

#[test]
fn test_missing_snapshot_leaves_store_populated() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let inventory = Inventory::open_project(root.path())?;
    inventory.add_fuel_type(&FuelType::new(1, "Diesel", 12.5))?;

    let outcome = inventory.import_from_snapshot()?;
    assert!(matches!(outcome, ImportOutcome::NoSnapshot));
    assert_eq!(inventory.list_fuel_types()?.len(), 1);
    Ok(())
}

#[test]
fn test_migrations_from_project_config() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempfile::tempdir()?;
    let mut config = Config::default();
    config.database.path = "data/cars.db".into();
    config.migrations.dir = "sql".into();
    config.migrations.prefix = "Cars".into();
    config.save(root.path())?;

    fs::create_dir_all(root.path().join("sql"))?;
    fs::write(
        root.path().join("sql/Cars.1.sql"),
        "INSERT INTO FuelTypes (Id, Name, Price) VALUES (1, 'Diesel', 12.5);",
    )?;
    fs::write(
        root.path().join("sql/Cars.2.sql"),
        "ALTER TABLE FuelTypes ADD COLUMN Unit TEXT NOT NULL DEFAULT 'l';",
    )?;

    let inventory = Inventory::open_project(root.path())?;
    assert!(root.path().join("data/cars.db").exists());
    assert_eq!(inventory.applied_on_open().len(), 2);

    let status = inventory.migration_status()?;
    assert_eq!(status.current_version, 2);
    assert!(status.pending.is_empty());

    let created = inventory.create_migration("add notes")?;
    assert_eq!(created, root.path().join("sql/Cars.3.sql"));
    assert_eq!(inventory.migration_status()?.pending, vec!["Cars.3.sql"]);

    drop(inventory);
    let inventory = Inventory::open_project(root.path())?;
    assert_eq!(inventory.migration_status()?.current_version, 3);
    assert_eq!(inventory.get_fuel_type(1)?.map(|f| f.name), Some("Diesel".to_string()));
    Ok(())
}
