//! CarApp CLI - Main entry point for CLI binary
//!
//! This binary provides the `carapp` CLI tool for managing the car inventory.

use anyhow::{anyhow, Context, Result};
use carapp_lib::engine::{
    cli::formatter::{car_row, format_km, format_price, fuel_row, CliFormatter},
    cli::{CarsAction, Cli, Commands, FuelAction, MigrateAction, OutputFormat},
    transfer::ImportOutcome,
    Car, FuelType, GearType, Inventory,
};
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run_cli(cli) {
        CliFormatter::error(&format!("Error: {:#}", e));
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("carapp_lib=debug,carapp_cli=debug,warn")
    } else {
        EnvFilter::new("carapp_lib=info,carapp_cli=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_cli(cli: Cli) -> Result<()> {
    let project_dir = cli.get_project_dir();
    let json_output = cli.format == OutputFormat::Json;
    let inventory = Inventory::open_project(&project_dir)
        .with_context(|| format!("opening inventory in {}", project_dir.display()))?;

    match cli.command {
        Commands::Cars { action } => cmd_cars(action, &inventory, json_output)?,
        Commands::Fuel { action } => cmd_fuel(action, &inventory, json_output)?,
        Commands::Import => cmd_import(&inventory, json_output)?,
        Commands::Export => cmd_export(&inventory, json_output)?,
        Commands::Migrate { action } => cmd_migrate(action, &inventory, json_output)?,
    }

    Ok(())
}

fn find_car(inventory: &Inventory, id: i64) -> Result<Car> {
    inventory
        .get_car(id)?
        .ok_or_else(|| anyhow!("No car with id {}", id))
}

fn cmd_cars(action: CarsAction, inventory: &Inventory, json: bool) -> Result<()> {
    match action {
        CarsAction::List => {
            let cars = inventory.list_cars()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cars)?);
            } else if cars.is_empty() {
                CliFormatter::info("No cars registered");
            } else {
                let rows: Vec<Vec<String>> = cars.iter().map(car_row).collect();
                CliFormatter::header("Cars");
                CliFormatter::table(&["Id", "Brand", "Model", "Year", "Mileage"], &rows);
            }
        }
        CarsAction::Add {
            brand,
            model,
            year,
            gear,
            fuel,
            efficiency,
            mileage,
            description,
        } => {
            let gear_type: GearType = gear.parse().map_err(|e: String| anyhow!(e))?;
            if let Some(fuel_id) = fuel {
                if inventory.get_fuel_type(fuel_id)?.is_none() {
                    return Err(anyhow!("No fuel type with id {}", fuel_id));
                }
            }
            let car = Car {
                year,
                gear_type,
                fuel_type_id: fuel,
                fuel_efficiency: efficiency,
                mileage,
                description,
                ..Car::new(brand, model)
            };
            let id = inventory.add_car(&car)?;
            if json {
                println!("{}", json!({ "success": true, "id": id }));
            } else {
                CliFormatter::success(&format!("Added {} {} (id {})", car.brand, car.model, id));
            }
        }
        CarsAction::Show { id } => {
            let car = find_car(inventory, id)?;
            let fuel = match car.fuel_type_id {
                Some(fuel_id) => inventory.get_fuel_type(fuel_id)?,
                None => None,
            };
            if json {
                println!(
                    "{}",
                    json!({
                        "car": car,
                        "fuelType": fuel,
                        "palindromeMileage": car.has_palindrome_mileage(),
                    })
                );
            } else {
                CliFormatter::header(&format!("{} {}", car.brand, car.model));
                CliFormatter::kv("Year", &car.year.to_string());
                CliFormatter::kv("Gear", &car.gear_type.to_string());
                CliFormatter::kv(
                    "Fuel",
                    fuel.as_ref().map(|f| f.name.as_str()).unwrap_or("(none)"),
                );
                CliFormatter::kv("Efficiency", &format!("{} km/l", car.fuel_efficiency));
                let mut mileage = format_km(car.mileage);
                if car.has_palindrome_mileage() {
                    mileage.push_str(" (palindrome)");
                }
                CliFormatter::kv("Mileage", &mileage);
                CliFormatter::kv("Description", &car.description);
            }
        }
        CarsAction::Drive { id, km } => {
            let mut car = find_car(inventory, id)?;
            car.start_engine();
            car.drive(km);
            car.stop_engine();
            inventory.update_car(&car)?;
            if json {
                println!("{}", json!({ "success": true, "id": id, "mileage": car.mileage }));
            } else {
                CliFormatter::success(&format!(
                    "{} {} drove {} km, mileage now {}",
                    car.brand,
                    car.model,
                    km,
                    format_km(car.mileage)
                ));
            }
        }
        CarsAction::TripCost { id, distance } => {
            let car = find_car(inventory, id)?;
            let fuel_needed = car.fuel_needed(distance);
            let cost = inventory.trip_cost(&car, distance)?;
            if json {
                println!(
                    "{}",
                    json!({ "id": id, "distance": distance, "fuelNeeded": fuel_needed, "cost": cost })
                );
            } else {
                match (fuel_needed, cost) {
                    (Some(fuel), Some(cost)) => {
                        CliFormatter::header(&format!("Trip of {}", format_km(distance)));
                        CliFormatter::kv("Fuel needed", &format!("{:.2} l", fuel));
                        CliFormatter::kv("Cost", &format_price(cost));
                    }
                    _ => CliFormatter::warning(
                        "Cost unavailable: the car needs a fuel efficiency and a known fuel type",
                    ),
                }
            }
        }
        CarsAction::Delete { id } => {
            let car = find_car(inventory, id)?;
            inventory.delete_car(&car)?;
            if json {
                println!("{}", json!({ "success": true, "id": id }));
            } else {
                CliFormatter::success(&format!("Deleted {} {}", car.brand, car.model));
            }
        }
    }

    Ok(())
}

fn cmd_fuel(action: FuelAction, inventory: &Inventory, json: bool) -> Result<()> {
    match action {
        FuelAction::List => {
            let fuel_types = inventory.list_fuel_types()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&fuel_types)?);
            } else if fuel_types.is_empty() {
                CliFormatter::info("No fuel types registered");
            } else {
                let rows: Vec<Vec<String>> = fuel_types.iter().map(fuel_row).collect();
                CliFormatter::header("Fuel types");
                CliFormatter::table(&["Id", "Name", "Price"], &rows);
            }
        }
        FuelAction::Add { id, name, price } => {
            let fuel_type = FuelType::new(id, name, price);
            inventory.add_fuel_type(&fuel_type)?;
            if json {
                println!("{}", json!({ "success": true, "id": id }));
            } else {
                CliFormatter::success(&format!("Added fuel type {}", fuel_type.name));
            }
        }
    }

    Ok(())
}

fn cmd_import(inventory: &Inventory, json: bool) -> Result<()> {
    let path = inventory.snapshot_path().display().to_string();
    let outcome = inventory.import_from_snapshot()?;

    if json {
        let value = match &outcome {
            ImportOutcome::Imported { fuel_types, cars } => {
                json!({ "imported": true, "fuelTypes": fuel_types, "cars": cars })
            }
            ImportOutcome::NoSnapshot => {
                json!({ "imported": false, "reason": "snapshot not found", "path": path })
            }
            ImportOutcome::Unreadable { cause } => {
                json!({ "imported": false, "reason": cause.to_string(), "path": path })
            }
        };
        println!("{}", value);
        return Ok(());
    }

    match outcome {
        ImportOutcome::Imported { fuel_types, cars } => {
            CliFormatter::success(&format!(
                "Imported {} fuel type(s) and {} car(s) from {}",
                fuel_types, cars, path
            ));
        }
        ImportOutcome::NoSnapshot => {
            CliFormatter::warning(&format!("No data imported: {} not found", path));
        }
        ImportOutcome::Unreadable { cause } => {
            CliFormatter::warning(&format!("No data imported: {}", cause));
        }
    }
    Ok(())
}

fn cmd_export(inventory: &Inventory, json: bool) -> Result<()> {
    let summary = inventory.export_to_snapshot()?;
    let path = inventory.snapshot_path().display().to_string();

    if json {
        println!(
            "{}",
            json!({ "success": true, "path": path, "fuelTypes": summary.fuel_types, "cars": summary.cars })
        );
    } else {
        CliFormatter::success(&format!(
            "Exported {} fuel type(s) and {} car(s) to {}",
            summary.fuel_types, summary.cars, path
        ));
    }
    Ok(())
}

fn cmd_migrate(action: MigrateAction, inventory: &Inventory, json: bool) -> Result<()> {
    match action {
        MigrateAction::Status => {
            let status = inventory.migration_status()?;
            if json {
                let applied: Vec<_> = status
                    .applied
                    .iter()
                    .map(|a| json!({ "version": a.version, "name": a.name, "appliedAt": a.applied_at }))
                    .collect();
                println!(
                    "{}",
                    json!({
                        "version": status.current_version,
                        "applied": applied,
                        "pending": status.pending,
                    })
                );
            } else {
                CliFormatter::header("Migration Status");
                CliFormatter::kv("Schema version", &status.current_version.to_string());
                CliFormatter::kv("Pending", &status.pending.len().to_string());
                for entry in &status.applied {
                    CliFormatter::item(&format!("{} ({})", entry.name, entry.applied_at));
                }
                for name in &status.pending {
                    CliFormatter::item(&format!("{} (pending)", name));
                }
            }
        }
        MigrateAction::Create { name } => {
            let path = inventory.create_migration(&name)?;
            if json {
                println!("{}", json!({ "success": true, "path": path.display().to_string() }));
            } else {
                CliFormatter::success(&format!("Created migration: {}", path.display()));
                CliFormatter::info("It is applied the next time the inventory is opened");
            }
        }
    }

    Ok(())
}
