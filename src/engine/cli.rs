//! CarApp CLI Module
//! Command-line interface for the car inventory

pub mod formatter;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "carapp")]
#[command(author = "CarApp Team")]
#[command(version)]
#[command(about = "Car inventory with SQLite storage and JSON snapshots", long_about = None)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Output format (json for scripting)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Car commands
    Cars {
        #[command(subcommand)]
        action: CarsAction,
    },

    /// Fuel type commands
    Fuel {
        #[command(subcommand)]
        action: FuelAction,
    },

    /// Replace all data with the snapshot file
    Import,

    /// Write all data to the snapshot file
    Export,

    /// Migration commands
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CarsAction {
    /// List all cars
    List,

    /// Add a car
    Add {
        /// Brand, e.g. Toyota
        #[arg(short, long)]
        brand: String,

        /// Model, e.g. Yaris
        #[arg(short, long)]
        model: String,

        /// Model year
        #[arg(short, long, default_value = "0")]
        year: i32,

        /// Gear type: A (automatic) or M (manual)
        #[arg(short, long, default_value = "M")]
        gear: String,

        /// Fuel type id
        #[arg(long)]
        fuel: Option<i64>,

        /// Fuel efficiency in km per unit of fuel
        #[arg(short, long, default_value = "0")]
        efficiency: f64,

        /// Current odometer reading in km
        #[arg(long, default_value = "0")]
        mileage: u32,

        /// Free text description
        #[arg(short, long, default_value = "")]
        description: String,
    },

    /// Show details for a car
    Show {
        /// Car id
        id: i64,
    },

    /// Drive a car, adding the distance to its mileage
    Drive {
        /// Car id
        id: i64,

        /// Distance in km
        km: u32,
    },

    /// Calculate fuel cost for a trip
    TripCost {
        /// Car id
        id: i64,

        /// Distance in km
        distance: u32,
    },

    /// Delete a car
    Delete {
        /// Car id
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum FuelAction {
    /// List fuel types ordered by name
    List,

    /// Add a fuel type
    Add {
        /// Fuel type id
        id: i64,

        /// Name, e.g. Diesel
        name: String,

        /// Price per unit of fuel
        price: f64,
    },
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Show schema version and applied migrations
    Status,

    /// Create the next numbered migration script
    Create {
        /// Migration name
        name: String,
    },
}

impl Cli {
    pub fn get_project_dir(&self) -> PathBuf {
        self.project
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_car() {
        let cli = Cli::try_parse_from([
            "carapp", "cars", "add", "--brand", "Toyota", "--model", "Yaris", "--fuel", "1",
            "--mileage", "50000", "--gear", "A",
        ])
        .unwrap();

        match cli.command {
            Commands::Cars {
                action: CarsAction::Add { brand, fuel, mileage, gear, .. },
            } => {
                assert_eq!(brand, "Toyota");
                assert_eq!(fuel, Some(1));
                assert_eq!(mileage, 50000);
                assert_eq!(gear, "A");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["carapp", "export", "--format", "json", "-p", "/tmp/cars"]).unwrap();
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.get_project_dir(), PathBuf::from("/tmp/cars"));
        assert!(matches!(cli.command, Commands::Export));
    }
}
