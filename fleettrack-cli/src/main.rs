//! fleettrack CLI - Command-line interface
//!
//! Drives the fleettrack library from a terminal: replays a recorded trip
//! through the geofenced reporter, lists sites, and inspects stored records.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::sites::SitesArgs;
use commands::track::TrackArgs;

#[derive(Parser)]
#[command(name = "fleettrack")]
#[command(version = fleettrack::VERSION)]
#[command(about = "Geofenced position reporting for delivery vehicles", long_about = None)]
struct Cli {
    /// Use this config file instead of ~/.fleettrack/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded trip through the reporter until arrival or end of file
    Track(TrackArgs),

    /// List the sites a unit can arrive at
    Sites(SitesArgs),

    /// Show the stored location record for a unit
    Show {
        /// Unit identifier
        unit: String,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Track(args) => commands::track::run(args, config_path),
        Commands::Sites(args) => commands::sites::run(args, config_path),
        Commands::Show { unit } => commands::show::run(&unit, config_path),
        Commands::Config { command } => commands::config::run(command, config_path),
    };

    if let Err(e) = result {
        e.exit();
    }
}
