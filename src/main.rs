mod commands;
mod config;
mod database;
mod entities;
mod logging;
mod ports;
mod services;
mod store;
#[cfg(test)]
mod test_utils;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::{Result, eyre::Context};

use crate::{
    commands::{
        ArtistCommands, AvailabilityCommands, Output, ShowCommands, VenueCommands, run_artist,
        run_availability, run_show, run_venue,
    },
    config::Config,
    database::Database,
    logging::setup_logging,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "VENUE_BOOKING_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config
    #[arg(long, env = "VENUE_BOOKING_DATABASE", global = true)]
    database: Option<PathBuf>,

    /// Console log level (default: from config, else off)
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<log::LevelFilter>,

    /// File log level (default: from config, else debug)
    #[arg(long, global = true)]
    log_file_level: Option<log::LevelFilter>,

    /// Path to log file
    #[arg(long, env = "VENUE_BOOKING_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Manage artists
    #[command(subcommand)]
    Artist(ArtistCommands),
    /// Manage venues
    #[command(subcommand)]
    Venue(VenueCommands),
    /// Manage artist availability windows
    #[command(subcommand)]
    Availability(AvailabilityCommands),
    /// Book and list shows
    #[command(subcommand)]
    Show(ShowCommands),
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Create a default config file, if it doesn't exist
    CreateDefault,
    /// Print the path to the config file
    Path,
}

fn level(configured: &str, fallback: log::LevelFilter) -> log::LevelFilter {
    configured.parse().unwrap_or(fallback)
}

async fn open_database(path: &std::path::Path) -> Result<Arc<Database>> {
    log::debug!("Opening database at: {}", path.display());
    Ok(Arc::new(Database::open(path).await?))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load venue-booking config")?;

    setup_logging(
        args.log_level
            .unwrap_or_else(|| level(&config.logging.level, log::LevelFilter::Off)),
        args.log_file.clone().or_else(|| config.log_file_path()),
        args.log_file_level
            .unwrap_or_else(|| level(&config.logging.file_level, log::LevelFilter::Debug)),
    )?;

    log::debug!("Venue booking starting");

    let config = match &args.database {
        Some(database) => config.with_database(database.to_string_lossy().to_string()),
        None => config,
    };
    let database_path = config.database_path();

    let out = Output { json: args.json };

    match args.command {
        Commands::Config(config_commands) => match config_commands {
            ConfigCommands::CreateDefault => {
                log::debug!("Creating default config");
                let path = Config::create_default()?;
                println!("{}", path.display());
                log::info!("Default config created successfully");
            }
            ConfigCommands::Path => match Config::config_path() {
                Some(path) => println!("{}", path.display()),
                None => println!("No default config path found"),
            },
        },
        Commands::Artist(command) => {
            run_artist(command, open_database(&database_path).await?, &out).await?
        }
        Commands::Venue(command) => {
            run_venue(command, open_database(&database_path).await?, &out).await?
        }
        Commands::Availability(command) => {
            run_availability(command, open_database(&database_path).await?, &out).await?
        }
        Commands::Show(command) => {
            run_show(command, open_database(&database_path).await?, &out).await?
        }
    }

    Ok(())
}
