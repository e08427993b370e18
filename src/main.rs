use clap::{Parser, Subcommand};

mod cli;
mod config;
mod core;
mod error;
mod services;
mod signal_handler;
mod utils;

use cli::{detect, fetch, list, status, sync};
use config::Config;
use error::{Result, SongSyncError};
use services::SimpleServices;
use utils::progress::UiMode;

#[derive(Parser)]
#[command(name = "songsync")]
#[command(about = "Synchronize songs from a backend API into an OpenLP songs database")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path (optional)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull every song from the API into the OpenLP database
    Sync(sync::SyncArgs),

    /// Fetch a single song from the API
    Fetch(fetch::FetchArgs),

    /// List the songs the API serves
    List(list::ListArgs),

    /// Show songs in the OpenLP database that came from the API
    Status(status::StatusArgs),

    /// Find the OpenLP songs database in its default locations
    DetectDb(detect::DetectArgs),

    /// Show or change configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("❌ {}", e);
        std::process::exit(exit_code(&e));
    }
}

async fn run(cli: Cli) -> Result<()> {
    // Detect UI mode to determine logging behavior
    let ui_mode = UiMode::detect();

    utils::logging::init_logging(cli.verbose, ui_mode)?;

    let config_file = cli.config.as_deref();

    match cli.command {
        Commands::Sync(args) => sync::execute(args, &load_services(config_file)?, ui_mode).await,
        Commands::Fetch(args) => fetch::execute(args, &load_services(config_file)?).await,
        Commands::List(args) => list::execute(args, &load_services(config_file)?).await,
        Commands::Status(args) => status::execute(args, &load_services(config_file)?).await,
        Commands::DetectDb(args) => detect::execute(args).await,
        // Loads on its own so a broken config can still be inspected and repaired
        Commands::Config(args) => cli::config::execute(args, config_file).await,
    }
}

fn load_services(config_file: Option<&str>) -> Result<SimpleServices> {
    Ok(SimpleServices::new(Config::load(config_file)?))
}

fn exit_code(err: &SongSyncError) -> i32 {
    match err {
        SongSyncError::Cancelled => 130,
        _ => 1,
    }
}
