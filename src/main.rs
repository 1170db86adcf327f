use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::database::sqlite;
use crate::database::InventoryStore;

pub mod control;
pub mod defaults;
pub mod database;
pub mod objects;
pub mod util;

fn init_tracing() {
    // Diagnostics go to stderr so command output stays clean, RUST_LOG overrides.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    // A missing .env file is fine, the environment and flags still apply.
    dotenv::dotenv().ok();
    init_tracing();
    let cli = control::Cli::parse();
    let mut sqlite = match sqlite::SQLite::open(&cli.database) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Unable to open database {}: {e}", cli.database.display());
            return ExitCode::FAILURE
        }
    };
    if let Err(e) = sqlite.setup() {
        eprintln!("Error setting up database: {e}");
        return ExitCode::FAILURE
    }
    match control::run(cli.command, &mut sqlite) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
