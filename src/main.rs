mod cli;
mod clock;
mod config;
mod engine;
mod model;
mod notify;
mod store;

use std::process;

use tracing_subscriber::EnvFilter;

use config::Config;
use store::SqliteStore;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let db_path = SqliteStore::default_path().unwrap_or_else(|| {
        eprintln!("Could not determine home directory.");
        process::exit(1);
    });

    let store = match SqliteStore::new(db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to initialize storage: {e}");
            process::exit(1);
        }
    };

    if let Err(e) = cli::run(&config, store) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
