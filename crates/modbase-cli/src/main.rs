//! Modbase Command-Line Loader
//!
//! Installs or updates module sets against a database profile.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Modbase Command-Line Loader
#[derive(Parser, Debug)]
#[command(name = "modbase")]
#[command(version, about = "Modbase module loader")]
pub struct Args {
    /// Directory holding one subdirectory per module
    #[arg(short = 'd', long, default_value = "modules")]
    pub modules_dir: PathBuf,

    /// Database profile ("memory" is the only built-in profile)
    #[arg(short = 'D', long, default_value = "memory")]
    pub database: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Load commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Install modules that are not yet initialized
    Install {
        /// Module names to install
        #[arg(required = true)]
        modules: Vec<String>,
    },
    /// Re-run synchronization and metadata for installed modules
    Update {
        /// Module names to update
        #[arg(required = true)]
        modules: Vec<String>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("modbase_cli=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = commands::run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
