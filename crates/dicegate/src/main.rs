// SPDX-FileCopyrightText: 2026 Dicegate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dicegate - a gateway bridging chat platforms into one dispatch pipeline.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod serve;
mod snapshot;
mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dicegate_config::DicegateConfig;
use dicegate_session::ShutdownOutcome;

/// Dicegate - a chat platform gateway.
#[derive(Parser, Debug)]
#[command(name = "dicegate", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect every enabled endpoint and run until SIGINT/SIGTERM.
    Serve,
    /// Show configured endpoints and the last saved snapshot.
    Status {
        /// Print machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate the configuration and exit.
    CheckConfig,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref());

    match cli.command {
        Some(Commands::Serve) => match serve::run_serve(config).await {
            Ok(ShutdownOutcome::Graceful) => {}
            Ok(ShutdownOutcome::Forced) => std::process::exit(0),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(e.status_code());
            }
        },
        Some(Commands::Status { json }) => {
            if let Err(e) = status::run_status(&config, json) {
                eprintln!("error: {e}");
                std::process::exit(e.status_code());
            }
        }
        Some(Commands::CheckConfig) => {
            let endpoints: usize = config.sessions.iter().map(|s| s.endpoints.len()).sum();
            println!(
                "dicegate: configuration OK ({} session(s), {endpoints} endpoint(s))",
                config.sessions.len()
            );
        }
        None => {
            println!("dicegate: use --help for available commands");
        }
    }
}

/// Loads and validates configuration, exiting with status 1 on any error.
fn load_config(path: Option<&std::path::Path>) -> DicegateConfig {
    let result = match path {
        Some(path) => dicegate_config::load_and_validate_path(path),
        None => dicegate_config::load_and_validate(),
    };
    match result {
        Ok(config) => config,
        Err(errors) => {
            dicegate_config::render_errors(&errors);
            std::process::exit(1);
        }
    }
}
