// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Imgpress - image upload, dedup, and asynchronous WebP conversion.
//!
//! This is the binary entry point for the Imgpress service.

use clap::{Parser, Subcommand};

mod doctor;
mod retry;
mod serve;

/// Imgpress - image upload, dedup, and asynchronous WebP conversion.
#[derive(Parser, Debug)]
#[command(name = "imgpress", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the gateway, conversion workers, and scheduled retry sweep.
    Serve,
    /// Retry failed WebP conversions.
    Retry(retry::RetryArgs),
    /// Run environment diagnostics.
    Doctor {
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let config = match imgpress_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            imgpress_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(err) = serve::run_serve(config).await {
                eprintln!("imgpress serve: {err}");
                std::process::exit(1);
            }
        }
        Some(Commands::Retry(args)) => {
            // The retry command always exits 0; failures are reported on
            // stderr and in the summary counts.
            retry::run_retry(config, args).await;
        }
        Some(Commands::Doctor { plain }) => {
            let failed = doctor::run_doctor(&config, plain).await;
            if failed {
                std::process::exit(1);
            }
        }
        None => {
            println!("imgpress: use --help for available commands");
        }
    }
}
