// SPDX-FileCopyrightText: 2026 Imgpress Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `imgpress retry` command implementation.
//!
//! The manual face of the retry sweep: selects stuck conversions by status,
//! time window, and attempt budget, resets them, and re-enqueues conversion
//! tasks. `--dry-run` previews the batch without mutating anything. The
//! command always exits 0; problems are reported in the output.

use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use imgpress_config::ImgpressConfig;
use imgpress_core::types::{RetryCriteria, RetryStatusFilter};
use imgpress_core::{ImageRecord, ImageStore};
use imgpress_pipeline::RetrySweeper;
use imgpress_storage::SqliteStore;

/// Options for `imgpress retry`.
#[derive(Args, Debug)]
pub struct RetryArgs {
    /// Retry conversions that failed in the last N hours (0 disables the window).
    #[arg(long, default_value_t = 24)]
    pub hours: i64,

    /// Maximum number of images to retry.
    #[arg(long, default_value_t = 50)]
    pub limit: i64,

    /// Status to retry (failed, permanently_failed, skipped, all).
    #[arg(long, default_value = "failed", value_parser = parse_status)]
    pub status: RetryStatusFilter,

    /// Force retry even if the attempt budget is spent.
    #[arg(long)]
    pub force: bool,

    /// Show what would be retried without actually doing it.
    #[arg(long)]
    pub dry_run: bool,
}

fn parse_status(s: &str) -> Result<RetryStatusFilter, String> {
    s.parse()
        .map_err(|_| format!("invalid status `{s}` (failed|permanently_failed|skipped|all)"))
}

/// Run the retry command. Never fails the process: errors are printed and
/// the command still exits 0.
pub async fn run_retry(config: ImgpressConfig, args: RetryArgs) {
    println!("{}", "Starting failed WebP conversions retry...".bold());
    println!();
    println!("Parameters:");
    println!("  • Hours: {}", args.hours);
    println!("  • Limit: {}", args.limit);
    println!("  • Status: {}", args.status);
    println!("  • Force: {}", if args.force { "Yes" } else { "No" });
    println!("  • Dry run: {}", if args.dry_run { "Yes" } else { "No" });
    println!();

    let store = Arc::new(SqliteStore::new(
        config.storage.clone(),
        config.conversion.max_attempts,
    ));
    if let Err(err) = store.initialize().await {
        eprintln!("{} {err}", "cannot open record store:".red());
        return;
    }
    let store_trait: Arc<dyn ImageStore> = store.clone();

    let criteria = RetryCriteria {
        hours: args.hours,
        limit: args.limit,
        status: args.status,
        force: args.force,
        max_attempts: config.conversion.max_attempts,
    };
    let sweeper = RetrySweeper::new(store_trait);

    if args.dry_run {
        match sweeper.sweep(&criteria, true).await {
            Ok(outcome) => {
                if outcome.candidates.is_empty() {
                    println!("{}", "No failed conversions found to retry.".yellow());
                } else {
                    print_dry_run_table(&outcome.candidates);
                    println!();
                    println!(
                        "Total: {} image(s) would be retried.",
                        outcome.candidates.len()
                    );
                }
            }
            Err(err) => eprintln!("{} {err}", "selection failed:".red()),
        }
        let _ = store.close().await;
        return;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("retrying conversions...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    match sweeper.sweep(&criteria, false).await {
        Ok(outcome) => {
            spinner.finish_and_clear();
            if outcome.candidates.is_empty() {
                println!("{}", "No failed conversions found to retry.".yellow());
            } else {
                println!("Found {} failed conversion(s).", outcome.candidates.len());
                if outcome.retried > 0 {
                    println!(
                        "{}",
                        format!("Successfully retried {} image(s).", outcome.retried).green()
                    );
                } else {
                    println!("{}", "No images were retried.".yellow());
                }
                let failed = outcome.candidates.len() as u64 - outcome.retried;
                if failed > 0 {
                    println!("{}", format!("{failed} image(s) could not be requeued.").red());
                }
            }
        }
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("{} {err}", "retry sweep failed:".red());
        }
    }

    let _ = store.close().await;
}

fn print_dry_run_table(candidates: &[ImageRecord]) {
    println!("Dry run results (would retry):");
    println!();
    println!(
        "{:<36} {:<12} {:<20} {:<19} {:<19} {:>8}  {}",
        "ID".bold(),
        "Owner".bold(),
        "Name".bold(),
        "Status".bold(),
        "Failed At".bold(),
        "Attempts".bold(),
        "Error".bold(),
    );
    for record in candidates {
        let failed_at = record
            .conversion_failed_at
            .or(record.conversion_skipped_at)
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "N/A".to_string());
        let error = record
            .conversion_error
            .as_deref()
            .unwrap_or("N/A")
            .chars()
            .take(30)
            .collect::<String>();
        println!(
            "{:<36} {:<12} {:<20} {:<19} {:<19} {:>8}  {}",
            record.id,
            record.owner_id,
            truncate(&record.original_name, 20),
            record.conversion_status,
            failed_at,
            record.conversion_attempts,
            error,
        );
    }
}

fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}
