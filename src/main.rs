//! xtractor CLI entry point

use clap::Parser;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use xtractor::about;
use xtractor::config::{Cli, Config, Settings};
use xtractor::pipeline;

fn main() -> ExitCode {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli);
    debug!("{}", about::version_banner());

    // Configuration errors stop the run before anything is touched
    let settings = match Config::load(cli.config.as_deref())
        .and_then(|config| Settings::resolve(&cli, &config))
    {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(dir) = &settings.import {
        if !dir.is_dir() {
            eprintln!(
                "Error: Import directory does not exist: {}\n\n  Tip: Check the path is correct and accessible.\n  Example: xtractor --import ~/Music",
                dir.display()
            );
            return ExitCode::FAILURE;
        }
    }

    // Run the pipeline
    match pipeline::run(&settings) {
        Ok(result) => {
            if !settings.count_only {
                if result.total_items == 0 {
                    if !settings.quiet {
                        println!("No items to process");
                    }
                } else {
                    println!();
                    println!(
                        "Summary: {} successful, {} failed (of {} total)",
                        result.successful, result.failed, result.total_items
                    );
                }
            }
            // per-item failures are reported, not fatal
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = cli.log_level().to_string().to_lowercase();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
