//! multicopy: mirror one source tree to several backup destinations
//!
//! Reads a named profile from the YAML config file and copies every regular
//! file below its source to each of its destinations, following the
//! profile's replace policy.

use anyhow::{Context, Result};
use clap::Parser;
use multicopy::cli::Args;
use multicopy::config::load_profile;
use multicopy::fs::LocalFs;
use multicopy::progress::{summary_lines, ConsoleReporter};
use multicopy::sync::Runner;
use std::io::{self, BufRead, Write};
use tracing::{info, Level};

#[compio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging based on verbosity and quiet mode
    if !args.quiet {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match args.verbose {
                0 => Level::WARN,
                1 => Level::INFO,
                2 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .with_target(false)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        // In quiet mode, only log errors
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::ERROR)
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)?;
    }

    // Validate arguments
    args.validate().context("Invalid arguments")?;

    let profile = load_profile(args.config.as_deref(), &args.operation)
        .with_context(|| format!("Cannot run operation \"{}\"", args.operation))?;
    profile
        .check_source(&args.operation)
        .with_context(|| format!("Cannot run operation \"{}\"", args.operation))?;

    info!("Starting multicopy v{}", env!("CARGO_PKG_VERSION"));
    info!("Operation: {} ({})", args.operation, profile.name);
    info!("Source: {}", profile.source.display());
    for destination in &profile.destinations {
        info!("Destination: {}", destination.display());
    }
    info!("Replace policy: {}", profile.replace);
    info!("Buffer size: {} KB", args.buffer_size_kb);

    let fs = LocalFs::new(args.buffer_size_bytes());
    let reporter = ConsoleReporter::new(args.progress && !args.quiet);
    let report = Runner::new(profile, fs, reporter).spawn().wait().await;

    if !args.quiet {
        println!("\nStats:");
        for line in summary_lines(&report) {
            println!("    {line}");
        }
        println!("\nCopy finished for operation: {}", args.operation);
    }

    if args.pause {
        pause()?;
    }

    Ok(())
}

fn pause() -> Result<()> {
    print!("Press enter to continue...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}
