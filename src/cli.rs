//! Command-line interface definitions

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

/// Mirror one source directory to several backup destinations
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Name of the profile to run, as written in the config file
    #[arg(short, long)]
    pub operation: String,

    /// Config file to read instead of searching for multicopy-config.yml
    /// in ., cmd/, config/ and configs/
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Copy buffer size in KB (0 = default of 64 KB)
    #[arg(long, default_value = "64")]
    pub buffer_size_kb: usize,

    /// Show a progress spinner
    #[arg(long)]
    pub progress: bool,

    /// Wait for Enter before exiting
    #[arg(long)]
    pub pause: bool,

    /// Verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress all output except errors)
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Validate command-line arguments
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The operation name is blank
    /// - Buffer size is too large (>1GB)
    /// - Both --quiet and --verbose options are used
    pub fn validate(&self) -> Result<()> {
        if self.operation.trim().is_empty() {
            anyhow::bail!("Operation name must not be empty");
        }

        if self.buffer_size_kb > 1024 * 1024 {
            anyhow::bail!(
                "Buffer size too large (max 1GB): {} KB",
                self.buffer_size_kb
            );
        }

        if self.quiet && self.verbose > 0 {
            anyhow::bail!("Cannot use both --quiet and --verbose options");
        }

        Ok(())
    }

    /// Get the actual buffer size in bytes
    #[must_use]
    pub const fn buffer_size_bytes(&self) -> usize {
        self.buffer_size_kb * 1024
    }
}
