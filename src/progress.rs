//! Console reporting: event logging, progress spinner and the final summary

use crate::event::{Reporter, SyncEvent};
use crate::fanout::FanOutResult;
use crate::sync::{RunOutcome, RunReport};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Logs every engine event through `tracing` and optionally drives a spinner
pub struct ConsoleReporter {
    progress_bar: ProgressBar,
    files_copied: u64,
    bytes_copied: u64,
}

impl ConsoleReporter {
    /// `show_progress` turns the spinner on; without it only log lines appear
    #[must_use]
    pub fn new(show_progress: bool) -> Self {
        let pb = if show_progress {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        if show_progress {
            pb.enable_steady_tick(Duration::from_millis(120));
        }

        Self {
            progress_bar: pb,
            files_copied: 0,
            bytes_copied: 0,
        }
    }

    fn update_message(&self) {
        self.progress_bar.set_message(format!(
            "{} copies, {} bytes",
            group_thousands(self.files_copied),
            group_thousands(self.bytes_copied)
        ));
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, event: SyncEvent) {
        // Log lines would otherwise be drawn over by the spinner
        self.progress_bar.suspend(|| log_event(&event));

        if let SyncEvent::FileCopied { bytes, .. } = event {
            self.files_copied += 1;
            self.bytes_copied += bytes;
            self.update_message();
        }
        self.progress_bar.tick();
    }

    fn finish(&mut self, report: &RunReport) {
        let message = match &report.outcome {
            RunOutcome::Completed => "Copy completed".to_string(),
            RunOutcome::Cancelled => "Copy cancelled".to_string(),
            RunOutcome::Aborted(reason) => format!("Copy aborted: {reason}"),
        };
        self.progress_bar.finish_with_message(message);
    }
}

fn log_event(event: &SyncEvent) {
    match event {
        SyncEvent::DirectorySkipped { path, error } => {
            warn!("Skipping directory {}: {}", path.display(), error);
        }
        SyncEvent::DestinationUnavailable {
            file,
            destination,
            error,
        } => {
            warn!(
                "{} was not copied to {}: {}",
                file.display(),
                destination.display(),
                error
            );
        }
        SyncEvent::FileSkipped {
            file,
            destination,
            reason,
        } => {
            warn!(
                "{} was not copied to {} as {}",
                file.display(),
                destination.display(),
                reason
            );
        }
        SyncEvent::FileCopied {
            file,
            destination,
            bytes,
            mtime_preserved,
        } => {
            info!(
                "{} copied to {} ({} bytes)",
                file.display(),
                destination.display(),
                group_thousands(*bytes)
            );
            if !mtime_preserved {
                warn!(
                    "{} in {} does not carry the source modification time",
                    file.display(),
                    destination.display()
                );
            }
        }
        SyncEvent::FileFailed {
            file,
            destination,
            error,
        } => {
            error!(
                "{} could not be copied to {}: {}",
                file.display(),
                destination.display(),
                error
            );
        }
        SyncEvent::FileFinished { file, result } => match result {
            FanOutResult::Copied => debug!("{} copied to all destinations", file.display()),
            FanOutResult::Partial { copied, total } => info!(
                "{} copied to {} of {} destinations",
                file.display(),
                copied,
                total
            ),
            FanOutResult::NotCopied => debug!("{} not copied anywhere", file.display()),
        },
    }
}

/// `1234567` -> `"1,234,567"`
#[must_use]
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Lines of the end-of-run summary, in display order
#[must_use]
pub fn summary_lines(report: &RunReport) -> Vec<String> {
    let stats = &report.stats;
    let outcome = match &report.outcome {
        RunOutcome::Completed => "completed".to_string(),
        RunOutcome::Cancelled => "cancelled".to_string(),
        RunOutcome::Aborted(reason) => format!("aborted ({reason})"),
    };

    vec![
        format!("Operation: {} ({outcome})", report.profile),
        format!(
            "Source files discovered: {}",
            group_thousands(stats.source_files_discovered)
        ),
        format!(
            "Destinations configured: {}",
            group_thousands(stats.destinations_configured)
        ),
        format!("Files skipped: {}", group_thousands(stats.files_skipped)),
        format!("Files copied: {}", group_thousands(stats.files_copied)),
        format!("Bytes copied: {}", group_thousands(stats.bytes_copied)),
        format!("Files failed: {}", group_thousands(stats.files_failed)),
        format!(
            "Destination directory failures: {}",
            group_thousands(stats.destination_dir_failures)
        ),
        format!(
            "Unreadable source directories: {}",
            group_thousands(stats.directories_unreadable)
        ),
        format!("Elapsed: {:.3} seconds", stats.duration.as_secs_f64()),
    ]
}
