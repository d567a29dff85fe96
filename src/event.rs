//! Events emitted by the copy engine
//!
//! The engine does not print anything itself. Every user-visible outcome is
//! handed to a [`Reporter`] as a [`SyncEvent`] the moment it happens, and the
//! reporter decides how to present it (log lines, a progress bar, or a plain
//! `Vec` in tests).

use crate::fanout::FanOutResult;
use crate::policy::SkipReason;
use crate::sync::RunReport;
use std::path::PathBuf;

/// Something that happened during a run
///
/// `file` fields are paths relative to the source root; `destination` fields
/// are destination roots as configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// A source directory could not be listed; its subtree was skipped
    DirectorySkipped { path: PathBuf, error: String },
    /// The destination directory for a file could not be created
    DestinationUnavailable {
        file: PathBuf,
        destination: PathBuf,
        error: String,
    },
    /// The replace policy left an existing destination file alone
    FileSkipped {
        file: PathBuf,
        destination: PathBuf,
        reason: SkipReason,
    },
    /// The file was written to one destination
    FileCopied {
        file: PathBuf,
        destination: PathBuf,
        bytes: u64,
        /// False if the modification time could not be carried over
        mtime_preserved: bool,
    },
    /// Copying to one destination failed
    FileFailed {
        file: PathBuf,
        destination: PathBuf,
        error: String,
    },
    /// All destinations for one source file have been attempted
    FileFinished { file: PathBuf, result: FanOutResult },
}

/// Consumer of engine events
pub trait Reporter {
    /// Called once per event, in the order events happen
    fn report(&mut self, event: SyncEvent);

    /// Called once when the run ends, successful or not
    fn finish(&mut self, _report: &RunReport) {}
}

/// Collects events, mostly for tests
impl Reporter for Vec<SyncEvent> {
    fn report(&mut self, event: SyncEvent) {
        self.push(event);
    }
}

/// Discards events
impl Reporter for () {
    fn report(&mut self, _event: SyncEvent) {}
}
