//! Run statistics

use std::time::Duration;

/// Counters accumulated over one mirroring run
///
/// Copy, skip and failure counters are per destination attempt: one source
/// file mirrored to three destinations can add up to three copies. After a
/// run, `files_copied + files_skipped + files_failed +
/// destination_dir_failures` equals `source_files_discovered *
/// destinations_configured`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Regular files found in the source tree
    pub source_files_discovered: u64,
    /// Destination roots in the profile
    pub destinations_configured: u64,
    /// Destination attempts skipped by the replace policy
    pub files_skipped: u64,
    /// Destination attempts that copied the file
    pub files_copied: u64,
    /// Bytes written across all destinations
    pub bytes_copied: u64,
    /// Destination attempts that failed while stating or copying
    pub files_failed: u64,
    /// Destination attempts abandoned because the directory could not be created
    pub destination_dir_failures: u64,
    /// Source directories that could not be listed
    pub directories_unreadable: u64,
    /// Wall-clock time of the run
    pub duration: Duration,
}

impl SyncStats {
    /// Fresh counters for a run with `destinations` destination roots
    #[must_use]
    pub fn new(destinations: usize) -> Self {
        Self {
            destinations_configured: destinations as u64,
            ..Self::default()
        }
    }

    pub fn record_source_file(&mut self) {
        self.source_files_discovered += 1;
    }

    pub fn record_copy(&mut self, bytes: u64) {
        self.files_copied += 1;
        self.bytes_copied += bytes;
    }

    pub fn record_skip(&mut self) {
        self.files_skipped += 1;
    }

    pub fn record_failure(&mut self) {
        self.files_failed += 1;
    }

    pub fn record_destination_dir_failure(&mut self) {
        self.destination_dir_failures += 1;
    }

    pub fn record_unreadable_directory(&mut self) {
        self.directories_unreadable += 1;
    }

    /// Number of (file, destination) outcomes recorded so far
    #[must_use]
    pub const fn destination_outcomes(&self) -> u64 {
        self.files_copied + self.files_skipped + self.files_failed + self.destination_dir_failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_destination_count() {
        let stats = SyncStats::new(3);
        assert_eq!(stats.destinations_configured, 3);
        assert_eq!(stats.destination_outcomes(), 0);
    }

    #[test]
    fn test_outcomes_sum_every_kind() {
        let mut stats = SyncStats::new(2);
        stats.record_copy(100);
        stats.record_copy(50);
        stats.record_skip();
        stats.record_failure();
        stats.record_destination_dir_failure();

        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.bytes_copied, 150);
        assert_eq!(stats.destination_outcomes(), 5);
    }
}
