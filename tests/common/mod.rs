//! Shared helpers for the integration tests
#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use filetime::FileTime;
use multicopy::{LocalFs, Profile, ReplacePolicy, RunReport, Runner};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use walkdir::WalkDir;

/// Sizes of the three files in the standard save-game fixture
pub const FIXTURE_SIZES: [usize; 3] = [8600, 8640, 86400];

pub struct TestTimeoutGuard {
    cancelled: Arc<AtomicBool>,
}

impl Drop for TestTimeoutGuard {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Abort the test process if the guard is still alive after `duration`
pub fn test_timeout_guard(duration: Duration) -> TestTimeoutGuard {
    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_clone = Arc::clone(&cancelled);
    std::thread::spawn(move || {
        std::thread::sleep(duration);
        if !cancelled_clone.load(Ordering::SeqCst) {
            eprintln!("Test timeout exceeded ({}s). Aborting.", duration.as_secs());
            std::process::abort();
        }
    });
    TestTimeoutGuard { cancelled }
}

/// Write `len` bytes of patterned data and pin the modification time
pub fn write_file(path: &Path, len: usize, mtime_secs: i64) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
    std::fs::write(path, data).unwrap();
    filetime::set_file_mtime(path, FileTime::from_unix_time(mtime_secs, 0)).unwrap();
}

/// Three save files in `dir` with the fixture sizes
pub fn write_fixture(dir: &Path) {
    for (i, len) in FIXTURE_SIZES.iter().enumerate() {
        write_file(&dir.join(format!("save{}.dat", i + 1)), *len, 1_600_000_000);
    }
}

pub fn fixture_bytes() -> u64 {
    FIXTURE_SIZES.iter().map(|n| *n as u64).sum()
}

pub fn profile(source: &Path, destinations: &[PathBuf], replace: ReplacePolicy) -> Profile {
    Profile {
        name: "test".to_string(),
        source: source.to_path_buf(),
        destinations: destinations.to_vec(),
        replace,
    }
}

/// Run a profile against the real filesystem and return the report
pub async fn run(profile: Profile) -> RunReport {
    let mut runner = Runner::new(profile, LocalFs::default(), ());
    runner.run().await.unwrap()
}

/// Regular files below `root`, relative and sorted
pub fn files_under(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().strip_prefix(root).unwrap().to_path_buf())
        .collect();
    files.sort();
    files
}

pub fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&std::fs::metadata(path).unwrap())
}
