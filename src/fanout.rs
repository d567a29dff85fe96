//! Copying one source file to every destination root

use crate::copy::copy_file;
use crate::error::{Result, SyncError};
use crate::event::{Reporter, SyncEvent};
use crate::fs::{FileRecord, FileSystem};
use crate::policy::{Decision, ReplacePolicy, SkipReason};
use crate::stats::SyncStats;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where one source file lives and where its copies go
///
/// Built fresh by the walker for each regular file it meets and dropped once
/// every destination has been attempted.
#[derive(Debug, Clone, Copy)]
pub struct CopyContext<'a> {
    /// Root of the source tree
    pub source_root: &'a Path,
    /// Directory of the file relative to the source root (empty at the root)
    pub sub_path: &'a Path,
    /// File name
    pub file_name: &'a OsStr,
}

impl CopyContext<'_> {
    /// Path relative to the source root, as shown in events
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.sub_path.join(self.file_name)
    }

    /// Absolute (or profile-relative) path of the source file
    #[must_use]
    pub fn source_file(&self) -> PathBuf {
        self.source_root.join(self.relative_path())
    }

    /// Directory under `destination_root` that mirrors the file's directory
    #[must_use]
    pub fn destination_dir(&self, destination_root: &Path) -> PathBuf {
        destination_root.join(self.sub_path)
    }
}

/// What happened for one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationOutcome {
    /// The file was written
    Copied { bytes: u64 },
    /// The replace policy left the existing file alone
    Skipped(SkipReason),
    /// Stat or copy failed
    Failed,
    /// The destination directory could not be created
    DirectoryUnavailable,
}

/// Summary over all destinations for one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FanOutResult {
    /// Copied to every destination
    Copied,
    /// Copied to some destinations but not all
    Partial { copied: usize, total: usize },
    /// Copied nowhere: skipped or failed everywhere
    NotCopied,
}

impl FanOutResult {
    fn from_counts(copied: usize, total: usize) -> Self {
        if copied == 0 {
            Self::NotCopied
        } else if copied == total {
            Self::Copied
        } else {
            Self::Partial { copied, total }
        }
    }
}

enum Attempt {
    Copied { bytes: u64, mtime_preserved: bool },
    Skipped(SkipReason),
}

/// Copy the file described by `ctx` to each of `destinations`, in order
///
/// Each destination is handled on its own: a directory that cannot be
/// created or a copy that fails is recorded and the next destination is
/// still attempted. Every destination gets exactly one outcome in `stats`,
/// and the source file is counted once as discovered.
///
/// # Errors
///
/// Only returns an error when called without any destination, which the
/// runner guards against.
pub async fn copy_to_destinations<F: FileSystem, R: Reporter>(
    fs: &F,
    ctx: &CopyContext<'_>,
    destinations: &[PathBuf],
    policy: ReplacePolicy,
    stats: &mut SyncStats,
    reporter: &mut R,
) -> Result<FanOutResult> {
    if destinations.is_empty() {
        return Err(SyncError::Internal(format!(
            "no destinations to copy {} to",
            ctx.relative_path().display()
        )));
    }

    let mut copied = 0;
    for destination in destinations {
        let outcome = copy_to_destination(fs, ctx, destination, policy, stats, reporter).await;
        if matches!(outcome, DestinationOutcome::Copied { .. }) {
            copied += 1;
        }
    }

    let result = FanOutResult::from_counts(copied, destinations.len());
    stats.record_source_file();
    reporter.report(SyncEvent::FileFinished {
        file: ctx.relative_path(),
        result,
    });
    Ok(result)
}

/// Handle one (file, destination) pair and record its outcome
pub async fn copy_to_destination<F: FileSystem, R: Reporter>(
    fs: &F,
    ctx: &CopyContext<'_>,
    destination: &Path,
    policy: ReplacePolicy,
    stats: &mut SyncStats,
    reporter: &mut R,
) -> DestinationOutcome {
    let file = ctx.relative_path();
    let dest_dir = ctx.destination_dir(destination);

    if let Err(e) = fs.create_dir_all(&dest_dir).await {
        let error = SyncError::fs("create directory", &dest_dir, &e);
        stats.record_destination_dir_failure();
        reporter.report(SyncEvent::DestinationUnavailable {
            file,
            destination: destination.to_path_buf(),
            error: error.to_string(),
        });
        return DestinationOutcome::DirectoryUnavailable;
    }

    let src = ctx.source_file();
    let dst = dest_dir.join(ctx.file_name);

    match attempt(fs, &src, &dst, policy).await {
        Ok(Attempt::Copied {
            bytes,
            mtime_preserved,
        }) => {
            stats.record_copy(bytes);
            reporter.report(SyncEvent::FileCopied {
                file,
                destination: destination.to_path_buf(),
                bytes,
                mtime_preserved,
            });
            DestinationOutcome::Copied { bytes }
        }
        Ok(Attempt::Skipped(reason)) => {
            stats.record_skip();
            reporter.report(SyncEvent::FileSkipped {
                file,
                destination: destination.to_path_buf(),
                reason,
            });
            DestinationOutcome::Skipped(reason)
        }
        Err(error) => {
            stats.record_failure();
            reporter.report(SyncEvent::FileFailed {
                file,
                destination: destination.to_path_buf(),
                error: error.to_string(),
            });
            DestinationOutcome::Failed
        }
    }
}

async fn attempt<F: FileSystem>(
    fs: &F,
    src: &Path,
    dst: &Path,
    policy: ReplacePolicy,
) -> Result<Attempt> {
    let source = fs
        .stat(src)
        .await
        .map_err(|e| SyncError::fs("stat source file", src, &e))?;
    if !source.is_file() {
        return Err(SyncError::NotRegularFile(src.to_path_buf()));
    }

    let existing = stat_destination(fs, dst).await?;
    if let Decision::Skip(reason) = policy.decide(&source, existing.as_ref()) {
        debug!("skipping {}: {}", dst.display(), reason);
        return Ok(Attempt::Skipped(reason));
    }

    let copied = copy_file(fs, src, dst, &source).await?;
    Ok(Attempt::Copied {
        bytes: copied.bytes,
        mtime_preserved: copied.mtime_preserved,
    })
}

/// `None` if nothing exists at `dst` yet
async fn stat_destination<F: FileSystem>(fs: &F, dst: &Path) -> Result<Option<FileRecord>> {
    match fs.stat(dst).await {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SyncError::fs("stat destination file", dst, &e)),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::fs::{FailOn, MemoryFs};
    use std::time::{Duration, SystemTime};

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn destinations() -> Vec<PathBuf> {
        vec![
            PathBuf::from("/g/saves"),
            PathBuf::from("/h/saves"),
            PathBuf::from("/i/saves"),
        ]
    }

    fn ctx<'a>(sub_path: &'a Path, file_name: &'a str) -> CopyContext<'a> {
        CopyContext {
            source_root: Path::new("/f/saves"),
            sub_path,
            file_name: OsStr::new(file_name),
        }
    }

    #[test]
    fn test_context_paths() {
        let ctx = ctx(Path::new("level1/level2"), "save.dat");
        assert_eq!(ctx.relative_path(), PathBuf::from("level1/level2/save.dat"));
        assert_eq!(
            ctx.source_file(),
            PathBuf::from("/f/saves/level1/level2/save.dat")
        );
        assert_eq!(
            ctx.destination_dir(Path::new("/g")),
            PathBuf::from("/g/level1/level2")
        );
    }

    #[test]
    fn test_result_from_counts() {
        assert_eq!(FanOutResult::from_counts(0, 3), FanOutResult::NotCopied);
        assert_eq!(FanOutResult::from_counts(3, 3), FanOutResult::Copied);
        assert_eq!(
            FanOutResult::from_counts(1, 3),
            FanOutResult::Partial {
                copied: 1,
                total: 3
            }
        );
    }

    #[compio::test]
    async fn test_copies_to_every_destination() {
        let fs = MemoryFs::new();
        fs.add_file("/f/saves/sub/a.sav", vec![7u8; 8600], at(10));
        let mut stats = SyncStats::new(3);
        let mut events = Vec::new();

        let result = copy_to_destinations(
            &fs,
            &ctx(Path::new("sub"), "a.sav"),
            &destinations(),
            ReplacePolicy::SkipIfIdentical,
            &mut stats,
            &mut events,
        )
        .await
        .unwrap();

        assert_eq!(result, FanOutResult::Copied);
        assert_eq!(stats.source_files_discovered, 1);
        assert_eq!(stats.files_copied, 3);
        assert_eq!(stats.bytes_copied, 3 * 8600);
        for dest in destinations() {
            let path = dest.join("sub/a.sav");
            assert_eq!(fs.read_file(&path).unwrap().len(), 8600);
            assert_eq!(fs.modified(&path), Some(at(10)));
        }
        assert_eq!(
            events.last(),
            Some(&SyncEvent::FileFinished {
                file: PathBuf::from("sub/a.sav"),
                result: FanOutResult::Copied
            })
        );
    }

    #[compio::test]
    async fn test_unavailable_destination_does_not_block_others() {
        let fs = MemoryFs::new();
        fs.add_file("/f/saves/a.sav", "data", at(10));
        fs.fail(FailOn::CreateDir, "/h");
        let mut stats = SyncStats::new(3);
        let mut events = Vec::new();

        let result = copy_to_destinations(
            &fs,
            &ctx(Path::new(""), "a.sav"),
            &destinations(),
            ReplacePolicy::Always,
            &mut stats,
            &mut events,
        )
        .await
        .unwrap();

        assert_eq!(
            result,
            FanOutResult::Partial {
                copied: 2,
                total: 3
            }
        );
        assert_eq!(stats.files_copied, 2);
        assert_eq!(stats.destination_dir_failures, 1);
        assert_eq!(stats.files_skipped, 0);
        assert!(fs.exists("/g/saves/a.sav"));
        assert!(!fs.exists("/h/saves/a.sav"));
        assert!(fs.exists("/i/saves/a.sav"));
        assert!(events.iter().any(|e| matches!(
            e,
            SyncEvent::DestinationUnavailable { destination, .. } if destination == Path::new("/h/saves")
        )));
    }

    #[compio::test]
    async fn test_never_policy_skips_existing_and_keeps_bytes() {
        let fs = MemoryFs::new();
        fs.add_file("/f/saves/a.sav", "new", at(20));
        fs.add_file("/h/saves/a.sav", "old", at(5));
        let mut stats = SyncStats::new(3);
        let mut events = Vec::new();

        let result = copy_to_destinations(
            &fs,
            &ctx(Path::new(""), "a.sav"),
            &destinations(),
            ReplacePolicy::Never,
            &mut stats,
            &mut events,
        )
        .await
        .unwrap();

        assert!(matches!(result, FanOutResult::Partial { copied: 2, .. }));
        assert_eq!(stats.files_skipped, 1);
        assert_eq!(stats.files_copied, 2);
        assert_eq!(fs.read_file("/h/saves/a.sav").unwrap(), b"old");
        assert!(events.contains(&SyncEvent::FileSkipped {
            file: PathBuf::from("a.sav"),
            destination: PathBuf::from("/h/saves"),
            reason: SkipReason::Exists,
        }));
    }

    #[compio::test]
    async fn test_open_failure_recorded_per_destination() {
        let fs = MemoryFs::new();
        fs.add_file("/f/saves/a.sav", "data", at(1));
        fs.fail(FailOn::Open, "/f/saves/a.sav");
        let mut stats = SyncStats::new(3);
        let mut events = Vec::new();

        let result = copy_to_destinations(
            &fs,
            &ctx(Path::new(""), "a.sav"),
            &destinations(),
            ReplacePolicy::SkipIfIdentical,
            &mut stats,
            &mut events,
        )
        .await
        .unwrap();

        assert_eq!(result, FanOutResult::NotCopied);
        assert_eq!(stats.files_failed, 3);
        assert_eq!(stats.source_files_discovered, 1);
        assert_eq!(stats.destination_outcomes(), 3);
    }

    #[compio::test]
    async fn test_vanished_source_is_a_failure() {
        let fs = MemoryFs::new();
        let mut stats = SyncStats::new(1);

        let outcome = copy_to_destination(
            &fs,
            &ctx(Path::new(""), "gone.sav"),
            Path::new("/g/saves"),
            ReplacePolicy::Always,
            &mut stats,
            &mut (),
        )
        .await;

        assert_eq!(outcome, DestinationOutcome::Failed);
        assert_eq!(stats.files_failed, 1);
    }

    #[compio::test]
    async fn test_no_destinations_is_internal_error() {
        let fs = MemoryFs::new();
        let mut stats = SyncStats::new(0);
        let err = copy_to_destinations(
            &fs,
            &ctx(Path::new(""), "a.sav"),
            &[],
            ReplacePolicy::Always,
            &mut stats,
            &mut (),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SyncError::Internal(_)));
    }
}
