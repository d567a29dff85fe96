//! Source tree traversal
//!
//! The walker lists `source_root/sub_path`, hands every regular file to the
//! destination fan-out and descends into every subdirectory. Symlinks,
//! devices, sockets and other special entries are ignored.
//!
//! Entries are visited in file name order and depth-first: a subdirectory is
//! finished completely before its next sibling is looked at. Instead of
//! recursing, the walker keeps a stack of open directory frames, so deep
//! trees do not grow the async call stack.

use crate::error::{Result, SyncError};
use crate::event::{Reporter, SyncEvent};
use crate::fanout::{copy_to_destinations, CopyContext};
use crate::fs::{DirEntry, EntryKind, FileSystem};
use crate::policy::ReplacePolicy;
use crate::stats::SyncStats;
use crate::sync::CancelToken;
use std::path::{Path, PathBuf};
use std::vec;
use tracing::{debug, trace, warn};

/// A directory that is being walked
struct Frame {
    /// Relative to the source root; empty for the root itself
    sub_path: PathBuf,
    /// Entries not yet visited, sorted by name
    entries: vec::IntoIter<DirEntry>,
}

/// Walks one source tree and mirrors it to every destination
pub struct TreeWalker<'a, F> {
    fs: &'a F,
    source_root: &'a Path,
    destinations: &'a [PathBuf],
    policy: ReplacePolicy,
    cancel: &'a CancelToken,
}

impl<'a, F: FileSystem> TreeWalker<'a, F> {
    #[must_use]
    pub const fn new(
        fs: &'a F,
        source_root: &'a Path,
        destinations: &'a [PathBuf],
        policy: ReplacePolicy,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            fs,
            source_root,
            destinations,
            policy,
            cancel,
        }
    }

    /// Walk the whole tree, recording every outcome in `stats`
    ///
    /// Unreadable directories are reported and skipped; per-destination copy
    /// problems are recorded by the fan-out. Neither stops the walk.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Cancelled`] if the cancel token fires, or
    /// [`SyncError::Internal`] if the fan-out is given no destinations.
    /// `stats` keeps everything counted up to that point.
    pub async fn walk<R: Reporter>(&self, stats: &mut SyncStats, reporter: &mut R) -> Result<()> {
        let mut stack = Vec::new();
        if let Some(root) = self.open(PathBuf::new(), stats, reporter).await {
            stack.push(root);
        }

        while let Some(frame) = stack.last_mut() {
            let Some(entry) = frame.entries.next() else {
                stack.pop();
                continue;
            };
            self.cancel.check()?;

            match entry.kind {
                EntryKind::File => {
                    let ctx = CopyContext {
                        source_root: self.source_root,
                        sub_path: &frame.sub_path,
                        file_name: &entry.name,
                    };
                    copy_to_destinations(
                        self.fs,
                        &ctx,
                        self.destinations,
                        self.policy,
                        stats,
                        reporter,
                    )
                    .await?;
                }
                EntryKind::Directory => {
                    let sub_path = frame.sub_path.join(&entry.name);
                    if let Some(child) = self.open(sub_path, stats, reporter).await {
                        stack.push(child);
                    }
                }
                EntryKind::Other => {
                    trace!(
                        "ignoring special entry {}",
                        frame.sub_path.join(&entry.name).display()
                    );
                }
            }
        }

        Ok(())
    }

    /// List one directory; `None` if it cannot be read
    async fn open<R: Reporter>(
        &self,
        sub_path: PathBuf,
        stats: &mut SyncStats,
        reporter: &mut R,
    ) -> Option<Frame> {
        let dir = self.source_root.join(&sub_path);
        match self.fs.read_dir(&dir).await {
            Ok(mut entries) => {
                entries.sort_by(|a, b| a.name.cmp(&b.name));
                debug!("walking {} ({} entries)", dir.display(), entries.len());
                Some(Frame {
                    sub_path,
                    entries: entries.into_iter(),
                })
            }
            Err(e) => {
                let error = SyncError::fs("read directory", &dir, &e);
                warn!("skipping {}: {}", dir.display(), error);
                stats.record_unreadable_directory();
                reporter.report(SyncEvent::DirectorySkipped {
                    path: sub_path,
                    error: error.to_string(),
                });
                None
            }
        }
    }
}
