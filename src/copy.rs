//! Single file copy with modification time preservation
//!
//! The copy runs in four steps, in this order:
//!
//! 1. Open the source for reading and create/truncate the destination
//! 2. Stream every byte from source to destination
//! 3. Flush the destination to stable storage and close it
//! 4. Set the destination's access and modification time to the source's
//!    modification time
//!
//! Step 3 has to finish before step 4: a timestamp set on a file that still
//! has buffered writes can be overwritten when those writes land.
//!
//! Nothing is rolled back on failure. If the copy fails after the
//! destination was created, the destination may be left empty or partially
//! written.
//!
//! # Usage
//!
//! ```rust,ignore
//! use multicopy::copy::copy_file;
//! use multicopy::fs::{FileSystem, LocalFs};
//!
//! let fs = LocalFs::default();
//! let source = fs.stat(src_path).await?;
//! let copied = copy_file(&fs, src_path, dst_path, &source).await?;
//! println!("{} bytes", copied.bytes);
//! ```

use crate::error::{Result, SyncError};
use crate::fs::{FileRecord, FileSystem};
use std::path::Path;
use tracing::{debug, warn};

/// Result of a successful copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopiedFile {
    /// Bytes written to the destination
    pub bytes: u64,
    /// Whether the destination got the source's modification time
    pub mtime_preserved: bool,
}

/// Copy `src` to `dst` and carry over the modification time
///
/// `source` is the metadata snapshot of `src` taken by the caller; its
/// modification time is what the destination receives. The destination's
/// parent directory must already exist.
///
/// # Errors
///
/// This function will return an error if:
/// - `source` is not a regular file (nothing is opened in that case)
/// - The source cannot be opened or the destination cannot be created
/// - Reading, writing, flushing or closing fails
///
/// A failure to set the timestamp is not an error: it is logged and reported
/// through [`CopiedFile::mtime_preserved`].
pub async fn copy_file<F: FileSystem>(
    fs: &F,
    src: &Path,
    dst: &Path,
    source: &FileRecord,
) -> Result<CopiedFile> {
    if !source.is_file() {
        return Err(SyncError::NotRegularFile(src.to_path_buf()));
    }

    let mut reader = fs
        .open(src)
        .await
        .map_err(|e| SyncError::fs("open source file", src, &e))?;
    let mut writer = fs
        .create(dst)
        .await
        .map_err(|e| SyncError::fs("create destination file", dst, &e))?;

    let bytes = fs.copy_bytes(&mut reader, &mut writer).await.map_err(|e| {
        SyncError::CopyFailed(format!("{} -> {}: {e}", src.display(), dst.display()))
    })?;

    if bytes != source.len {
        // The source changed between stat and copy; what we read is what we keep
        debug!(
            "{} changed during copy: expected {} bytes, copied {}",
            src.display(),
            source.len,
            bytes
        );
    }

    fs.sync_and_close(writer)
        .await
        .map_err(|e| SyncError::fs("flush destination file", dst, &e))?;
    drop(reader);

    let mtime_preserved = match fs.set_times(dst, source.modified, source.modified).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                "failed to set modification time on {}: {}",
                dst.display(),
                e
            );
            false
        }
    };

    debug!(
        "copied {} bytes from {} to {}",
        bytes,
        src.display(),
        dst.display()
    );

    Ok(CopiedFile {
        bytes,
        mtime_preserved,
    })
}
