//! [`FileSystem`] implementation backed by the local disk
//!
//! File data moves through compio's `read_at`/`write_all_at` so reads and
//! writes are submitted through `io_uring` where available. Directory
//! listings and timestamp changes have no `io_uring` opcode, so they run in a
//! blocking closure on the compio runtime's thread pool.

use super::{DirEntry, EntryKind, FileRecord, FileSystem};
use compio::fs::{File, OpenOptions};
use compio::io::{AsyncReadAt, AsyncWriteAtExt};
use filetime::{set_file_times, FileTime};
use std::io;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// Default I/O buffer size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Local disk filesystem
#[derive(Debug, Clone)]
pub struct LocalFs {
    /// Buffer size for each read/write round trip
    buffer_size: usize,
}

impl LocalFs {
    /// Create a local filesystem that copies with `buffer_size` byte chunks
    ///
    /// A zero buffer size falls back to [`DEFAULT_BUFFER_SIZE`].
    #[must_use]
    pub const fn new(buffer_size: usize) -> Self {
        let buffer_size = if buffer_size == 0 {
            DEFAULT_BUFFER_SIZE
        } else {
            buffer_size
        };
        Self { buffer_size }
    }

    /// Buffer size used for copies
    #[must_use]
    pub const fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for LocalFs {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl FileSystem for LocalFs {
    type Reader = File;
    type Writer = File;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = path.to_path_buf();
        let result = compio::runtime::spawn_blocking(move || -> io::Result<Vec<DirEntry>> {
            let mut entries = Vec::new();
            for entry in std::fs::read_dir(&path)? {
                let entry = entry?;
                // file_type() does not follow symlinks, so links land in Other
                let kind = EntryKind::from(entry.file_type()?);
                entries.push(DirEntry {
                    name: entry.file_name(),
                    kind,
                });
            }
            Ok(entries)
        })
        .await
        .map_err(|e| io::Error::other(format!("read_dir task failed: {e:?}")))?;

        result
    }

    async fn stat(&self, path: &Path) -> io::Result<FileRecord> {
        // compio::fs::metadata reports UNIX_EPOCH for every modification
        // time, so the stat goes through std on the blocking pool
        let owned = path.to_path_buf();
        let metadata = compio::runtime::spawn_blocking(move || std::fs::metadata(&owned))
            .await
            .map_err(|e| io::Error::other(format!("stat task failed: {e:?}")))??;
        let kind = if metadata.is_file() {
            EntryKind::File
        } else if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::Other
        };

        Ok(FileRecord {
            name: path.file_name().map(ToOwned::to_owned).unwrap_or_default(),
            len: metadata.len(),
            modified: metadata.modified()?,
            kind,
        })
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        compio::fs::create_dir_all(path).await
    }

    async fn open(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new().read(true).open(path).await
    }

    async fn create(&self, path: &Path) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
    }

    async fn copy_bytes(&self, reader: &mut File, writer: &mut File) -> io::Result<u64> {
        let mut buffer: Vec<u8> = Vec::with_capacity(self.buffer_size);
        let mut offset = 0u64;

        loop {
            let read_result = reader.read_at(buffer, offset).await;
            let bytes_read = read_result.0?;
            buffer = read_result.1;

            // End of file
            if bytes_read == 0 {
                break;
            }
            buffer.truncate(bytes_read);

            let write_result = writer.write_all_at(buffer, offset).await;
            write_result.0?;
            buffer = write_result.1;
            buffer.clear();

            offset += bytes_read as u64;
            debug!("read_at/write_all_at: copied {} bytes, total {}", bytes_read, offset);
        }

        Ok(offset)
    }

    async fn sync_and_close(&self, writer: File) -> io::Result<()> {
        writer.sync_all().await?;
        writer.close().await
    }

    async fn set_times(
        &self,
        path: &Path,
        accessed: SystemTime,
        modified: SystemTime,
    ) -> io::Result<()> {
        let path = path.to_path_buf();
        let result = compio::runtime::spawn_blocking(move || {
            set_file_times(
                &path,
                FileTime::from_system_time(accessed),
                FileTime::from_system_time(modified),
            )
        })
        .await
        .map_err(|e| io::Error::other(format!("set_times task failed: {e:?}")))?;

        result
    }
}
