//! Filesystem capabilities used by the copy engine
//!
//! The engine never touches `std::fs` or `compio::fs` directly. Everything it
//! needs from the filesystem goes through the [`FileSystem`] trait so the
//! same walker, fan-out and copier run against the real disk ([`LocalFs`])
//! or an in-memory tree with injectable failures ([`MemoryFs`]).
//!
//! # Operations
//!
//! - **read_dir**: list one directory level, classifying entries without
//!   following symlinks
//! - **stat**: metadata snapshot of a path, following symlinks
//! - **create_dir_all**: create a directory and all missing parents
//! - **open** / **create**: source reader and truncating destination writer
//! - **copy_bytes**: stream the whole reader into the writer
//! - **sync_and_close**: flush the writer to stable storage and close it
//! - **set_times**: set access and modification times of a path

mod local;
mod memory;

pub use local::LocalFs;
pub use memory::{FailOn, MemoryFs, MemoryReader, MemoryWriter};

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::time::SystemTime;

/// Entry type as seen by the walker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symlink, device, socket, fifo; never copied
    Other,
}

impl From<std::fs::FileType> for EntryKind {
    fn from(file_type: std::fs::FileType) -> Self {
        if file_type.is_file() {
            Self::File
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            Self::Other
        }
    }
}

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File name of the entry (no directory part)
    pub name: OsString,
    /// What kind of entry this is
    pub kind: EntryKind,
}

/// Read-only metadata snapshot of a file or directory
///
/// The snapshot may be stale by the time a copy runs; nothing locks the
/// file against outside changes between the stat and the copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// File name (last path component)
    pub name: OsString,
    /// Size in bytes
    pub len: u64,
    /// Last modification time
    pub modified: SystemTime,
    /// Entry type
    pub kind: EntryKind,
}

impl FileRecord {
    /// True for directories
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// True for regular files
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}

/// Filesystem primitives the copy engine is built on
///
/// Implementations report failures as plain [`io::Error`]s; the engine adds
/// path context. A `stat` of a missing path must fail with
/// [`io::ErrorKind::NotFound`], which the fan-out uses to tell "destination
/// does not exist yet" apart from real errors.
#[allow(async_fn_in_trait)]
pub trait FileSystem {
    /// Open source file handle
    type Reader;
    /// Open destination file handle
    type Writer;

    /// List the entries of a directory, in no particular order
    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Metadata for `path`, following symlinks
    async fn stat(&self, path: &Path) -> io::Result<FileRecord>;

    /// Create `path` and every missing parent directory
    async fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Open an existing file for reading
    async fn open(&self, path: &Path) -> io::Result<Self::Reader>;

    /// Create a file for writing, truncating any existing content
    async fn create(&self, path: &Path) -> io::Result<Self::Writer>;

    /// Stream everything from `reader` into `writer`, returning the byte count
    async fn copy_bytes(&self, reader: &mut Self::Reader, writer: &mut Self::Writer)
        -> io::Result<u64>;

    /// Flush `writer` to stable storage and close it
    async fn sync_and_close(&self, writer: Self::Writer) -> io::Result<()>;

    /// Set the access and modification times of `path`
    async fn set_times(&self, path: &Path, accessed: SystemTime, modified: SystemTime)
        -> io::Result<()>;
}
