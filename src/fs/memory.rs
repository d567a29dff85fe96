//! In-memory [`FileSystem`] with failure injection
//!
//! Used by the engine tests to exercise error paths that are awkward to
//! provoke on a real disk (a destination that cannot be created, a source
//! that fails to open, a timestamp that cannot be set).

use super::{DirEntry, EntryKind, FileRecord, FileSystem};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File { data: Vec<u8>, modified: SystemTime },
    /// Anything that is neither file nor directory (symlink, device, fifo)
    Special,
}

/// Operation that can be made to fail for a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailOn {
    /// Listing this directory
    ReadDir,
    /// Creating this directory or anything below it
    CreateDir,
    /// Opening this file for reading
    Open,
    /// Creating this file for writing
    Create,
    /// Streaming bytes into this file
    Copy,
    /// Setting times on this file
    SetTimes,
}

#[derive(Debug, Default)]
struct Inner {
    nodes: BTreeMap<PathBuf, Node>,
    failures: HashSet<(FailOn, PathBuf)>,
}

/// Reader handle: a snapshot of the file content at open time
#[derive(Debug)]
pub struct MemoryReader {
    data: Vec<u8>,
}

/// Writer handle: content becomes visible when the handle is closed
#[derive(Debug)]
pub struct MemoryWriter {
    path: PathBuf,
    data: Vec<u8>,
}

/// In-memory filesystem tree
#[derive(Debug, Default)]
pub struct MemoryFs {
    inner: RefCell<Inner>,
}

fn normalize(path: &Path) -> PathBuf {
    path.components().collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file or directory", path.display()),
    )
}

fn injected(op: FailOn, path: &Path) -> io::Error {
    io::Error::other(format!("injected {op:?} failure for {}", path.display()))
}

impl MemoryFs {
    /// Create an empty tree
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory and all missing parents
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut inner = self.inner.borrow_mut();
        for ancestor in normalize(path.as_ref()).ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            inner
                .nodes
                .entry(ancestor.to_path_buf())
                .or_insert(Node::Dir);
        }
    }

    /// Add (or replace) a file, creating missing parent directories
    pub fn add_file(&self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>, modified: SystemTime) {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.inner.borrow_mut().nodes.insert(
            path,
            Node::File {
                data: data.into(),
                modified,
            },
        );
    }

    /// Add an entry that is neither a file nor a directory
    pub fn add_special(&self, path: impl AsRef<Path>) {
        let path = normalize(path.as_ref());
        if let Some(parent) = path.parent() {
            self.add_dir(parent);
        }
        self.inner.borrow_mut().nodes.insert(path, Node::Special);
    }

    /// Make `op` fail for `path`
    ///
    /// [`FailOn::CreateDir`] matches `path` and everything below it; the other
    /// operations match `path` exactly.
    pub fn fail(&self, op: FailOn, path: impl AsRef<Path>) {
        self.inner
            .borrow_mut()
            .failures
            .insert((op, normalize(path.as_ref())));
    }

    /// Content of a file, if `path` is a file
    #[must_use]
    pub fn read_file(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.inner.borrow().nodes.get(&normalize(path.as_ref())) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Modification time of a file, if `path` is a file
    #[must_use]
    pub fn modified(&self, path: impl AsRef<Path>) -> Option<SystemTime> {
        match self.inner.borrow().nodes.get(&normalize(path.as_ref())) {
            Some(Node::File { modified, .. }) => Some(*modified),
            _ => None,
        }
    }

    /// True if anything exists at `path`
    #[must_use]
    pub fn exists(&self, path: impl AsRef<Path>) -> bool {
        self.inner
            .borrow()
            .nodes
            .contains_key(&normalize(path.as_ref()))
    }

    /// Every file below `root`, as paths relative to `root`, sorted
    #[must_use]
    pub fn files_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = normalize(root.as_ref());
        self.inner
            .borrow()
            .nodes
            .iter()
            .filter(|(_, node)| matches!(node, Node::File { .. }))
            .filter_map(|(path, _)| path.strip_prefix(&root).ok().map(Path::to_path_buf))
            .collect()
    }

    fn should_fail(&self, op: FailOn, path: &Path) -> bool {
        let inner = self.inner.borrow();
        match op {
            FailOn::CreateDir => inner
                .failures
                .iter()
                .any(|(o, p)| *o == FailOn::CreateDir && path.starts_with(p)),
            _ => inner.failures.contains(&(op, path.to_path_buf())),
        }
    }
}

impl FileSystem for MemoryFs {
    type Reader = MemoryReader;
    type Writer = MemoryWriter;

    async fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let path = normalize(path);
        if self.should_fail(FailOn::ReadDir, &path) {
            return Err(injected(FailOn::ReadDir, &path));
        }

        let inner = self.inner.borrow();
        match inner.nodes.get(&path) {
            Some(Node::Dir) => {}
            Some(_) => {
                return Err(io::Error::other(format!(
                    "{}: not a directory",
                    path.display()
                )))
            }
            None => return Err(not_found(&path)),
        }

        let entries = inner
            .nodes
            .iter()
            .filter(|(child, _)| child.parent() == Some(path.as_path()))
            .filter_map(|(child, node)| {
                let kind = match node {
                    Node::Dir => EntryKind::Directory,
                    Node::File { .. } => EntryKind::File,
                    Node::Special => EntryKind::Other,
                };
                child.file_name().map(|name| DirEntry {
                    name: name.to_owned(),
                    kind,
                })
            })
            .collect();
        Ok(entries)
    }

    async fn stat(&self, path: &Path) -> io::Result<FileRecord> {
        let path = normalize(path);
        let inner = self.inner.borrow();
        let (len, modified, kind) = match inner.nodes.get(&path) {
            Some(Node::Dir) => (0, SystemTime::UNIX_EPOCH, EntryKind::Directory),
            Some(Node::File { data, modified }) => (data.len() as u64, *modified, EntryKind::File),
            Some(Node::Special) => (0, SystemTime::UNIX_EPOCH, EntryKind::Other),
            None => return Err(not_found(&path)),
        };
        Ok(FileRecord {
            name: path.file_name().map(ToOwned::to_owned).unwrap_or_default(),
            len,
            modified,
            kind,
        })
    }

    async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let path = normalize(path);
        if self.should_fail(FailOn::CreateDir, &path) {
            return Err(injected(FailOn::CreateDir, &path));
        }

        let mut inner = self.inner.borrow_mut();
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                continue;
            }
            match inner.nodes.get(ancestor) {
                Some(Node::Dir) => {}
                Some(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::AlreadyExists,
                        format!("{}: exists and is not a directory", ancestor.display()),
                    ))
                }
                None => {
                    inner.nodes.insert(ancestor.to_path_buf(), Node::Dir);
                }
            }
        }
        Ok(())
    }

    async fn open(&self, path: &Path) -> io::Result<MemoryReader> {
        let path = normalize(path);
        if self.should_fail(FailOn::Open, &path) {
            return Err(injected(FailOn::Open, &path));
        }
        match self.inner.borrow().nodes.get(&path) {
            Some(Node::File { data, .. }) => Ok(MemoryReader { data: data.clone() }),
            Some(_) => Err(io::Error::other(format!(
                "{}: not a regular file",
                path.display()
            ))),
            None => Err(not_found(&path)),
        }
    }

    async fn create(&self, path: &Path) -> io::Result<MemoryWriter> {
        let path = normalize(path);
        if self.should_fail(FailOn::Create, &path) {
            return Err(injected(FailOn::Create, &path));
        }

        let mut inner = self.inner.borrow_mut();
        let parent_is_dir = path
            .parent()
            .is_some_and(|parent| matches!(inner.nodes.get(parent), Some(Node::Dir)));
        if !parent_is_dir {
            return Err(not_found(&path));
        }
        if matches!(inner.nodes.get(&path), Some(Node::Dir | Node::Special)) {
            return Err(io::Error::other(format!(
                "{}: not a regular file",
                path.display()
            )));
        }

        // Truncate right away, like O_TRUNC
        inner.nodes.insert(
            path.clone(),
            Node::File {
                data: Vec::new(),
                modified: SystemTime::now(),
            },
        );
        Ok(MemoryWriter {
            path,
            data: Vec::new(),
        })
    }

    async fn copy_bytes(
        &self,
        reader: &mut MemoryReader,
        writer: &mut MemoryWriter,
    ) -> io::Result<u64> {
        if self.should_fail(FailOn::Copy, &writer.path) {
            return Err(injected(FailOn::Copy, &writer.path));
        }
        writer.data.extend_from_slice(&reader.data);
        Ok(reader.data.len() as u64)
    }

    async fn sync_and_close(&self, writer: MemoryWriter) -> io::Result<()> {
        self.inner.borrow_mut().nodes.insert(
            writer.path,
            Node::File {
                data: writer.data,
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    async fn set_times(
        &self,
        path: &Path,
        _accessed: SystemTime,
        modified: SystemTime,
    ) -> io::Result<()> {
        let path = normalize(path);
        if self.should_fail(FailOn::SetTimes, &path) {
            return Err(injected(FailOn::SetTimes, &path));
        }
        match self.inner.borrow_mut().nodes.get_mut(&path) {
            Some(Node::File { modified: m, .. }) => {
                *m = modified;
                Ok(())
            }
            Some(_) => Ok(()),
            None => Err(not_found(&path)),
        }
    }
}
