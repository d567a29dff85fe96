//! multicopy: mirror one directory tree to several destinations in one pass
//!
//! The engine walks the source tree once and copies every regular file to
//! each configured destination, recreating the relative directory layout. A
//! replace policy decides what happens to files that already exist at a
//! destination, and every copy carries over the source modification time.
//! Problems with one file or one destination are recorded and reported
//! without stopping the rest of the run.

pub mod cli;
pub mod config;
pub mod copy;
pub mod directory;
pub mod error;
pub mod event;
pub mod fanout;
pub mod fs;
pub mod policy;
pub mod progress;
pub mod stats;
pub mod sync;

// Re-export commonly used types
pub use config::{load_profile, Profile};
pub use error::{ConfigError, Result, SyncError};
pub use event::{Reporter, SyncEvent};
pub use fs::{FileSystem, LocalFs, MemoryFs};
pub use policy::ReplacePolicy;
pub use stats::SyncStats;
pub use sync::{CancelToken, RunOutcome, RunReport, Runner};
