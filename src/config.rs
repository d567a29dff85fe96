//! Profile configuration
//!
//! Profiles live in a YAML file keyed by operation name:
//!
//! ```yaml
//! game-saves:
//!   name: Game saves
//!   source: /games/foobar/saves
//!   destinations:
//!     - /mnt/backup-a/foobar/saves
//!     - /mnt/backup-b/foobar/saves
//!   replace: skip
//! ```
//!
//! `replace` is one of `never`, `skip` or `always` (any case). Only the
//! requested profile is validated, so a broken entry elsewhere in the file
//! does not stop other operations from running.

use crate::error::ConfigError;
use crate::policy::ReplacePolicy;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Config file name without extension
pub const CONFIG_FILE_STEM: &str = "multicopy-config";

/// Accepted config file extensions, in lookup order
pub const CONFIG_EXTENSIONS: [&str; 2] = ["yml", "yaml"];

/// Directories searched for the config file, relative to the working directory
pub const SEARCH_DIRS: [&str; 4] = [".", "cmd", "config", "configs"];

/// One mirroring job: a source tree and where to copy it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    /// Human readable name
    pub name: String,
    /// Root of the tree to mirror
    pub source: PathBuf,
    /// Destination roots, in the order they are written
    pub destinations: Vec<PathBuf>,
    /// What to do with files that already exist at a destination
    pub replace: ReplacePolicy,
}

impl Profile {
    /// Check the fields that serde cannot check on its own
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the name or source is empty, or if
    /// there is no destination or an empty one.
    pub fn validate(&self, operation: &str) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::Invalid {
            profile: operation.to_string(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if self.source.as_os_str().is_empty() {
            return Err(invalid("source must not be empty"));
        }
        if self.destinations.is_empty() {
            return Err(invalid("at least one destination is required"));
        }
        if self.destinations.iter().any(|d| d.as_os_str().is_empty()) {
            return Err(invalid("destinations must not be empty paths"));
        }
        Ok(())
    }

    /// Check that the source root exists and is a directory
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the source is missing or is not a
    /// directory.
    pub fn check_source(&self, operation: &str) -> Result<(), ConfigError> {
        if self.source.is_dir() {
            return Ok(());
        }
        let reason = if self.source.exists() {
            format!("source {} is not a directory", self.source.display())
        } else {
            format!("source path does not exist: {}", self.source.display())
        };
        Err(ConfigError::Invalid {
            profile: operation.to_string(),
            reason,
        })
    }
}

/// A parsed config file
#[derive(Debug, Clone)]
pub struct ConfigFile {
    profiles: BTreeMap<String, serde_yaml::Value>,
}

impl ConfigFile {
    /// Find the config file below `base`, trying every search directory and
    /// extension in order
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] listing every candidate tried.
    pub fn locate(base: &Path) -> Result<PathBuf, ConfigError> {
        let mut searched = Vec::new();
        for dir in SEARCH_DIRS {
            for ext in CONFIG_EXTENSIONS {
                let candidate = base.join(dir).join(format!("{CONFIG_FILE_STEM}.{ext}"));
                if candidate.is_file() {
                    return Ok(candidate);
                }
                searched.push(candidate);
            }
        }
        Err(ConfigError::NotFound { searched })
    }

    /// Read and parse a config file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a YAML mapping.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text)
    }

    /// Parse config text; `path` is only used in error messages
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if `text` is not a YAML mapping.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let profiles = serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self { profiles })
    }

    /// Look up and validate one profile; the name match ignores case
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingProfile`] if no key matches, or
    /// [`ConfigError::Invalid`] if the entry is malformed.
    pub fn profile(&self, operation: &str) -> Result<Profile, ConfigError> {
        let value = self
            .profiles
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(operation))
            .map(|(_, value)| value.clone())
            .ok_or_else(|| ConfigError::MissingProfile(operation.to_string()))?;

        let profile: Profile =
            serde_yaml::from_value(value).map_err(|e| ConfigError::Invalid {
                profile: operation.to_string(),
                reason: e.to_string(),
            })?;
        profile.validate(operation)?;
        Ok(profile)
    }
}

/// Load the profile for `operation`
///
/// Uses `explicit` as the config file when given, otherwise searches the
/// working directory.
///
/// # Errors
///
/// Returns an error if the file cannot be found, read or parsed, or if the
/// profile is missing or invalid.
pub fn load_profile(explicit: Option<&Path>, operation: &str) -> Result<Profile, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => ConfigFile::locate(Path::new("."))?,
    };
    ConfigFile::load(&path)?.profile(operation)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r"
game-saves:
  name: Game saves
  source: /games/foobar/saves
  destinations:
    - /mnt/a/saves
    - /mnt/b/saves
  replace: Skip
photos:
  name: Photos
  source: /home/me/photos
  destinations: []
  replace: always
broken:
  name: Broken
  source: /src
  destinations: [/dst]
  replace: sometimes
";

    fn sample() -> ConfigFile {
        ConfigFile::parse(Path::new("test.yml"), SAMPLE).unwrap()
    }

    #[test]
    fn test_profile_lookup() {
        let profile = sample().profile("game-saves").unwrap();
        assert_eq!(profile.name, "Game saves");
        assert_eq!(profile.source, PathBuf::from("/games/foobar/saves"));
        assert_eq!(
            profile.destinations,
            vec![PathBuf::from("/mnt/a/saves"), PathBuf::from("/mnt/b/saves")]
        );
        assert_eq!(profile.replace, ReplacePolicy::SkipIfIdentical);
    }

    #[test]
    fn test_profile_lookup_ignores_case() {
        assert!(sample().profile("GAME-SAVES").is_ok());
    }

    #[test]
    fn test_missing_profile() {
        let err = sample().profile("music").unwrap_err();
        assert!(matches!(err, ConfigError::MissingProfile(name) if name == "music"));
    }

    #[test]
    fn test_empty_destinations_rejected() {
        let err = sample().profile("photos").unwrap_err();
        assert!(err.to_string().contains("at least one destination"));
    }

    #[test]
    fn test_unknown_replace_value_rejected() {
        let err = sample().profile("broken").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        assert!(err.to_string().contains("sometimes"));
    }

    #[test]
    fn test_missing_field_rejected() {
        let config = ConfigFile::parse(
            Path::new("test.yml"),
            "job:\n  name: Job\n  source: /src\n  replace: never\n",
        )
        .unwrap();
        let err = config.profile("job").unwrap_err();
        assert!(err.to_string().contains("destinations"));
    }

    #[test]
    fn test_non_mapping_file_rejected() {
        let err = ConfigFile::parse(Path::new("test.yml"), "- just\n- a list\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_locate_searches_config_dirs() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("configs")).unwrap();
        let expected = temp_dir.path().join("configs").join("multicopy-config.yaml");
        std::fs::write(&expected, SAMPLE).unwrap();

        assert_eq!(ConfigFile::locate(temp_dir.path()).unwrap(), expected);
    }

    #[test]
    fn test_locate_reports_searched_paths() {
        let temp_dir = TempDir::new().unwrap();
        match ConfigFile::locate(temp_dir.path()).unwrap_err() {
            ConfigError::NotFound { searched } => assert_eq!(searched.len(), 8),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yml");
        std::fs::write(&path, SAMPLE).unwrap();

        let profile = load_profile(Some(&path), "game-saves").unwrap();
        assert_eq!(profile.replace, ReplacePolicy::SkipIfIdentical);
    }

    #[test]
    fn test_check_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut profile = sample().profile("game-saves").unwrap();

        profile.source = temp_dir.path().to_path_buf();
        assert!(profile.check_source("game-saves").is_ok());

        profile.source = temp_dir.path().join("missing");
        let err = profile.check_source("game-saves").unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
