//! Replace policy: whether an existing destination file gets overwritten

use crate::fs::FileRecord;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// What to do when the destination file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ReplacePolicy {
    /// Never overwrite (`never`)
    Never,
    /// Overwrite unless size and modification time both match (`skip`)
    SkipIfIdentical,
    /// Always overwrite (`always`)
    Always,
}

/// Why a destination was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Destination exists and the policy is `never`
    Exists,
    /// Destination has the same size and modification time as the source
    Identical,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exists => f.write_str("it already exists, and the replace policy is \"never\""),
            Self::Identical => f.write_str(
                "it matches the size and modification time of the existing file, and the replace policy is \"skip\"",
            ),
        }
    }
}

/// Outcome of the policy check for one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Copy,
    Skip(SkipReason),
}

impl ReplacePolicy {
    /// Decide whether `source` should be copied over `destination`
    ///
    /// `destination` is `None` when no file exists there yet, in which case
    /// the answer is always [`Decision::Copy`]. Timestamps are compared for
    /// exact equality.
    #[must_use]
    pub fn decide(self, source: &FileRecord, destination: Option<&FileRecord>) -> Decision {
        let Some(destination) = destination else {
            return Decision::Copy;
        };

        match self {
            Self::Never => Decision::Skip(SkipReason::Exists),
            Self::Always => Decision::Copy,
            Self::SkipIfIdentical => {
                if destination.len == source.len && destination.modified == source.modified {
                    Decision::Skip(SkipReason::Identical)
                } else {
                    Decision::Copy
                }
            }
        }
    }

    /// Config file spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Never => "never",
            Self::SkipIfIdentical => "skip",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for ReplacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReplacePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "never" => Ok(Self::Never),
            "skip" => Ok(Self::SkipIfIdentical),
            "always" => Ok(Self::Always),
            other => Err(format!(
                "unknown replace policy \"{other}\" (expected never, skip or always)"
            )),
        }
    }
}

impl TryFrom<String> for ReplacePolicy {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
