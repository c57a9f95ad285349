//! Deterministic naming for migration-derived resources
//!
//! Every name created during a run is derived from an existing identifier
//! plus a fixed suffix or the run's date stamp. Nothing is randomly
//! generated, which is what makes reruns collide predictably instead of
//! silently duplicating resources.

use std::fmt;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

/// Suffix appended to an original instance when it is preserved as a
/// rollback artifact.
pub const OLD_SUFFIX: &str = "-old";

/// Suffix for the read replica recreated from a restored instance.
pub const REPLICA_SUFFIX: &str = "-replica";

/// Suffix marking the encrypted copy of a snapshot.
pub const ENCRYPTED_SUFFIX: &str = "-encrypted";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("run date must be 8 digits (YYYYMMDD), got {0:?}")]
    InvalidRunDate(String),

    #[error("not an encrypted snapshot name: {0:?}")]
    NotEncrypted(String),
}

/// The timestamp-keyed batch identifier (`YYYYMMDD`) scoping all names
/// created during one orchestration execution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RunDate(String);

impl RunDate {
    /// Today's date in UTC.
    pub fn today() -> Self {
        Self(Utc::now().format("%Y%m%d").to_string())
    }

    /// Parse a `YYYYMMDD` stamp, e.g. from a rerun override.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        if s.len() == 8 && s.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(NameError::InvalidRunDate(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Name of the snapshot taken for one instance in one run.
///
/// Renders as `{base}-{run_date}`. The base instance identifier and the run
/// date are carried as structured fields so derived names never have to be
/// reconstructed by substring arithmetic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotName {
    base: String,
    run_date: RunDate,
}

impl SnapshotName {
    pub fn new(base: impl Into<String>, run_date: RunDate) -> Self {
        Self {
            base: base.into(),
            run_date,
        }
    }

    /// The instance the snapshot was taken from, and the identifier the
    /// restored instance will carry.
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn run_date(&self) -> &RunDate {
        &self.run_date
    }

    /// Name of the encrypted copy produced from this snapshot.
    pub fn encrypted(&self) -> EncryptedSnapshotName {
        EncryptedSnapshotName {
            source: self.clone(),
        }
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.run_date)
    }
}

/// Name of an encrypted snapshot copy: `{base}-{run_date}-encrypted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSnapshotName {
    source: SnapshotName,
}

impl EncryptedSnapshotName {
    /// The base instance identifier, recovered structurally.
    pub fn base(&self) -> &str {
        self.source.base()
    }

    /// The unencrypted snapshot this copy was made from.
    pub fn source(&self) -> &SnapshotName {
        &self.source
    }

    /// Invert the rendering exactly: strip the `-encrypted` marker, then
    /// split off the trailing run-date stamp.
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let not_encrypted = || NameError::NotEncrypted(s.to_string());
        let stem = s.strip_suffix(ENCRYPTED_SUFFIX).ok_or_else(not_encrypted)?;
        let (base, date) = stem.rsplit_once('-').ok_or_else(not_encrypted)?;
        if base.is_empty() {
            return Err(not_encrypted());
        }
        let run_date = RunDate::parse(date).map_err(|_| not_encrypted())?;
        Ok(Self {
            source: SnapshotName::new(base, run_date),
        })
    }
}

impl fmt::Display for EncryptedSnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.source, ENCRYPTED_SUFFIX)
    }
}

/// Identifier the original instance is renamed to after its snapshot is
/// confirmed, preserving it as a rollback artifact.
pub fn renamed_original(base: &str) -> String {
    format!("{base}{OLD_SUFFIX}")
}

/// Identifier of the read replica recreated for a restored instance.
pub fn replica_name(base: &str) -> String {
    format!("{base}{REPLICA_SUFFIX}")
}
