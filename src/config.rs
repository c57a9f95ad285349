//! Startup configuration for a migration run
//!
//! Loaded once at process start from the environment, validated up front so
//! a malformed budget or a missing encryption key fails before any control
//! service call is made.

use std::env;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::naming::{NameError, RunDate, OLD_SUFFIX};

/// Default attempts for snapshot and encrypted-copy convergence.
const DEFAULT_SNAPSHOT_ATTEMPTS: u32 = 25;
/// Default attempts for restored-instance convergence.
const DEFAULT_RESTORE_ATTEMPTS: u32 = 20;
/// Default seconds between poll attempts.
const DEFAULT_POLL_INTERVAL_SECS: u64 = 30;
/// Default bound on concurrently migrating instances.
const DEFAULT_MAX_CONCURRENT: usize = 4;
/// Default call-level retry attempts for transient control service errors.
const DEFAULT_CALL_ATTEMPTS: u32 = 3;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("invalid run date override: {0}")]
    InvalidRunDate(#[from] NameError),
}

/// Poll budget for one convergence wait: at most `max_attempts` probes,
/// `interval` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollBudget {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollBudget {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

/// Call-level retry budget for transient control service errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_CALL_ATTEMPTS,
        }
    }
}

/// The injected predicate deciding which instances are in scope.
///
/// Excludes read replicas and the managed-cluster storage flavor that is not
/// amenable to single-instance snapshotting, plus rollback artifacts left by
/// a previous run. An optional include marker narrows the fleet further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibilityFilter {
    /// When set, only identifiers containing this marker are considered.
    pub include_marker: Option<String>,
    /// Identifiers containing this marker are read replicas.
    pub replica_marker: String,
    /// Identifiers containing this marker use managed-cluster storage.
    pub cluster_marker: String,
}

impl Default for EligibilityFilter {
    fn default() -> Self {
        Self {
            include_marker: None,
            replica_marker: "replica".to_string(),
            cluster_marker: "aurora".to_string(),
        }
    }
}

impl EligibilityFilter {
    pub fn is_eligible(&self, instance_id: &str) -> bool {
        if let Some(marker) = &self.include_marker {
            if !instance_id.contains(marker.as_str()) {
                return false;
            }
        }
        // Renamed originals from an earlier run are rollback artifacts,
        // never migration candidates.
        if instance_id.ends_with(OLD_SUFFIX) {
            return false;
        }
        !instance_id.contains(self.replica_marker.as_str())
            && !instance_id.contains(self.cluster_marker.as_str())
    }
}

/// Everything one orchestration execution needs, resolved before it starts.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Region the fleet lives in; informational, forwarded to logs.
    pub region: String,
    /// Reference to the target encryption key. Required, never a literal.
    pub target_key: String,
    /// Batch stamp scoping all derived names for this run.
    pub run_date: RunDate,
    pub filter: EligibilityFilter,
    pub snapshot_budget: PollBudget,
    pub encrypt_budget: PollBudget,
    pub restore_budget: PollBudget,
    /// Bound on the per-instance worker pool.
    pub max_concurrent: usize,
    pub call_retries: RetryPolicy,
}

impl MigrationConfig {
    /// Defaults around the required inputs; budgets per the stage defaults.
    pub fn new(region: impl Into<String>, target_key: impl Into<String>, run_date: RunDate) -> Self {
        let interval = Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS);
        Self {
            region: region.into(),
            target_key: target_key.into(),
            run_date,
            filter: EligibilityFilter::default(),
            snapshot_budget: PollBudget::new(DEFAULT_SNAPSHOT_ATTEMPTS, interval),
            encrypt_budget: PollBudget::new(DEFAULT_SNAPSHOT_ATTEMPTS, interval),
            restore_budget: PollBudget::new(DEFAULT_RESTORE_ATTEMPTS, interval),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            call_retries: RetryPolicy::default(),
        }
    }

    /// Load from the environment. `MIGRATION_TARGET_KEY` is required;
    /// everything else falls back to documented defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let target_key =
            env::var("MIGRATION_TARGET_KEY").map_err(|_| ConfigError::MissingVar("MIGRATION_TARGET_KEY"))?;

        let region = env::var("MIGRATION_REGION").unwrap_or_else(|_| {
            warn!("MIGRATION_REGION not set, using 'us-west-2'");
            "us-west-2".to_string()
        });

        let run_date = match env::var("MIGRATION_RUN_DATE") {
            Ok(stamp) => RunDate::parse(&stamp)?,
            Err(_) => RunDate::today(),
        };

        let interval = Duration::from_secs(parse_var(
            "MIGRATION_POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);

        let mut config = Self::new(region, target_key, run_date);
        config.filter = EligibilityFilter {
            include_marker: env::var("MIGRATION_INCLUDE_MARKER").ok(),
            replica_marker: env::var("MIGRATION_REPLICA_MARKER")
                .unwrap_or_else(|_| "replica".to_string()),
            cluster_marker: env::var("MIGRATION_CLUSTER_MARKER")
                .unwrap_or_else(|_| "aurora".to_string()),
        };
        config.snapshot_budget = PollBudget::new(
            parse_var("MIGRATION_SNAPSHOT_ATTEMPTS", DEFAULT_SNAPSHOT_ATTEMPTS)?,
            interval,
        );
        config.encrypt_budget = PollBudget::new(
            parse_var("MIGRATION_ENCRYPT_ATTEMPTS", DEFAULT_SNAPSHOT_ATTEMPTS)?,
            interval,
        );
        config.restore_budget = PollBudget::new(
            parse_var("MIGRATION_RESTORE_ATTEMPTS", DEFAULT_RESTORE_ATTEMPTS)?,
            interval,
        );
        config.max_concurrent = parse_var("MIGRATION_MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT)?;
        config.call_retries = RetryPolicy {
            max_attempts: parse_var("MIGRATION_CALL_ATTEMPTS", DEFAULT_CALL_ATTEMPTS)?,
        };
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(raw) => raw
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidVar {
                var,
                reason: e.to_string(),
            }),
        Err(_) => Ok(default),
    }
}
