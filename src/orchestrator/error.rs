//! Error types for the migration orchestrator

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::client::ControlServiceError;
use crate::config::RetryPolicy;
use crate::orchestrator::poller::ResourceKind;

#[derive(Error, Debug)]
pub enum MigrationError {
    /// A control service call failed after its transient-retry budget.
    #[error("control service error during {op}: {source}")]
    ControlService {
        op: &'static str,
        #[source]
        source: ControlServiceError,
    },

    /// The poller exhausted its budget without observing the target status.
    #[error("{kind} {id} did not reach \"{target}\" within {attempts} attempts")]
    ConvergenceTimeout {
        kind: ResourceKind,
        id: String,
        target: &'static str,
        attempts: u32,
    },

    /// A create/copy/restore call was acknowledged with a non-success
    /// status. The instance fails immediately, with no poller wait.
    #[error("{op} for {id} rejected by the control service: {reason}")]
    AckRejected {
        op: &'static str,
        id: String,
        reason: String,
    },
}

impl MigrationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MigrationError::ConvergenceTimeout { .. })
    }
}

pub type Result<T, E = MigrationError> = std::result::Result<T, E>;

/// Exponential backoff between call-level retries.
#[derive(Clone, Debug)]
pub struct BackoffConfig {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Cap on the delay between retries.
    pub max_delay: Duration,
    /// Multiplier for each subsequent retry.
    pub multiplier: f64,
    /// Random jitter factor (0.0 to 1.0).
    pub jitter: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            jitter: 0.1,
        }
    }
}

impl BackoffConfig {
    /// Delay for a given retry attempt, jittered and capped.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base_delay_secs =
            self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);

        let jitter_range = base_delay_secs * self.jitter;
        let jitter = rand::random::<f64>() * jitter_range * 2.0 - jitter_range;
        let delay_with_jitter = (base_delay_secs + jitter).max(0.0);

        Duration::from_secs_f64(delay_with_jitter.min(self.max_delay.as_secs_f64()))
    }
}

/// Run a control service call, retrying transient errors within the policy's
/// attempt budget. Non-transient errors surface immediately.
pub async fn with_retries<T, F, Fut>(
    op: &'static str,
    policy: &RetryPolicy,
    backoff: &BackoffConfig,
    mut call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ControlServiceError>>,
{
    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt + 1 < policy.max_attempts => {
                let delay = backoff.delay_for_attempt(attempt);
                warn!(
                    op,
                    attempt,
                    error = %e,
                    "transient control service error, retrying in {:?}",
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(MigrationError::ControlService { op, source: e }),
        }
    }
}
