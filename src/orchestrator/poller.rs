//! Convergence polling against the control service

use std::fmt;

use tracing::{debug, warn};

use crate::client::{ControlService, ControlServiceError};
use crate::config::PollBudget;
use crate::orchestrator::error::{MigrationError, Result};

/// What kind of resource a convergence wait is watching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Instance,
    Snapshot,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Instance => f.write_str("instance"),
            ResourceKind::Snapshot => f.write_str("snapshot"),
        }
    }
}

/// Wait until `id` reports `target`, probing once per interval, at most
/// `budget.max_attempts` times.
///
/// Any non-target status counts as still-in-progress: a resource stuck in a
/// genuine failure status is indistinguishable from one legitimately still
/// converging until the budget runs out. A resource not yet visible to
/// describe calls is treated the same way. Transient probe errors consume
/// their attempt; other probe errors abort the wait.
pub async fn await_status(
    client: &dyn ControlService,
    kind: ResourceKind,
    id: &str,
    target: &'static str,
    budget: &PollBudget,
) -> Result<()> {
    for attempt in 1..=budget.max_attempts {
        tokio::time::sleep(budget.interval).await;

        let observed = match kind {
            ResourceKind::Instance => client.describe_instance(id).await.map(|d| d.status),
            ResourceKind::Snapshot => client.describe_snapshot(id).await.map(|d| d.status),
        };

        match observed {
            Ok(status) if status == target => {
                debug!(%kind, id, attempt, "resource converged");
                return Ok(());
            }
            Ok(status) => {
                debug!(%kind, id, attempt, %status, "resource still converging");
            }
            Err(ControlServiceError::NotFound(_)) => {
                debug!(%kind, id, attempt, "resource not visible yet");
            }
            Err(e) if e.is_transient() => {
                debug!(%kind, id, attempt, error = %e, "transient error while polling");
            }
            Err(e) => {
                return Err(MigrationError::ControlService {
                    op: "describe",
                    source: e,
                });
            }
        }
    }

    warn!(
        %kind,
        id,
        attempts = budget.max_attempts,
        target,
        "convergence budget exhausted"
    );
    Err(MigrationError::ConvergenceTimeout {
        kind,
        id: id.to_string(),
        target,
        attempts: budget.max_attempts,
    })
}
