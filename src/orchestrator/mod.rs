//! Migration orchestration across the fleet
//!
//! Lists the fleet once, filters it through the injected eligibility
//! predicate, then fans the per-instance pipelines out over a bounded worker
//! pool. Failures stay with their instance; the fleet verdict is computed
//! from the collected outcomes.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod poller;
pub mod report;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

pub use context::Context;
pub use error::{with_retries, BackoffConfig, MigrationError};
pub use pipeline::{migrate_instance, MigrationPhase, PipelineError};
pub use poller::{await_status, ResourceKind};
pub use report::{FleetReport, InstanceOutcome};

use crate::client::{ControlService, InstanceDescription};
use crate::config::{EligibilityFilter, MigrationConfig};
use crate::naming::OLD_SUFFIX;

/// Run the whole migration: discover, filter, fan out, aggregate.
///
/// Only a listing failure is fleet-fatal. Every per-instance failure is
/// isolated into that instance's outcome and the remaining pipelines keep
/// running.
pub async fn run_migration(
    client: Arc<dyn ControlService>,
    config: MigrationConfig,
) -> Result<FleetReport, MigrationError> {
    let ctx = Context::new(client, config);

    let listing = with_retries("list-instances", &ctx.config.call_retries, &ctx.backoff, || {
        ctx.client.list_instances()
    })
    .await?;

    let mut eligible: Vec<String> = listing
        .iter()
        .filter(|instance| ctx.config.filter.is_eligible(&instance.id))
        .map(|instance| instance.id.clone())
        .collect();
    eligible.extend(resumable_bases(&listing, &ctx.config.filter));

    info!(
        region = %ctx.config.region,
        run_date = %ctx.config.run_date,
        total = listing.len(),
        eligible = eligible.len(),
        "starting fleet migration"
    );
    if eligible.is_empty() {
        warn!("no eligible instances found, nothing to migrate");
    }

    let ctx_ref = &ctx;
    let outcomes: Vec<(String, InstanceOutcome)> = stream::iter(eligible)
        .map(|instance_id| async move {
            let outcome = match migrate_instance(ctx_ref, &instance_id).await {
                Ok(()) => InstanceOutcome::Succeeded,
                Err(e) => {
                    error!(
                        instance = %instance_id,
                        phase = %e.phase,
                        error = %e,
                        "instance migration failed"
                    );
                    InstanceOutcome::Failed {
                        phase: e.phase,
                        reason: e.source.to_string(),
                    }
                }
            };
            (instance_id, outcome)
        })
        .buffer_unordered(ctx.config.max_concurrent.max(1))
        .collect()
        .await;

    let mut report = FleetReport::new(ctx.config.run_date.clone());
    for (instance_id, outcome) in outcomes {
        report.record(instance_id, outcome);
    }

    info!(
        succeeded = report.succeeded_count(),
        failed = report.failed_count(),
        overall = report.overall_succeeded(),
        "fleet migration finished"
    );
    Ok(report)
}

/// Bases whose migration stopped between rename and restore.
///
/// A rollback artifact with no surviving base instance means a previous run
/// renamed the original and never finished restoring. The base re-enters the
/// pipeline: its snapshot already exists for this run's date, so every
/// completed stage acknowledges as already satisfied and the pending stages
/// run. A base whose snapshot is missing fails at the snapshot phase and is
/// surfaced in the report rather than dropped.
fn resumable_bases(listing: &[InstanceDescription], filter: &EligibilityFilter) -> Vec<String> {
    let listed: BTreeSet<&str> = listing.iter().map(|i| i.id.as_str()).collect();
    let mut bases = Vec::new();
    for instance in listing {
        if let Some(base) = instance.id.strip_suffix(OLD_SUFFIX) {
            if !base.is_empty() && !listed.contains(base) && filter.is_eligible(base) {
                info!(
                    instance = base,
                    artifact = %instance.id,
                    "rollback artifact without a base instance, resuming its migration"
                );
                bases.push(base.to_string());
            }
        }
    }
    bases
}
