//! Per-instance migration pipeline
//!
//! One instance moves through five phases in strict dependency order:
//! snapshot, rename, encrypt, restore, replica recreation. Identifiers are
//! handed explicitly from phase to phase; nothing re-queries the fleet. The
//! rename is fire-and-forget, every other asynchronous operation is polled
//! to convergence before the next phase starts.
//!
//! Every create-like call treats an `AlreadyExists` acknowledgment as
//! already-satisfied work, which is what makes a rerun after partial
//! completion safe.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::client::{AckStatus, ControlServiceError, STATUS_AVAILABLE};
use crate::naming::{self, SnapshotName};
use crate::orchestrator::context::Context;
use crate::orchestrator::error::{with_retries, MigrationError};
use crate::orchestrator::poller::{await_status, ResourceKind};

/// Phase of the pipeline an instance is in when an outcome is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationPhase {
    Snapshot,
    Rename,
    Encrypt,
    Restore,
    ReplicaRecreate,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPhase::Snapshot => f.write_str("snapshot"),
            MigrationPhase::Rename => f.write_str("rename"),
            MigrationPhase::Encrypt => f.write_str("encrypt"),
            MigrationPhase::Restore => f.write_str("restore"),
            MigrationPhase::ReplicaRecreate => f.write_str("replica-recreate"),
        }
    }
}

/// A pipeline failure, carrying the phase it happened in. Never propagated
/// past the owning instance; the orchestrator records it in the report.
#[derive(Error, Debug)]
#[error("{phase} phase failed for {instance}: {source}")]
pub struct PipelineError {
    pub instance: String,
    pub phase: MigrationPhase,
    #[source]
    pub source: MigrationError,
}

impl PipelineError {
    fn new(instance: &str, phase: MigrationPhase, source: MigrationError) -> Self {
        Self {
            instance: instance.to_string(),
            phase,
            source,
        }
    }
}

/// Accept the ack or fail the instance. `AlreadyExists` means a rerun found
/// the resource in place.
fn check_ack(op: &'static str, id: &str, ack: AckStatus) -> Result<(), MigrationError> {
    match ack {
        AckStatus::Accepted => Ok(()),
        AckStatus::AlreadyExists => {
            info!(op, id, "resource already exists, treating as satisfied");
            Ok(())
        }
        AckStatus::Rejected(reason) => Err(MigrationError::AckRejected {
            op,
            id: id.to_string(),
            reason,
        }),
    }
}

/// Run the full migration pipeline for one eligible instance.
pub async fn migrate_instance(ctx: &Context, instance_id: &str) -> Result<(), PipelineError> {
    let client = ctx.client.as_ref();
    let retries = &ctx.config.call_retries;
    let backoff = &ctx.backoff;
    let fail = |phase| move |source| PipelineError::new(instance_id, phase, source);

    // Snapshot phase
    let snapshot = SnapshotName::new(instance_id, ctx.config.run_date.clone());
    let snapshot_id = snapshot.to_string();
    info!(instance = instance_id, snapshot = %snapshot_id, "creating snapshot");
    let ack = with_retries("create-snapshot", retries, backoff, || {
        client.create_snapshot(instance_id, &snapshot_id)
    })
    .await
    .map_err(fail(MigrationPhase::Snapshot))?;
    check_ack("create-snapshot", &snapshot_id, ack).map_err(fail(MigrationPhase::Snapshot))?;
    await_status(
        client,
        ResourceKind::Snapshot,
        &snapshot_id,
        STATUS_AVAILABLE,
        &ctx.config.snapshot_budget,
    )
    .await
    .map_err(fail(MigrationPhase::Snapshot))?;

    // Rename phase: relabel the original as a rollback artifact. Applied
    // immediately, not awaited; downstream phases do not depend on it
    // having taken effect.
    let renamed = naming::renamed_original(instance_id);
    info!(instance = instance_id, renamed = %renamed, "renaming original instance");
    match with_retries("modify-instance", retries, backoff, || {
        client.modify_instance(instance_id, &renamed, true)
    })
    .await
    {
        Ok(ack) => {
            check_ack("modify-instance", instance_id, ack).map_err(fail(MigrationPhase::Rename))?
        }
        Err(MigrationError::ControlService {
            source: ControlServiceError::NotFound(_),
            ..
        }) => {
            info!(instance = instance_id, "original already renamed");
        }
        Err(e) => return Err(fail(MigrationPhase::Rename)(e)),
    }

    // Encrypt phase, scoped to exactly the snapshot this run created.
    let encrypted = snapshot.encrypted();
    let encrypted_id = encrypted.to_string();
    info!(instance = instance_id, encrypted = %encrypted_id, "copying snapshot under target key");
    let ack = with_retries("copy-snapshot", retries, backoff, || {
        client.copy_snapshot(&snapshot_id, &encrypted_id, &ctx.config.target_key)
    })
    .await
    .map_err(fail(MigrationPhase::Encrypt))?;
    check_ack("copy-snapshot", &encrypted_id, ack).map_err(fail(MigrationPhase::Encrypt))?;
    await_status(
        client,
        ResourceKind::Snapshot,
        &encrypted_id,
        STATUS_AVAILABLE,
        &ctx.config.encrypt_budget,
    )
    .await
    .map_err(fail(MigrationPhase::Encrypt))?;

    // Restore phase: the target identifier comes from the structured name.
    let restored_id = encrypted.base();
    info!(instance = instance_id, restored = restored_id, "restoring from encrypted snapshot");
    let ack = with_retries("restore-instance", retries, backoff, || {
        client.restore_instance_from_snapshot(restored_id, &encrypted_id)
    })
    .await
    .map_err(fail(MigrationPhase::Restore))?;
    check_ack("restore-instance", restored_id, ack).map_err(fail(MigrationPhase::Restore))?;
    await_status(
        client,
        ResourceKind::Instance,
        restored_id,
        STATUS_AVAILABLE,
        &ctx.config.restore_budget,
    )
    .await
    .map_err(fail(MigrationPhase::Restore))?;

    // Replica recreation, sourced from the restored instance.
    let replica_id = naming::replica_name(instance_id);
    info!(instance = instance_id, replica = %replica_id, "recreating read replica");
    let ack = with_retries("create-read-replica", retries, backoff, || {
        client.create_read_replica(&replica_id, restored_id, &ctx.config.target_key)
    })
    .await
    .map_err(fail(MigrationPhase::ReplicaRecreate))?;
    check_ack("create-read-replica", &replica_id, ack)
        .map_err(fail(MigrationPhase::ReplicaRecreate))?;

    info!(instance = instance_id, "migration pipeline completed");
    Ok(())
}
