//! In-memory simulated control plane
//!
//! Backs rehearsal runs of the binary and the test suite. Resources created
//! through it start out `creating` and converge to `available` after a fixed
//! number of describe calls, so poll loops see a realistic settling window.
//! Failure injection covers the cases the orchestrator must isolate: stuck
//! resources that never converge, rejected acknowledgments, and transient
//! call errors.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;

use super::{
    AckStatus, ControlService, ControlServiceError, InstanceDescription, SnapshotDescription,
    STATUS_AVAILABLE, STATUS_CREATING,
};

/// Describe calls a newly created resource takes to reach `available`.
const DEFAULT_SETTLE_POLLS: u32 = 2;

/// Operation names recorded for every call, in invocation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    ListInstances,
    CreateSnapshot,
    DescribeSnapshot,
    DescribeInstance,
    ModifyInstance,
    CopySnapshot,
    RestoreInstance,
    CreateReadReplica,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    /// Identifier of the resource the call primarily targets.
    pub id: String,
}

#[derive(Debug, Clone)]
struct SimInstance {
    status: String,
    polls_remaining: u32,
}

#[derive(Debug, Clone)]
struct SimSnapshot {
    status: String,
    polls_remaining: u32,
    source_instance: String,
    encryption_key: Option<String>,
}

#[derive(Debug, Default)]
struct FleetState {
    instances: BTreeMap<String, SimInstance>,
    snapshots: BTreeMap<String, SimSnapshot>,
    calls: Vec<RecordedCall>,
    /// Resources that never leave `creating`.
    stuck: BTreeSet<String>,
    /// Resource ids whose create-like call is rejected.
    rejected: BTreeSet<String>,
    /// Remaining injected transient failures per resource id.
    transient: BTreeMap<String, u32>,
}

impl FleetState {
    fn record(&mut self, kind: CallKind, id: impl Into<String>) {
        self.calls.push(RecordedCall {
            kind,
            id: id.into(),
        });
    }

    /// Consume one injected transient failure for `id`, if any is pending.
    fn take_transient(&mut self, id: &str) -> Result<(), ControlServiceError> {
        if let Some(remaining) = self.transient.get_mut(id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(ControlServiceError::Transient(format!(
                    "injected transient failure for {id}"
                )));
            }
        }
        Ok(())
    }
}

/// Fleet manifest seeding a rehearsal run, e.g.
/// `{"instances": [{"id": "orders-db"}]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct FleetManifest {
    pub instances: Vec<ManifestInstance>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestInstance {
    pub id: String,
    #[serde(default = "default_manifest_status")]
    pub status: String,
}

fn default_manifest_status() -> String {
    STATUS_AVAILABLE.to_string()
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read fleet manifest: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse fleet manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

impl FleetManifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Simulated Database Control Service holding the whole fleet in memory.
#[derive(Debug, Default)]
pub struct InMemoryControlService {
    state: Mutex<FleetState>,
}

impl InMemoryControlService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_manifest(manifest: &FleetManifest) -> Self {
        let mut state = FleetState::default();
        for instance in &manifest.instances {
            state.instances.insert(
                instance.id.clone(),
                SimInstance {
                    status: instance.status.clone(),
                    polls_remaining: 0,
                },
            );
        }
        Self {
            state: Mutex::new(state),
        }
    }

    /// Seed an instance already in `available` status.
    pub async fn add_instance(&self, id: &str) {
        self.state.lock().await.instances.insert(
            id.to_string(),
            SimInstance {
                status: STATUS_AVAILABLE.to_string(),
                polls_remaining: 0,
            },
        );
    }

    /// Seed a snapshot already in `available` status, as a previous partial
    /// run would have left it.
    pub async fn add_snapshot(&self, id: &str, source_instance: &str) {
        self.state.lock().await.snapshots.insert(
            id.to_string(),
            SimSnapshot {
                status: STATUS_AVAILABLE.to_string(),
                polls_remaining: 0,
                source_instance: source_instance.to_string(),
                encryption_key: None,
            },
        );
    }

    /// Make `id` converge never: it stays `creating` for every describe.
    pub async fn mark_stuck(&self, id: &str) {
        self.state.lock().await.stuck.insert(id.to_string());
    }

    /// Reject the create-like call that would produce `id`.
    pub async fn reject_creation_of(&self, id: &str) {
        self.state.lock().await.rejected.insert(id.to_string());
    }

    /// Fail the next `count` calls touching `id` with a transient error.
    pub async fn fail_transient(&self, id: &str, count: u32) {
        self.state.lock().await.transient.insert(id.to_string(), count);
    }

    pub async fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn instance_ids(&self) -> Vec<String> {
        self.state.lock().await.instances.keys().cloned().collect()
    }

    pub async fn snapshot_ids(&self) -> Vec<String> {
        self.state.lock().await.snapshots.keys().cloned().collect()
    }

    /// Encryption key recorded for a snapshot, if it was copied with one.
    pub async fn snapshot_key(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .await
            .snapshots
            .get(id)
            .and_then(|s| s.encryption_key.clone())
    }

    fn new_settling_instance() -> SimInstance {
        SimInstance {
            status: STATUS_CREATING.to_string(),
            polls_remaining: DEFAULT_SETTLE_POLLS,
        }
    }

    fn new_settling_snapshot(source_instance: &str, key: Option<&str>) -> SimSnapshot {
        SimSnapshot {
            status: STATUS_CREATING.to_string(),
            polls_remaining: DEFAULT_SETTLE_POLLS,
            source_instance: source_instance.to_string(),
            encryption_key: key.map(str::to_string),
        }
    }
}

#[async_trait]
impl ControlService for InMemoryControlService {
    async fn list_instances(&self) -> Result<Vec<InstanceDescription>, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::ListInstances, "*");
        Ok(state
            .instances
            .iter()
            .map(|(id, i)| InstanceDescription {
                id: id.clone(),
                status: i.status.clone(),
            })
            .collect())
    }

    async fn create_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<AckStatus, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::CreateSnapshot, snapshot_id);
        state.take_transient(snapshot_id)?;
        if state.rejected.contains(snapshot_id) {
            return Ok(AckStatus::Rejected("snapshot quota exceeded".to_string()));
        }
        if state.snapshots.contains_key(snapshot_id) {
            return Ok(AckStatus::AlreadyExists);
        }
        if !state.instances.contains_key(instance_id) {
            return Err(ControlServiceError::NotFound(instance_id.to_string()));
        }
        state.snapshots.insert(
            snapshot_id.to_string(),
            Self::new_settling_snapshot(instance_id, None),
        );
        Ok(AckStatus::Accepted)
    }

    async fn describe_snapshot(
        &self,
        snapshot_id: &str,
    ) -> Result<SnapshotDescription, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::DescribeSnapshot, snapshot_id);
        state.take_transient(snapshot_id)?;
        let stuck = state.stuck.contains(snapshot_id);
        let snapshot = state
            .snapshots
            .get_mut(snapshot_id)
            .ok_or_else(|| ControlServiceError::NotFound(snapshot_id.to_string()))?;
        if !stuck && snapshot.status == STATUS_CREATING {
            if snapshot.polls_remaining > 0 {
                snapshot.polls_remaining -= 1;
            }
            if snapshot.polls_remaining == 0 {
                snapshot.status = STATUS_AVAILABLE.to_string();
            }
        }
        Ok(SnapshotDescription {
            id: snapshot_id.to_string(),
            status: snapshot.status.clone(),
            source_instance: snapshot.source_instance.clone(),
        })
    }

    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceDescription, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::DescribeInstance, instance_id);
        state.take_transient(instance_id)?;
        let stuck = state.stuck.contains(instance_id);
        let instance = state
            .instances
            .get_mut(instance_id)
            .ok_or_else(|| ControlServiceError::NotFound(instance_id.to_string()))?;
        if !stuck && instance.status == STATUS_CREATING {
            if instance.polls_remaining > 0 {
                instance.polls_remaining -= 1;
            }
            if instance.polls_remaining == 0 {
                instance.status = STATUS_AVAILABLE.to_string();
            }
        }
        Ok(InstanceDescription {
            id: instance_id.to_string(),
            status: instance.status.clone(),
        })
    }

    async fn modify_instance(
        &self,
        instance_id: &str,
        new_id: &str,
        _apply_immediately: bool,
    ) -> Result<AckStatus, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::ModifyInstance, instance_id);
        state.take_transient(instance_id)?;
        if state.instances.contains_key(new_id) {
            return Ok(AckStatus::AlreadyExists);
        }
        let instance = state
            .instances
            .remove(instance_id)
            .ok_or_else(|| ControlServiceError::NotFound(instance_id.to_string()))?;
        state.instances.insert(new_id.to_string(), instance);
        Ok(AckStatus::Accepted)
    }

    async fn copy_snapshot(
        &self,
        source_snapshot_id: &str,
        target_snapshot_id: &str,
        encryption_key: &str,
    ) -> Result<AckStatus, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::CopySnapshot, target_snapshot_id);
        state.take_transient(target_snapshot_id)?;
        if state.rejected.contains(target_snapshot_id) {
            return Ok(AckStatus::Rejected("copy request rejected".to_string()));
        }
        if state.snapshots.contains_key(target_snapshot_id) {
            return Ok(AckStatus::AlreadyExists);
        }
        let source = state
            .snapshots
            .get(source_snapshot_id)
            .ok_or_else(|| ControlServiceError::NotFound(source_snapshot_id.to_string()))?;
        if source.status != STATUS_AVAILABLE {
            return Ok(AckStatus::Rejected(format!(
                "source snapshot {source_snapshot_id} is not available"
            )));
        }
        let source_instance = source.source_instance.clone();
        state.snapshots.insert(
            target_snapshot_id.to_string(),
            Self::new_settling_snapshot(&source_instance, Some(encryption_key)),
        );
        Ok(AckStatus::Accepted)
    }

    async fn restore_instance_from_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<AckStatus, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::RestoreInstance, instance_id);
        state.take_transient(instance_id)?;
        if state.rejected.contains(instance_id) {
            return Ok(AckStatus::Rejected("restore request rejected".to_string()));
        }
        if state.instances.contains_key(instance_id) {
            return Ok(AckStatus::AlreadyExists);
        }
        let snapshot = state
            .snapshots
            .get(snapshot_id)
            .ok_or_else(|| ControlServiceError::NotFound(snapshot_id.to_string()))?;
        if snapshot.status != STATUS_AVAILABLE {
            return Ok(AckStatus::Rejected(format!(
                "snapshot {snapshot_id} is not available"
            )));
        }
        state
            .instances
            .insert(instance_id.to_string(), Self::new_settling_instance());
        Ok(AckStatus::Accepted)
    }

    async fn create_read_replica(
        &self,
        replica_id: &str,
        source_instance_id: &str,
        _encryption_key: &str,
    ) -> Result<AckStatus, ControlServiceError> {
        let mut state = self.state.lock().await;
        state.record(CallKind::CreateReadReplica, replica_id);
        state.take_transient(replica_id)?;
        if state.instances.contains_key(replica_id) {
            return Ok(AckStatus::AlreadyExists);
        }
        if !state.instances.contains_key(source_instance_id) {
            return Err(ControlServiceError::NotFound(source_instance_id.to_string()));
        }
        state
            .instances
            .insert(replica_id.to_string(), Self::new_settling_instance());
        Ok(AckStatus::Accepted)
    }
}
