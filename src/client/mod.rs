//! Consumed interface of the Database Control Service
//!
//! The orchestrator never talks to a concrete control plane. It drives this
//! trait, which covers the instance and snapshot CRUD plus the status
//! queries the migration needs. Authentication, transport, and the wire
//! format all live behind implementations of it.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Target status every convergence wait looks for.
pub const STATUS_AVAILABLE: &str = "available";

/// Status resources report while an asynchronous operation is in flight.
pub const STATUS_CREATING: &str = "creating";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlServiceError {
    /// Network or API hiccup; safe to retry at the call level.
    #[error("transient control service error: {0}")]
    Transient(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    /// Anything the control plane answered that is neither success nor a
    /// hiccup. Not retried.
    #[error("control service request failed: {0}")]
    Request(String),
}

impl ControlServiceError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlServiceError::Transient(_))
    }
}

/// Acknowledgment of a create/modify/copy/restore call.
///
/// `AlreadyExists` is a distinct outcome rather than an error: with
/// deterministic naming it means a rerun found the work already done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckStatus {
    Accepted,
    AlreadyExists,
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDescription {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotDescription {
    pub id: String,
    pub status: String,
    pub source_instance: String,
}

/// Instance and snapshot operations of the managed-database control plane.
#[async_trait]
pub trait ControlService: Send + Sync {
    async fn list_instances(&self) -> Result<Vec<InstanceDescription>, ControlServiceError>;

    async fn create_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<AckStatus, ControlServiceError>;

    async fn describe_snapshot(
        &self,
        snapshot_id: &str,
    ) -> Result<SnapshotDescription, ControlServiceError>;

    async fn describe_instance(
        &self,
        instance_id: &str,
    ) -> Result<InstanceDescription, ControlServiceError>;

    async fn modify_instance(
        &self,
        instance_id: &str,
        new_id: &str,
        apply_immediately: bool,
    ) -> Result<AckStatus, ControlServiceError>;

    async fn copy_snapshot(
        &self,
        source_snapshot_id: &str,
        target_snapshot_id: &str,
        encryption_key: &str,
    ) -> Result<AckStatus, ControlServiceError>;

    async fn restore_instance_from_snapshot(
        &self,
        instance_id: &str,
        snapshot_id: &str,
    ) -> Result<AckStatus, ControlServiceError>;

    async fn create_read_replica(
        &self,
        replica_id: &str,
        source_instance_id: &str,
        encryption_key: &str,
    ) -> Result<AckStatus, ControlServiceError>;
}
