//! Fleet storage-encryption migrator
//!
//! Migrates managed database instances from unencrypted to encrypted
//! storage: snapshot each eligible instance, rename the original as a
//! rollback artifact, copy the snapshot under the target encryption key,
//! restore a new instance from the encrypted copy, and recreate the
//! dependent read replica.
//!
//! The control plane is consumed through the [`client::ControlService`]
//! trait; [`orchestrator::run_migration`] drives the whole run and returns a
//! [`orchestrator::FleetReport`].

pub mod client;
pub mod config;
pub mod naming;
pub mod orchestrator;

pub use client::{
    AckStatus, ControlService, ControlServiceError, InstanceDescription, SnapshotDescription,
    STATUS_AVAILABLE, STATUS_CREATING,
};
pub use config::{ConfigError, EligibilityFilter, MigrationConfig, PollBudget, RetryPolicy};
pub use naming::{EncryptedSnapshotName, NameError, RunDate, SnapshotName};
pub use orchestrator::{
    run_migration, Context, FleetReport, InstanceOutcome, MigrationError, MigrationPhase,
    PipelineError,
};
