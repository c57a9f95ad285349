//! Shared fixtures for integration scenarios

use std::sync::Arc;
use std::time::Duration;

use encryption_migrator::client::memory::InMemoryControlService;
use encryption_migrator::{MigrationConfig, PollBudget, RunDate};

pub const TARGET_KEY: &str = "key-1234";
pub const RUN_DATE: &str = "20240115";

/// Config with short poll budgets; tests run under a paused clock, so the
/// intervals only shape attempt counting.
pub fn test_config() -> MigrationConfig {
    let mut config = MigrationConfig::new(
        "us-west-2",
        TARGET_KEY,
        RunDate::parse(RUN_DATE).unwrap(),
    );
    let budget = PollBudget::new(5, Duration::from_millis(10));
    config.snapshot_budget = budget;
    config.encrypt_budget = budget;
    config.restore_budget = budget;
    config
}

/// Fleet with the given instances, all `available`.
pub async fn seeded_client(instance_ids: &[&str]) -> Arc<InMemoryControlService> {
    let client = InMemoryControlService::new();
    for id in instance_ids {
        client.add_instance(id).await;
    }
    Arc::new(client)
}
