//! Aggregate fleet report
//!
//! The orchestrator's view of the run: one outcome per instance, retained as
//! structured data rather than printed-and-forgotten, and a fleet-wide
//! verdict driving the process exit code.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::naming::RunDate;
use crate::orchestrator::pipeline::MigrationPhase;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum InstanceOutcome {
    Succeeded,
    Failed {
        phase: MigrationPhase,
        reason: String,
    },
}

impl InstanceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InstanceOutcome::Succeeded)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FleetReport {
    pub run_date: RunDate,
    pub per_instance: BTreeMap<String, InstanceOutcome>,
}

impl FleetReport {
    pub fn new(run_date: RunDate) -> Self {
        Self {
            run_date,
            per_instance: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, instance_id: impl Into<String>, outcome: InstanceOutcome) {
        self.per_instance.insert(instance_id.into(), outcome);
    }

    pub fn outcome(&self, instance_id: &str) -> Option<&InstanceOutcome> {
        self.per_instance.get(instance_id)
    }

    pub fn succeeded_count(&self) -> usize {
        self.per_instance.values().filter(|o| o.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.per_instance.len() - self.succeeded_count()
    }

    /// True when every instance in the run succeeded. An empty fleet is
    /// trivially successful.
    pub fn overall_succeeded(&self) -> bool {
        self.per_instance.values().all(InstanceOutcome::is_success)
    }

    /// The report printed to stdout at the end of a run.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&json!({
            "run_date": self.run_date,
            "overall_succeeded": self.overall_succeeded(),
            "instances": self.per_instance,
        }))
    }
}
