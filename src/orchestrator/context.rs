//! Shared context handed to every per-instance pipeline

use std::sync::Arc;

use crate::client::ControlService;
use crate::config::MigrationConfig;
use crate::orchestrator::error::BackoffConfig;

pub struct Context {
    pub client: Arc<dyn ControlService>,
    pub config: MigrationConfig,
    pub backoff: BackoffConfig,
}

impl Context {
    pub fn new(client: Arc<dyn ControlService>, config: MigrationConfig) -> Self {
        Self {
            client,
            config,
            backoff: BackoffConfig::default(),
        }
    }
}
