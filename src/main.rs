use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use encryption_migrator::client::memory::{FleetManifest, InMemoryControlService};
use encryption_migrator::{run_migration, MigrationConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("encryption_migrator=info".parse()?),
        )
        .init();

    info!("Starting encryption-migrator");

    let config = MigrationConfig::from_env()?;

    // Rehearsal mode: the shipped binary drives the in-memory control plane
    // seeded from a fleet manifest. Production deployments implement
    // ControlService against their control plane and call run_migration
    // directly.
    let manifest_path: PathBuf = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("MIGRATION_FLEET_MANIFEST").ok())
        .ok_or("usage: encryption-migrator <fleet-manifest.json>")?
        .into();
    let manifest = FleetManifest::load(&manifest_path)?;
    info!(
        manifest = %manifest_path.display(),
        instances = manifest.instances.len(),
        "loaded fleet manifest"
    );

    let client = Arc::new(InMemoryControlService::from_manifest(&manifest));
    let report = run_migration(client, config).await?;

    println!("{}", report.to_json()?);

    if !report.overall_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
