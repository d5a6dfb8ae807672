mod check;
mod ci;
mod doctor;
mod marker;
mod plan;
mod publish;
mod watch;

use std::path::Path;
use std::time::Duration;

use dockyard_cloud::{HubClient, NpmRegistry, RealExecutor, RegistryCredentials, ToolClient};
use dockyard_core::{CONFIG_FILE_NAME, DockyardConfig, ReleaseVersion, open_store};
use dockyard_release::{Pipeline, Publisher, RunOptions, RunOutcome, RunReport, Watcher};

pub use check::check;
pub use ci::ci_init;
pub use doctor::doctor;
pub use marker::{marker_set, marker_show};
pub use plan::plan;
pub use publish::publish;
pub use watch::watch;

type RealPipeline = Pipeline<NpmRegistry, RealExecutor, HubClient>;

/// Load `--config` if given, otherwise `./dockyard.toml` (defaults when absent).
fn load_config(config: Option<&Path>) -> anyhow::Result<DockyardConfig> {
    let loaded = match config {
        Some(path) => DockyardConfig::load_file(path)?,
        None => DockyardConfig::load(Path::new("."))?,
    };
    Ok(loaded)
}

fn config_path(config: Option<&Path>) -> &Path {
    match config {
        Some(path) => path,
        None => Path::new(CONFIG_FILE_NAME),
    }
}

fn parse_version(input: &str) -> anyhow::Result<ReleaseVersion> {
    ReleaseVersion::parse(input)
        .map_err(|e| anyhow::anyhow!("{e} — versions look like 5.1.0 or 5.0.0-rc.1"))
}

/// Platforms for a run: explicit `--platform` values win, then
/// `--multi-platform`, then `build.platforms`.
fn select_platforms(
    config: &DockyardConfig,
    explicit: Vec<String>,
    multi_platform: bool,
) -> Vec<String> {
    if !explicit.is_empty() {
        explicit
    } else if multi_platform {
        config.build.multi_platform.clone()
    } else {
        config.build.platforms.clone()
    }
}

fn npm_registry(config: &DockyardConfig) -> anyhow::Result<NpmRegistry> {
    Ok(NpmRegistry::new(
        &config.upstream.registry_url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?)
}

fn build_pipeline(config: DockyardConfig, options: RunOptions) -> anyhow::Result<RealPipeline> {
    let store = open_store(&config.marker)?;
    let watcher = Watcher::new(npm_registry(&config)?, store, config.upstream.package.clone())
        .allow_downgrade(config.upstream.allow_downgrade);

    let hub = HubClient::new(
        &config.registry.hub_api_url,
        Duration::from_secs(config.upstream.timeout_secs),
    )?;
    let publisher = Publisher::new(ToolClient::new(), hub, config, ".")
        .with_credentials(RegistryCredentials::from_env());

    Ok(Pipeline::new(watcher, publisher, options))
}

/// Print a run summary, then turn a failed run into an error.
fn finish(report: RunReport) -> anyhow::Result<()> {
    let states: Vec<String> = report.trace.states().iter().map(|s| s.to_string()).collect();
    tracing::debug!(trace = %states.join(" -> "), "run finished");

    match &report.outcome {
        RunOutcome::Unchanged { current } => {
            println!("Marker already at {current}, nothing to publish.");
        }
        RunOutcome::Stale { current, fetched } => {
            println!("Upstream latest {fetched} is older than marker {current}, ignored.");
        }
        RunOutcome::Recorded { version } => {
            println!("Recorded {version}. Publishing is left to the publish workflow.");
        }
        RunOutcome::Published(published) => {
            println!("Published {}:", published.version);
            for tag in published.tags() {
                println!("  {tag}");
            }
        }
        RunOutcome::Failed(_) => {}
    }

    report.into_result()?;
    Ok(())
}
