use std::path::Path;

use dockyard_core::{ReleaseEvent, open_store};
use dockyard_release::RunOptions;

/// Manual trigger: publish an explicit version, or the one in the marker.
pub async fn publish(
    config: Option<&Path>,
    version: Option<&str>,
    from_marker: bool,
    platforms: Vec<String>,
    multi_platform: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config)?;

    let event = if from_marker {
        let store = open_store(&config.marker)?;
        let version = store.read()?.ok_or_else(|| {
            anyhow::anyhow!(
                "no version recorded at {} — run `dockyard watch` or `dockyard marker set`",
                store.location()
            )
        })?;
        ReleaseEvent::scheduled(version)
    } else {
        let input = version.ok_or_else(|| anyhow::anyhow!("a VERSION or --from-marker is required"))?;
        ReleaseEvent::manual(super::parse_version(input)?)
    };

    let mut options = RunOptions::from_config(&config);
    options.platforms = super::select_platforms(&config, platforms, multi_platform);

    println!(
        "Publishing {} for {}...",
        event.version,
        options.platforms.join(", ")
    );
    let mut pipeline = super::build_pipeline(config, options)?;
    let report = pipeline.run_event(event).await;

    super::finish(report)
}
