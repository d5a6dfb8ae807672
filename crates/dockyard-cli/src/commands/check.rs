use std::path::Path;

use dockyard_cloud::UpstreamRegistry;
use dockyard_core::open_store;

/// Print the upstream `latest` release and the recorded marker without
/// changing anything.
pub async fn check(config: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let registry = super::npm_registry(&config)?;
    let store = open_store(&config.marker)?;

    let latest = registry.latest_version(&config.upstream.package).await?;
    let marker = store.read()?;

    println!("Package:  {}", config.upstream.package);
    println!("Upstream: {latest}");
    match &marker {
        Some(current) => println!("Marker:   {current} ({})", store.location()),
        None => println!("Marker:   (none) ({})", store.location()),
    }

    let status = match marker {
        None => "new release",
        Some(current) if current == latest => "up to date",
        Some(current) if latest < current => "upstream older than marker",
        Some(_) => "new release",
    };
    println!("Status:   {status}");

    Ok(())
}
