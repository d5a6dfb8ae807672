use std::path::Path;

use dockyard_core::{CasOutcome, open_store};

pub fn marker_show(config: Option<&Path>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let store = open_store(&config.marker)?;

    match store.read()? {
        Some(version) => println!("{version}"),
        None => println!("(none)"),
    }

    Ok(())
}

/// Compare-and-swap the marker. Without `--expect` the write is checked
/// against the value read just before it.
pub fn marker_set(config: Option<&Path>, version: &str, expect: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let store = open_store(&config.marker)?;
    let version = super::parse_version(version)?;

    let expected = match expect {
        Some(old) => Some(super::parse_version(old)?),
        None => store.read()?,
    };

    match store.write_if_changed(expected.as_ref(), &version)? {
        CasOutcome::Written => println!("Marker set to {version} ({})", store.location()),
        CasOutcome::Unchanged => println!("Marker already at {version}"),
    }

    Ok(())
}
