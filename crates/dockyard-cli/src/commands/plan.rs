use std::path::Path;

use dockyard_build::plan_release;

/// Print what `publish` would build and tag, without running docker.
pub fn plan(config: Option<&Path>, version: &str, multi_platform: bool) -> anyhow::Result<()> {
    let config = super::load_config(config)?;
    let version = super::parse_version(version)?;
    let platforms = super::select_platforms(&config, Vec::new(), multi_platform);

    for plan in plan_release(&version, &config, &platforms) {
        print!("{}", plan.render());
        // arch-lint: allow(no-error-swallowing) reason="plan only reports missing inputs, publish enforces them"
        if let Err(e) = plan.check_inputs(Path::new(".")) {
            println!("  warning:    {e}");
        }
    }

    Ok(())
}
