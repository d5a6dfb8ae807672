use std::path::Path;

const WATCH_WORKFLOW_PATH: &str = ".github/workflows/dockyard-watch.yml";
const PUBLISH_WORKFLOW_PATH: &str = ".github/workflows/dockyard-publish.yml";

/// Write the GitHub Actions workflows that run dockyard.
pub fn ci_init(config: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let config = super::load_config(config)?;

    let marker_path = config.marker.path.to_str().ok_or_else(|| {
        anyhow::anyhow!(
            "marker path {} is not valid UTF-8",
            config.marker.path.display()
        )
    })?;

    let workflows = [
        (WATCH_WORKFLOW_PATH, generate_watch_yaml()),
        (
            PUBLISH_WORKFLOW_PATH,
            generate_publish_yaml(marker_path, &config.release.branch),
        ),
    ];

    // ── Guard: workflows already exist ──
    if !force {
        if let Some((path, _)) = workflows.iter().find(|(path, _)| Path::new(path).exists()) {
            anyhow::bail!(
                "Workflow already exists at {path} — edit it directly, or pass --force to overwrite"
            );
        }
    }

    for (path, content) in &workflows {
        let path = Path::new(path);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, content)?;
        println!("  Wrote {}", path.display());
    }

    println!();
    println!("Add these repository secrets:");
    println!("  DOCKERHUB_USERNAME, DOCKERHUB_TOKEN  registry login and description sync");
    println!("  WORKFLOW_TOKEN                       PAT so marker pushes start the publish workflow");

    Ok(())
}

const INSTALL_STEPS: &str = r#"      - name: Install Rust
        uses: dtolnay/rust-toolchain@stable

      - name: Cache dockyard binary
        uses: actions/cache@v4
        with:
          path: ~/.cargo/bin/dockyard
          key: dockyard-cli-${{ hashFiles('Cargo.lock') }}

      - name: Install dockyard
        run: |
          if ! command -v dockyard &> /dev/null; then
            cargo install dockyard-cli
          fi
"#;

/// Daily watcher: records new releases in the marker and pushes the commit.
fn generate_watch_yaml() -> String {
    let head = r#"# Generated by: dockyard ci init
name: Watch Strapi releases

on:
  schedule:
    - cron: "0 3 * * *"
  workflow_dispatch:

jobs:
  watch:
    runs-on: ubuntu-latest
    permissions:
      contents: write

    steps:
      # Pushes made with the default GITHUB_TOKEN do not start other
      # workflows, so the marker commit is pushed with WORKFLOW_TOKEN.
      - uses: actions/checkout@v4
        with:
          token: ${{ secrets.WORKFLOW_TOKEN || github.token }}

"#;
    let tail = r#"
      - name: Check for a new release
        run: dockyard watch --commit --no-publish
"#;
    format!("{head}{INSTALL_STEPS}{tail}")
}

/// Publisher: runs when the marker changes on `branch`, or on dispatch with
/// an explicit version.
fn generate_publish_yaml(marker_path: &str, branch: &str) -> String {
    let head = r#"# Generated by: dockyard ci init
name: Publish Strapi images

on:
  push:
    branches: [__BRANCH__]
    paths:
      - "__MARKER_PATH__"
  workflow_dispatch:
    inputs:
      version:
        description: "Strapi version to publish, e.g. 5.1.0"
        required: true

jobs:
  publish:
    runs-on: ubuntu-latest
    permissions:
      contents: write
    env:
      DOCKERHUB_USERNAME: ${{ secrets.DOCKERHUB_USERNAME }}
      DOCKERHUB_TOKEN: ${{ secrets.DOCKERHUB_TOKEN }}
      GH_TOKEN: ${{ github.token }}

    steps:
      - uses: actions/checkout@v4

      - uses: docker/setup-qemu-action@v3

      - uses: docker/setup-buildx-action@v3

"#
    .replace("__BRANCH__", branch)
    .replace("__MARKER_PATH__", marker_path);

    let tail = r#"
      - name: Publish recorded release
        if: github.event_name == 'push'
        run: dockyard publish --from-marker --multi-platform

      - name: Publish requested release
        if: github.event_name == 'workflow_dispatch'
        run: dockyard publish "$VERSION" --multi-platform
        env:
          VERSION: ${{ inputs.version }}
"#;
    format!("{head}{INSTALL_STEPS}{tail}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_yaml_runs_daily_and_on_demand() {
        let yaml = generate_watch_yaml();
        assert!(yaml.contains("cron: \"0 3 * * *\""));
        assert!(yaml.contains("workflow_dispatch:"));
        assert!(yaml.contains("dockyard watch --commit --no-publish"));
        assert!(yaml.contains("contents: write"));
        assert!(yaml.contains("cargo install dockyard-cli"));
    }

    #[test]
    fn publish_yaml_triggers_on_marker_and_dispatch() {
        let yaml = generate_publish_yaml("release-versions/strapi-latest.txt", "main");
        assert!(yaml.contains("branches: [main]"));
        assert!(yaml.contains("- \"release-versions/strapi-latest.txt\""));
        assert!(yaml.contains("dockyard publish --from-marker --multi-platform"));
        assert!(yaml.contains("dockyard publish \"$VERSION\" --multi-platform"));
        assert!(yaml.contains("${{ inputs.version }}"));
    }

    #[test]
    fn publish_yaml_exposes_registry_credentials() {
        let yaml = generate_publish_yaml("marker.txt", "main");
        assert!(yaml.contains("DOCKERHUB_USERNAME: ${{ secrets.DOCKERHUB_USERNAME }}"));
        assert!(yaml.contains("DOCKERHUB_TOKEN: ${{ secrets.DOCKERHUB_TOKEN }}"));
        assert!(yaml.contains("docker/setup-buildx-action"));
    }

    #[test]
    fn install_steps_are_indented_as_steps() {
        for line in INSTALL_STEPS.lines().filter(|l| !l.trim().is_empty()) {
            assert!(line.starts_with("      "), "bad indent: {line:?}");
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn publish_yaml_watches_configured_marker(
                dir in "[a-z][a-z-]{0,15}",
                file in "[a-z][a-z0-9-]{0,15}\\.txt",
                branch in "[a-z][a-z0-9/-]{0,20}",
            ) {
                let path = format!("{dir}/{file}");
                let yaml = generate_publish_yaml(&path, &branch);
                let expected_path = format!("- \"{path}\"");
                let expected_branch = format!("branches: [{branch}]");
                prop_assert!(yaml.contains(&expected_path));
                prop_assert!(yaml.contains(&expected_branch));
                prop_assert!(!yaml.contains("__"));
            }
        }
    }
}
