mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "dockyard", about = "Publish Docker images for new Strapi releases")]
#[command(version)]
struct Cli {
    /// Config file (default: ./dockyard.toml). Paths inside it are relative
    /// to the working directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the latest upstream release next to the recorded marker
    Check,
    /// Record a new upstream release and publish it
    ///
    /// The marker is written before anything is built. If publishing then
    /// fails, later runs see the marker as up to date and will not retry;
    /// recover with `dockyard publish <VERSION>`.
    Watch {
        /// Commit and push the marker file after it changes
        #[arg(long)]
        commit: bool,
        /// Only record the new release; leave publishing to a later run
        #[arg(long)]
        no_publish: bool,
        /// Build for every platform in build.multi_platform
        #[arg(long)]
        multi_platform: bool,
    },
    /// Build and push the images for a version
    Publish {
        /// Version to publish, e.g. 5.1.0 or 5.0.0-rc.1
        #[arg(required_unless_present = "from_marker", conflicts_with = "from_marker")]
        version: Option<String>,
        /// Publish the version recorded in the marker
        #[arg(long)]
        from_marker: bool,
        /// Target platform (repeatable), e.g. linux/arm64
        #[arg(long = "platform", conflicts_with = "multi_platform")]
        platforms: Vec<String>,
        /// Build for every platform in build.multi_platform
        #[arg(long)]
        multi_platform: bool,
    },
    /// Print the images, tags and build args for a version without building
    Plan {
        version: String,
        /// Plan for every platform in build.multi_platform
        #[arg(long)]
        multi_platform: bool,
    },
    /// Inspect or set the version marker
    Marker {
        #[command(subcommand)]
        action: MarkerAction,
    },
    /// Check docker, buildx, git, gh, config and credentials
    Doctor,
    /// Manage GitHub Actions workflows
    Ci {
        #[command(subcommand)]
        action: CiAction,
    },
}

#[derive(Subcommand)]
enum MarkerAction {
    /// Print the recorded version
    Show,
    /// Record a version
    Set {
        version: String,
        /// Only write if the marker currently holds this version
        #[arg(long)]
        expect: Option<String>,
    },
}

#[derive(Subcommand)]
enum CiAction {
    /// Write the watch and publish workflows under .github/workflows
    Init {
        /// Overwrite existing workflow files
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                // arch-lint: allow(no-silent-result-drop) reason="unset or malformed RUST_LOG falls back to info"
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!(error = %e, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Check => commands::check(config).await?,
        Commands::Watch {
            commit,
            no_publish,
            multi_platform,
        } => commands::watch(config, commit, no_publish, multi_platform).await?,
        Commands::Publish {
            version,
            from_marker,
            platforms,
            multi_platform,
        } => {
            commands::publish(config, version.as_deref(), from_marker, platforms, multi_platform)
                .await?
        }
        Commands::Plan {
            version,
            multi_platform,
        } => commands::plan(config, &version, multi_platform)?,
        Commands::Marker { action } => match action {
            MarkerAction::Show => commands::marker_show(config)?,
            MarkerAction::Set { version, expect } => {
                commands::marker_set(config, &version, expect.as_deref())?
            }
        },
        Commands::Doctor => commands::doctor(config).await?,
        Commands::Ci { action } => match action {
            CiAction::Init { force } => commands::ci_init(config, force)?,
        },
    }

    Ok(())
}
