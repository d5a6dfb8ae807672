use std::path::Path;

use dockyard_release::{PipelineError, RunOptions, RunOutcome};

/// Scheduled run: compare upstream with the marker, record a change and
/// publish it.
pub async fn watch(
    config: Option<&Path>,
    commit: bool,
    no_publish: bool,
    multi_platform: bool,
) -> anyhow::Result<()> {
    let config = super::load_config(config)?;

    let mut options = RunOptions::from_config(&config);
    options.commit_marker |= commit;
    options.publish = !no_publish;
    options.platforms = super::select_platforms(&config, Vec::new(), multi_platform);

    println!("Checking {} on npm...", config.upstream.package);
    let mut pipeline = super::build_pipeline(config, options)?;
    let report = pipeline.run_scheduled().await;

    if let RunOutcome::Failed(PipelineError::Publish(_)) = &report.outcome {
        if let Some(event) = report.events.last() {
            eprintln!(
                "Marker already records {v}; the next watch will not retry it. Run `dockyard publish {v}`.",
                v = event.version
            );
        }
    }

    super::finish(report)
}
