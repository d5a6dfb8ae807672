//! Run orchestration: watcher stage, trigger queue and publisher stage.
//!
//! ```text
//! Idle ─► Fetching ─┬─► Unchanged ─► Idle
//!                   ├─► Changed ───► Building ─┬─► Published
//!                   │      │                   └─► Failed
//!                   │      └─► Failed / Idle (no publish)
//!                   └─► Failed
//! Idle ─► Building ─► ...                        (manual trigger)
//! ```

use std::fmt;

use dockyard_cloud::{DescriptionSync, GitError, ToolExecutor, UpstreamRegistry};
use dockyard_core::{DockyardConfig, ReleaseEvent, ReleaseVersion};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::error::{MarkerWriteError, PipelineError, RollbackFailure};
use crate::publisher::{PublishReport, Publisher};
use crate::watcher::{MarkerUpdate, Watcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Fetching,
    Unchanged,
    Changed,
    Building,
    Published,
    Failed,
}

impl RunState {
    pub fn can_transition_to(self, next: RunState) -> bool {
        use RunState::*;
        matches!(
            (self, next),
            (Idle, Fetching)
                | (Idle, Building)
                | (Fetching, Unchanged)
                | (Fetching, Changed)
                | (Fetching, Failed)
                | (Unchanged, Idle)
                | (Changed, Building)
                | (Changed, Failed)
                | (Changed, Idle)
                | (Building, Published)
                | (Building, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Idle | Self::Published | Self::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Unchanged => "unchanged",
            Self::Changed => "changed",
            Self::Building => "building",
            Self::Published => "published",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("invalid run state transition {from} -> {to}")]
pub struct InvalidTransition {
    pub from: RunState,
    pub to: RunState,
}

/// States visited by one run, starting at [`RunState::Idle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunTrace {
    states: Vec<RunState>,
}

impl Default for RunTrace {
    fn default() -> Self {
        Self {
            states: vec![RunState::Idle],
        }
    }
}

impl RunTrace {
    pub fn current(&self) -> RunState {
        match self.states.last() {
            Some(state) => *state,
            None => RunState::Idle,
        }
    }

    pub fn states(&self) -> &[RunState] {
        &self.states
    }

    pub fn advance(&mut self, next: RunState) -> Result<(), InvalidTransition> {
        let from = self.current();
        if !from.can_transition_to(next) {
            return Err(InvalidTransition { from, to: next });
        }
        tracing::debug!(%from, to = %next, "run state");
        self.states.push(next);
        Ok(())
    }

    /// Move to [`RunState::Failed`] if the current state allows it.
    fn fail(&mut self) {
        if self.current().can_transition_to(RunState::Failed) {
            self.states.push(RunState::Failed);
        }
    }
}

/// In-process queue of publish requests between the watcher and the
/// publisher stage.
pub struct TriggerQueue {
    tx: mpsc::UnboundedSender<ReleaseEvent>,
    rx: mpsc::UnboundedReceiver<ReleaseEvent>,
}

impl Default for TriggerQueue {
    fn default() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl TriggerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, event: ReleaseEvent) {
        tracing::info!(version = %event.version, source = %event.source, "release event queued");
        // arch-lint: allow(no-error-swallowing) reason="the queue owns its receiver, so send only fails after drop"
        if let Err(e) = self.tx.send(event) {
            tracing::error!(version = %e.0.version, "trigger queue closed, event dropped");
        }
    }

    /// Take every queued event, oldest first.
    pub fn drain(&mut self) -> Vec<ReleaseEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        events
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub platforms: Vec<String>,
    /// Publish in this run. When off, a changed marker is only recorded.
    pub publish: bool,
    /// Commit and push the marker file after it changes.
    pub commit_marker: bool,
}

impl RunOptions {
    pub fn from_config(config: &DockyardConfig) -> Self {
        Self {
            platforms: config.build.platforms.clone(),
            publish: true,
            commit_marker: config.release.commit_marker,
        }
    }
}

#[derive(Debug)]
pub enum RunOutcome {
    Unchanged {
        current: ReleaseVersion,
    },
    Stale {
        current: ReleaseVersion,
        fetched: ReleaseVersion,
    },
    /// Marker changed but publishing was left to a later run.
    Recorded {
        version: ReleaseVersion,
    },
    Published(PublishReport),
    Failed(PipelineError),
}

#[derive(Debug)]
pub struct RunReport {
    pub trace: RunTrace,
    /// Events dispatched to the publisher.
    pub events: Vec<ReleaseEvent>,
    pub outcome: RunOutcome,
}

impl RunReport {
    pub fn final_state(&self) -> RunState {
        self.trace.current()
    }

    pub fn into_result(self) -> Result<Self, PipelineError> {
        let RunReport {
            trace,
            events,
            outcome,
        } = self;
        match outcome {
            RunOutcome::Failed(e) => Err(e),
            outcome => Ok(RunReport {
                trace,
                events,
                outcome,
            }),
        }
    }
}

pub struct Pipeline<R: UpstreamRegistry, E: ToolExecutor, D: DescriptionSync> {
    watcher: Watcher<R>,
    publisher: Publisher<E, D>,
    queue: TriggerQueue,
    options: RunOptions,
}

impl<R, E, D> Pipeline<R, E, D>
where
    R: UpstreamRegistry,
    E: ToolExecutor,
    D: DescriptionSync,
{
    pub fn new(watcher: Watcher<R>, publisher: Publisher<E, D>, options: RunOptions) -> Self {
        Self {
            watcher,
            publisher,
            queue: TriggerQueue::new(),
            options,
        }
    }

    pub fn watcher(&self) -> &Watcher<R> {
        &self.watcher
    }

    /// Watcher stage followed by a publish when the marker moved.
    pub async fn run_scheduled(&mut self) -> RunReport {
        let mut trace = RunTrace::default();
        let mut events = Vec::new();
        let outcome = match self.scheduled(&mut trace, &mut events).await {
            Ok(outcome) => outcome,
            Err(e) => {
                trace.fail();
                RunOutcome::Failed(e)
            }
        };
        RunReport {
            trace,
            events,
            outcome,
        }
    }

    /// Publish `version` without consulting the watcher or the marker.
    pub async fn run_manual(&mut self, version: ReleaseVersion) -> RunReport {
        self.run_event(ReleaseEvent::manual(version)).await
    }

    /// Publish an already decided event.
    pub async fn run_event(&mut self, event: ReleaseEvent) -> RunReport {
        let mut trace = RunTrace::default();
        let mut events = Vec::new();
        let version = event.version.clone();
        self.queue.enqueue(event);
        let outcome = match self.dispatch(&version, &mut trace, &mut events).await {
            Ok(outcome) => outcome,
            Err(e) => {
                trace.fail();
                RunOutcome::Failed(e)
            }
        };
        RunReport {
            trace,
            events,
            outcome,
        }
    }

    async fn scheduled(
        &mut self,
        trace: &mut RunTrace,
        events: &mut Vec<ReleaseEvent>,
    ) -> Result<RunOutcome, PipelineError> {
        advance(trace, RunState::Fetching)?;
        let fetched = self.watcher.check_latest().await?;
        let update = self.watcher.update_marker_if_changed(&fetched)?;

        let current = match &update {
            MarkerUpdate::Unchanged { current } => {
                advance(trace, RunState::Unchanged)?;
                advance(trace, RunState::Idle)?;
                return Ok(RunOutcome::Unchanged {
                    current: current.clone(),
                });
            }
            MarkerUpdate::Stale { current, fetched } => {
                advance(trace, RunState::Unchanged)?;
                advance(trace, RunState::Idle)?;
                return Ok(RunOutcome::Stale {
                    current: current.clone(),
                    fetched: fetched.clone(),
                });
            }
            MarkerUpdate::Changed { current, .. } => current.clone(),
        };
        advance(trace, RunState::Changed)?;

        if self.options.commit_marker {
            self.commit_marker(&update).await?;
        }

        if !self.options.publish {
            advance(trace, RunState::Idle)?;
            return Ok(RunOutcome::Recorded { version: current });
        }

        self.queue.enqueue(ReleaseEvent::scheduled(current.clone()));
        self.dispatch(&current, trace, events).await
    }

    async fn dispatch(
        &mut self,
        version: &ReleaseVersion,
        trace: &mut RunTrace,
        events: &mut Vec<ReleaseEvent>,
    ) -> Result<RunOutcome, PipelineError> {
        let mut published = None;
        for event in self.queue.drain() {
            advance(trace, RunState::Building)?;
            tracing::info!(version = %event.version, source = %event.source, "publishing");
            events.push(event.clone());
            let report = self
                .publisher
                .publish(&event.version, &self.options.platforms)
                .await?;
            advance(trace, RunState::Published)?;
            published = Some(report);
        }

        Ok(match published {
            Some(report) => RunOutcome::Published(report),
            None => RunOutcome::Recorded {
                version: version.clone(),
            },
        })
    }

    async fn commit_marker(&self, update: &MarkerUpdate) -> Result<(), MarkerWriteError> {
        let MarkerUpdate::Changed { current, .. } = update else {
            return Ok(());
        };
        let Some(path) = self.watcher.store().tracked_file() else {
            tracing::warn!("marker store is not a file, skipping commit");
            return Ok(());
        };

        let tools = self.publisher.tools();
        let release = &self.publisher.config().release;
        let message = format!("chore: track strapi {current}");

        if let Err(e) = tools.commit_file(path, &message, &release.commit_author).await {
            return Err(self.rollback(update, false, e).await);
        }
        if let Err(e) = tools.push(&release.branch).await {
            return Err(self.rollback(update, true, e).await);
        }

        tracing::info!(version = %current, branch = %release.branch, "marker committed");
        Ok(())
    }

    /// Undo a failed marker commit. Returns the error to report: `Commit`
    /// when everything was put back, `Rollback` when something was not.
    async fn rollback(
        &self,
        update: &MarkerUpdate,
        undo_commit: bool,
        commit: GitError,
    ) -> MarkerWriteError {
        let mut rollback = Vec::new();
        if undo_commit {
            if let Err(e) = self.publisher.tools().undo_last_commit().await {
                tracing::error!(error = %e, "failed to undo marker commit");
                rollback.push(RollbackFailure::Undo(e));
            }
        }
        if let Err(e) = self.watcher.restore(update) {
            tracing::error!(error = %e, "failed to restore marker");
            rollback.push(RollbackFailure::Restore(e));
        }

        if rollback.is_empty() {
            MarkerWriteError::Commit { source: commit }
        } else {
            MarkerWriteError::Rollback { commit, rollback }
        }
    }
}

fn advance(trace: &mut RunTrace, next: RunState) -> Result<(), PipelineError> {
    trace.advance(next).map_err(PipelineError::from)
}
