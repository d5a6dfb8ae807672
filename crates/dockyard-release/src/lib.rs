//! Release detection and publishing for dockyard.
//!
//! A run is either scheduled (the [`Watcher`] compares the upstream `latest`
//! release with the marker and queues a [`ReleaseEvent`] when it moved) or
//! manual (an operator queues an event for an explicit version). Either way
//! the [`Pipeline`] hands each queued event to the [`Publisher`].
//!
//! [`ReleaseEvent`]: dockyard_core::ReleaseEvent

pub mod error;
pub mod pipeline;
pub mod publisher;
pub mod watcher;

pub use error::{MarkerWriteError, PipelineError, PublishError, PushFailure, RollbackFailure};
pub use pipeline::{
    InvalidTransition, Pipeline, RunOptions, RunOutcome, RunReport, RunState, RunTrace,
    TriggerQueue,
};
pub use publisher::{DescriptionStatus, PublishReport, Publisher, ReleaseStatus, VariantReport};
pub use watcher::{MarkerUpdate, Watcher};
