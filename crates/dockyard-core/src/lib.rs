//! Core types and configuration for dockyard.
//!
//! This crate defines the `dockyard.toml` schema ([`DockyardConfig`]),
//! validated release versions ([`ReleaseVersion`]), the publish trigger
//! event ([`ReleaseEvent`]), and the version marker stores
//! ([`FileMarkerStore`], [`SqliteMarkerStore`]).

pub mod config;
pub mod error;
pub mod event;
pub mod marker;
pub mod sqlite;
pub mod version;

pub use config::{
    BuildConfig, CONFIG_FILE_NAME, DockyardConfig, MarkerBackend, MarkerConfig, RegistryConfig,
    ReleaseConfig, UpstreamConfig,
};
pub use error::{Error, MarkerError, Result};
pub use event::{ReleaseEvent, TriggerSource};
pub use marker::{CasOutcome, FileMarkerStore, MarkerStore, open_store};
pub use sqlite::SqliteMarkerStore;
pub use version::ReleaseVersion;
