use std::fmt;

use crate::ReleaseVersion;

/// What caused a publish to be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// The watcher recorded a new upstream release.
    Scheduled,
    /// An operator supplied the version explicitly.
    Manual,
}

impl fmt::Display for TriggerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => f.write_str("scheduled"),
            Self::Manual => f.write_str("manual"),
        }
    }
}

/// A request to publish images for one version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseEvent {
    pub version: ReleaseVersion,
    pub source: TriggerSource,
}

impl ReleaseEvent {
    pub fn scheduled(version: ReleaseVersion) -> Self {
        Self {
            version,
            source: TriggerSource::Scheduled,
        }
    }

    pub fn manual(version: ReleaseVersion) -> Self {
        Self {
            version,
            source: TriggerSource::Manual,
        }
    }
}
