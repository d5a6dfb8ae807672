use std::fmt;
use std::path::Path;

use dockyard_core::{BuildConfig, ReleaseVersion};

/// Image flavor built from the same upstream version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Debian,
    Alpine,
}

impl Variant {
    /// All variants, in publish order.
    pub const ALL: [Variant; 2] = [Variant::Debian, Variant::Alpine];

    pub fn name(self) -> &'static str {
        match self {
            Self::Debian => "debian",
            Self::Alpine => "alpine",
        }
    }

    /// Tag suffix appended to both the version and the `latest` tag.
    pub fn tag_suffix(self) -> &'static str {
        match self {
            Self::Debian => "",
            Self::Alpine => "-alpine",
        }
    }

    /// Versioned tag, e.g. `5.1.0` or `5.1.0-alpine`.
    pub fn version_tag(self, version: &ReleaseVersion) -> String {
        format!("{version}{}", self.tag_suffix())
    }

    /// Floating tag, e.g. `latest` or `latest-alpine`.
    pub fn latest_tag(self) -> String {
        format!("latest{}", self.tag_suffix())
    }

    pub fn dockerfile(self, config: &BuildConfig) -> &Path {
        match self {
            Self::Debian => &config.debian_dockerfile,
            Self::Alpine => &config.alpine_dockerfile,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
