use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("invalid version {input:?}: {reason}")]
    InvalidVersion { input: String, reason: String },
}

/// Failures reading or writing the version marker.
#[derive(Debug, thiserror::Error)]
pub enum MarkerError {
    #[error("failed to read marker at {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write marker at {path}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("marker at {location} holds an invalid version")]
    Corrupt { location: String, source: Error },

    #[error("marker database error")]
    Database(#[from] rusqlite::Error),

    #[error("marker database lock poisoned")]
    LockPoisoned,

    #[error(
        "marker changed concurrently: expected {}, found {}",
        display_marker(expected),
        display_marker(found)
    )]
    Conflict {
        expected: Option<String>,
        found: Option<String>,
    },
}

fn display_marker(value: &Option<String>) -> &str {
    match value {
        Some(v) => v,
        None => "(none)",
    }
}
