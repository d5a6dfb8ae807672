//! Persisted "latest known upstream release" marker.
//!
//! Every store exposes a compare-and-swap write so that a manual publish
//! racing a scheduled watcher run surfaces as [`MarkerError::Conflict`]
//! instead of silently overwriting the other run's value.

use std::path::{Path, PathBuf};

use crate::config::{MarkerBackend, MarkerConfig};
use crate::error::MarkerError;
use crate::sqlite::SqliteMarkerStore;
use crate::ReleaseVersion;

/// Result of a successful [`MarkerStore::write_if_changed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The new value was persisted.
    Written,
    /// The stored value already equals the new value; nothing was written.
    Unchanged,
}

/// Storage for the version marker.
pub trait MarkerStore: Send + Sync {
    /// Read the current marker. `None` when no marker has been recorded yet.
    fn read(&self) -> Result<Option<ReleaseVersion>, MarkerError>;

    /// Persist `new` if the stored value still equals `expected`.
    ///
    /// Returns [`MarkerError::Conflict`] when the stored value differs from
    /// `expected`, and [`CasOutcome::Unchanged`] when it already equals `new`.
    fn write_if_changed(
        &self,
        expected: Option<&ReleaseVersion>,
        new: &ReleaseVersion,
    ) -> Result<CasOutcome, MarkerError>;

    /// Human-readable location, used in logs and errors.
    fn location(&self) -> String;

    /// Path of the file to commit when the marker changes, if the store is
    /// a plain file under version control.
    fn tracked_file(&self) -> Option<&Path> {
        None
    }
}

/// Open the store selected by the `[marker]` config section.
pub fn open_store(config: &MarkerConfig) -> Result<Box<dyn MarkerStore>, MarkerError> {
    match config.backend {
        MarkerBackend::File => Ok(Box::new(FileMarkerStore::new(&config.path))),
        MarkerBackend::Sqlite => Ok(Box::new(SqliteMarkerStore::open(
            &config.path,
            &config.key,
        )?)),
    }
}

/// Marker kept as a single-line text file, e.g. `5.0.0\n`.
pub struct FileMarkerStore {
    path: PathBuf,
}

impl FileMarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write via a sibling temp file and rename, so readers never observe a
    /// partially written marker.
    fn write_atomic(&self, version: &ReleaseVersion) -> Result<(), MarkerError> {
        let write_err = |e| MarkerError::Write {
            path: self.path.clone(),
            source: e,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        std::fs::write(&tmp, format!("{version}\n")).map_err(|e| MarkerError::Write {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

impl MarkerStore for FileMarkerStore {
    fn read(&self) -> Result<Option<ReleaseVersion>, MarkerError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MarkerError::Read {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };

        let Some(line) = content.lines().next().map(str::trim).filter(|l| !l.is_empty()) else {
            return Ok(None);
        };

        ReleaseVersion::parse(line)
            .map(Some)
            .map_err(|e| MarkerError::Corrupt {
                location: self.location(),
                source: e,
            })
    }

    fn write_if_changed(
        &self,
        expected: Option<&ReleaseVersion>,
        new: &ReleaseVersion,
    ) -> Result<CasOutcome, MarkerError> {
        let current = self.read()?;

        if current.as_ref() == Some(new) {
            return Ok(CasOutcome::Unchanged);
        }

        if current.as_ref() != expected {
            return Err(MarkerError::Conflict {
                expected: expected.map(ToString::to_string),
                found: current.map(|v| v.to_string()),
            });
        }

        self.write_atomic(new)?;
        tracing::debug!(path = %self.path.display(), version = %new, "marker file written");
        Ok(CasOutcome::Written)
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }

    fn tracked_file(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn v(s: &str) -> ReleaseVersion {
        ReleaseVersion::parse(s).unwrap()
    }

    #[test]
    fn read_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileMarkerStore::new(tmp.path().join("nope.txt"));
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn read_blank_file_is_none() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("marker.txt");
        std::fs::write(&path, "\n").unwrap();
        assert!(FileMarkerStore::new(&path).read().unwrap().is_none());
    }

    #[test]
    fn read_corrupt_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("marker.txt");
        std::fs::write(&path, "not-a-version\n").unwrap();
        let err = FileMarkerStore::new(&path).read().unwrap_err();
        assert!(matches!(err, MarkerError::Corrupt { .. }));
    }

    #[test]
    fn first_write_creates_parent_dirs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("release-versions/strapi-latest.txt");
        let store = FileMarkerStore::new(&path);

        let outcome = store.write_if_changed(None, &v("5.0.0")).unwrap();

        assert_eq!(outcome, CasOutcome::Written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5.0.0\n");
        assert!(!tmp.path().join("release-versions/strapi-latest.txt.tmp").exists());
    }

    #[test]
    fn write_same_value_is_unchanged() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("marker.txt");
        std::fs::write(&path, "5.0.0\n").unwrap();
        let store = FileMarkerStore::new(&path);

        let outcome = store
            .write_if_changed(Some(&v("5.0.0")), &v("5.0.0"))
            .unwrap();

        assert_eq!(outcome, CasOutcome::Unchanged);
    }

    #[test]
    fn write_with_stale_expectation_conflicts() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("marker.txt");
        std::fs::write(&path, "5.1.0\n").unwrap();
        let store = FileMarkerStore::new(&path);

        let err = store
            .write_if_changed(Some(&v("5.0.0")), &v("5.2.0"))
            .unwrap_err();

        match err {
            MarkerError::Conflict { expected, found } => {
                assert_eq!(expected.as_deref(), Some("5.0.0"));
                assert_eq!(found.as_deref(), Some("5.1.0"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "5.1.0\n");
    }

    #[test]
    fn tracked_file_is_marker_path() {
        let store = FileMarkerStore::new("release-versions/strapi-latest.txt");
        assert_eq!(
            store.tracked_file(),
            Some(Path::new("release-versions/strapi-latest.txt"))
        );
    }
}
