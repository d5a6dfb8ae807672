//! Version watcher: compares the upstream `latest` release against the
//! marker and records changes.

use dockyard_cloud::{FetchError, UpstreamRegistry};
use dockyard_core::{CasOutcome, MarkerError, MarkerStore, ReleaseVersion};

use crate::error::MarkerWriteError;

/// What [`Watcher::update_marker_if_changed`] did to the marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerUpdate {
    /// Upstream matches the marker.
    Unchanged { current: ReleaseVersion },
    /// Upstream reports an older release than the marker; left untouched.
    Stale {
        current: ReleaseVersion,
        fetched: ReleaseVersion,
    },
    /// The marker now holds `current`.
    Changed {
        previous: Option<ReleaseVersion>,
        current: ReleaseVersion,
    },
}

impl MarkerUpdate {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed { .. })
    }
}

pub struct Watcher<R: UpstreamRegistry> {
    registry: R,
    store: Box<dyn MarkerStore>,
    package: String,
    allow_downgrade: bool,
}

impl<R: UpstreamRegistry> Watcher<R> {
    pub fn new(registry: R, store: Box<dyn MarkerStore>, package: impl Into<String>) -> Self {
        Self {
            registry,
            store,
            package: package.into(),
            allow_downgrade: false,
        }
    }

    /// Let an older upstream `latest` overwrite a newer marker.
    pub fn allow_downgrade(mut self, allow: bool) -> Self {
        self.allow_downgrade = allow;
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn store(&self) -> &dyn MarkerStore {
        self.store.as_ref()
    }

    pub async fn check_latest(&self) -> Result<ReleaseVersion, FetchError> {
        let version = self.registry.latest_version(&self.package).await?;
        tracing::info!(package = %self.package, version = %version, "fetched upstream latest");
        Ok(version)
    }

    pub fn current(&self) -> Result<Option<ReleaseVersion>, MarkerWriteError> {
        Ok(self.store.read()?)
    }

    pub fn update_marker_if_changed(
        &self,
        fetched: &ReleaseVersion,
    ) -> Result<MarkerUpdate, MarkerWriteError> {
        let previous = self.store.read()?;

        if let Some(current) = &previous {
            if current == fetched {
                tracing::info!(version = %current, "marker already up to date");
                return Ok(MarkerUpdate::Unchanged {
                    current: current.clone(),
                });
            }
            if fetched < current && !self.allow_downgrade {
                tracing::warn!(
                    marker = %current,
                    fetched = %fetched,
                    "upstream latest is older than the marker, ignoring"
                );
                return Ok(MarkerUpdate::Stale {
                    current: current.clone(),
                    fetched: fetched.clone(),
                });
            }
        }

        match self.store.write_if_changed(previous.as_ref(), fetched)? {
            CasOutcome::Written => {
                tracing::info!(
                    location = %self.store.location(),
                    version = %fetched,
                    "marker updated"
                );
                Ok(MarkerUpdate::Changed {
                    previous,
                    current: fetched.clone(),
                })
            }
            // Another writer stored the same value between our read and write.
            CasOutcome::Unchanged => Ok(MarkerUpdate::Unchanged {
                current: fetched.clone(),
            }),
        }
    }

    /// Undo a [`MarkerUpdate::Changed`]. A marker that did not exist before
    /// cannot be removed through the store and is left in place.
    pub fn restore(&self, update: &MarkerUpdate) -> Result<(), MarkerError> {
        let MarkerUpdate::Changed { previous, current } = update else {
            return Ok(());
        };

        match previous {
            Some(previous) => {
                self.store.write_if_changed(Some(current), previous)?;
                tracing::warn!(version = %previous, "marker restored");
            }
            None => {
                tracing::warn!(
                    location = %self.store.location(),
                    "no previous marker to restore, leaving {current} in place"
                );
            }
        }
        Ok(())
    }
}
