//! npm registry lookups for the watched upstream package.

use std::time::Duration;

use dockyard_core::ReleaseVersion;
use serde::Deserialize;

/// Default base URL for npm registry
pub const DEFAULT_NPM_REGISTRY: &str = "https://registry.npmjs.org";

/// Source of the latest published upstream version.
#[allow(async_fn_in_trait)]
pub trait UpstreamRegistry: Send + Sync {
    /// Fetch the version currently tagged `latest` for `package`.
    async fn latest_version(&self, package: &str) -> Result<ReleaseVersion, FetchError>;
}

/// Response from `GET /{package}/latest`
#[derive(Debug, Deserialize)]
struct LatestManifest {
    version: String,
}

/// [`UpstreamRegistry`] backed by the npm registry HTTP API.
pub struct NpmRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl NpmRegistry {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dockyard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Client { source: e })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Encode package name for URL (handles scoped packages)
    fn encode_package_name(package: &str) -> String {
        if package.starts_with('@') {
            // Scoped package: @scope/name -> @scope%2Fname
            package.replace('/', "%2F")
        } else {
            package.to_owned()
        }
    }
}

impl UpstreamRegistry for NpmRegistry {
    async fn latest_version(&self, package: &str) -> Result<ReleaseVersion, FetchError> {
        let url = format!(
            "{}/{}/latest",
            self.base_url,
            Self::encode_package_name(package)
        );
        tracing::debug!(%url, "fetching latest version");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound(package.to_owned()));
        }
        if !status.is_success() {
            tracing::warn!(%status, %url, "npm registry returned an error status");
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let manifest: LatestManifest =
            response
                .json()
                .await
                .map_err(|e| FetchError::InvalidResponse {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;

        ReleaseVersion::parse(&manifest.version).map_err(|e| FetchError::InvalidVersion {
            package: package.to_owned(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("failed to build HTTP client")]
    Client { source: reqwest::Error },

    #[error("request to {url} failed")]
    Network { url: String, source: reqwest::Error },

    #[error("package not found on registry: {0}")]
    NotFound(String),

    #[error("registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("unparsable registry response from {url}: {detail}")]
    InvalidResponse { url: String, detail: String },

    #[error("registry published an invalid version for {package}")]
    InvalidVersion {
        package: String,
        source: dockyard_core::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_scoped_package() {
        assert_eq!(
            NpmRegistry::encode_package_name("@strapi/strapi"),
            "@strapi%2Fstrapi"
        );
    }

    #[test]
    fn encode_unscoped_package() {
        assert_eq!(NpmRegistry::encode_package_name("strapi"), "strapi");
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let registry = NpmRegistry::new("https://registry.npmjs.org/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(registry.base_url, "https://registry.npmjs.org");
    }
}
