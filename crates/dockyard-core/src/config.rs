use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "dockyard.toml";

/// dockyard.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DockyardConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub marker: MarkerConfig,
    #[serde(default)]
    pub build: BuildConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// npm package to watch
    #[serde(default = "default_package")]
    pub package: String,
    /// npm registry base URL
    #[serde(default = "default_npm_registry")]
    pub registry_url: String,
    /// Accept a fetched version older than the recorded marker
    #[serde(default)]
    pub allow_downgrade: bool,
    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerBackend {
    File,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_marker_backend")]
    pub backend: MarkerBackend,
    /// Marker file, or SQLite database when `backend = "sqlite"`
    #[serde(default = "default_marker_path")]
    pub path: PathBuf,
    /// Row key inside the SQLite store
    #[serde(default = "default_marker_key")]
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Node.js major version passed as NODE_VERSION
    #[serde(default = "default_node_version")]
    pub node_version: u32,
    /// Docker build context
    #[serde(default = "default_context")]
    pub context: PathBuf,
    #[serde(default = "default_debian_dockerfile")]
    pub debian_dockerfile: PathBuf,
    #[serde(default = "default_alpine_dockerfile")]
    pub alpine_dockerfile: PathBuf,
    /// Platforms for a regular publish
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// Platforms used when multi-platform publishing is requested
    #[serde(default = "default_multi_platform")]
    pub multi_platform: Vec<String>,
    /// Additional build arguments passed to both variants
    #[serde(default)]
    pub args: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Registry host used for `docker login`
    #[serde(default = "default_registry_host")]
    pub host: String,
    /// Image repository, e.g. `naskio/strapi`
    #[serde(default = "default_repository")]
    pub repository: String,
    /// Docker Hub API base URL used for description sync
    #[serde(default = "default_hub_api_url")]
    pub hub_api_url: String,
    /// File whose contents become the repository's full description
    #[serde(default = "default_description_file")]
    pub description_file: PathBuf,
    #[serde(default = "default_short_description")]
    pub short_description: String,
    #[serde(default = "default_true")]
    pub sync_description: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseConfig {
    #[serde(default = "default_true")]
    pub create_github_release: bool,
    /// Commit and push the marker file after it changes
    #[serde(default)]
    pub commit_marker: bool,
    #[serde(default = "default_branch")]
    pub branch: String,
    #[serde(default = "default_commit_author")]
    pub commit_author: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            registry_url: default_npm_registry(),
            allow_downgrade: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            backend: default_marker_backend(),
            path: default_marker_path(),
            key: default_marker_key(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            node_version: default_node_version(),
            context: default_context(),
            debian_dockerfile: default_debian_dockerfile(),
            alpine_dockerfile: default_alpine_dockerfile(),
            platforms: default_platforms(),
            multi_platform: default_multi_platform(),
            args: BTreeMap::new(),
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: default_registry_host(),
            repository: default_repository(),
            hub_api_url: default_hub_api_url(),
            description_file: default_description_file(),
            short_description: default_short_description(),
            sync_description: true,
        }
    }
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            create_github_release: true,
            commit_marker: false,
            branch: default_branch(),
            commit_author: default_commit_author(),
        }
    }
}

impl DockyardConfig {
    /// Load from dockyard.toml in the given directory, or return defaults if not found.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        Self::load_file(&project_dir.join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit file path, or return defaults if it does not exist.
    pub fn load_file(config_path: &Path) -> crate::Result<Self> {
        let config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.to_path_buf(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.to_path_buf(),
                source: e,
            })?
        } else {
            tracing::debug!(path = %config_path.display(), "no config file, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> crate::Result<()> {
        if self.upstream.package.trim().is_empty() {
            return Err(crate::Error::InvalidConfig {
                field: "upstream.package",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.registry.repository.trim().is_empty() {
            return Err(crate::Error::InvalidConfig {
                field: "registry.repository",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.build.platforms.is_empty() {
            return Err(crate::Error::InvalidConfig {
                field: "build.platforms",
                reason: "at least one platform is required".to_owned(),
            });
        }
        if self.build.multi_platform.is_empty() {
            return Err(crate::Error::InvalidConfig {
                field: "build.multi_platform",
                reason: "at least one platform is required".to_owned(),
            });
        }
        if self.build.node_version == 0 {
            return Err(crate::Error::InvalidConfig {
                field: "build.node_version",
                reason: "must be a Node.js major version".to_owned(),
            });
        }
        if self.upstream.timeout_secs == 0 {
            return Err(crate::Error::InvalidConfig {
                field: "upstream.timeout_secs",
                reason: "must be greater than zero".to_owned(),
            });
        }
        for reserved in ["STRAPI_VERSION", "NODE_VERSION"] {
            if self.build.args.contains_key(reserved) {
                return Err(crate::Error::InvalidConfig {
                    field: "build.args",
                    reason: format!("{reserved} is set by dockyard and cannot be overridden"),
                });
            }
        }
        Ok(())
    }
}

fn default_package() -> String {
    "@strapi/strapi".to_owned()
}

fn default_npm_registry() -> String {
    "https://registry.npmjs.org".to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_marker_backend() -> MarkerBackend {
    MarkerBackend::File
}

fn default_marker_path() -> PathBuf {
    PathBuf::from("release-versions/strapi-latest.txt")
}

fn default_marker_key() -> String {
    "strapi".to_owned()
}

fn default_node_version() -> u32 {
    22
}

fn default_context() -> PathBuf {
    PathBuf::from(".")
}

fn default_debian_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile")
}

fn default_alpine_dockerfile() -> PathBuf {
    PathBuf::from("Dockerfile.alpine")
}

fn default_platforms() -> Vec<String> {
    vec!["linux/amd64".to_owned()]
}

fn default_multi_platform() -> Vec<String> {
    vec!["linux/amd64".to_owned(), "linux/arm64".to_owned()]
}

fn default_registry_host() -> String {
    "docker.io".to_owned()
}

fn default_repository() -> String {
    "naskio/strapi".to_owned()
}

fn default_hub_api_url() -> String {
    "https://hub.docker.com".to_owned()
}

fn default_description_file() -> PathBuf {
    PathBuf::from("README.md")
}

fn default_short_description() -> String {
    "Strapi, the open-source headless CMS, packaged for Docker (Debian and Alpine)".to_owned()
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_commit_author() -> String {
    "github-actions[bot] <41898282+github-actions[bot]@users.noreply.github.com>".to_owned()
}

fn default_true() -> bool {
    true
}
