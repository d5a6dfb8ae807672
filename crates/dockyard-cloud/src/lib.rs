pub mod client;
pub mod credentials;
pub mod executor;
pub mod hub;
pub mod npm;
pub mod tool;

pub use client::{CheckResult, DockerError, DoctorReport, GitError, GithubError, ToolClient};
pub use credentials::{REGISTRY_TOKEN_ENV, REGISTRY_USERNAME_ENV, RegistryCredentials};
pub use executor::{RealExecutor, ToolExecutor};
pub use hub::{DescriptionSync, HubClient, HubError};
pub use npm::{DEFAULT_NPM_REGISTRY, FetchError, NpmRegistry, UpstreamRegistry};
pub use tool::{Tool, ToolError};
