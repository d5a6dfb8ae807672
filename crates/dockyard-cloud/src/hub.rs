//! Docker Hub repository description sync.

use std::time::Duration;

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::credentials::RegistryCredentials;

/// Docker Hub caps the short description at 100 characters.
pub const SHORT_DESCRIPTION_MAX: usize = 100;

/// Pushes the repository description shown on the registry listing.
#[allow(async_fn_in_trait)]
pub trait DescriptionSync: Send + Sync {
    async fn sync_description(
        &self,
        credentials: &RegistryCredentials,
        repository: &str,
        short_description: &str,
        full_description: &str,
    ) -> Result<(), HubError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct DescriptionPatch<'a> {
    description: &'a str,
    full_description: &'a str,
}

/// [`DescriptionSync`] backed by the Docker Hub HTTP API.
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, HubError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dockyard/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| HubError::Client { source: e })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    async fn login(&self, credentials: &RegistryCredentials) -> Result<String, HubError> {
        let url = format!("{}/v2/users/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: credentials.token.expose_secret(),
            })
            .send()
            .await
            .map_err(|e| HubError::Network { source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Login {
                status: status.as_u16(),
            });
        }

        let body: LoginResponse = response
            .json()
            .await
            .map_err(|e| HubError::InvalidResponse {
                detail: e.to_string(),
            })?;
        Ok(body.token)
    }
}

impl DescriptionSync for HubClient {
    async fn sync_description(
        &self,
        credentials: &RegistryCredentials,
        repository: &str,
        short_description: &str,
        full_description: &str,
    ) -> Result<(), HubError> {
        let token = self.login(credentials).await?;
        let short = truncate_chars(short_description, SHORT_DESCRIPTION_MAX);

        let url = format!("{}/v2/repositories/{repository}/", self.base_url);
        let response = self
            .client
            .patch(&url)
            .bearer_auth(token)
            .json(&DescriptionPatch {
                description: short,
                full_description,
            })
            .send()
            .await
            .map_err(|e| HubError::Network { source: e })?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => format!("(unreadable body: {e})"),
            };
            return Err(HubError::Update {
                repository: repository.to_owned(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(repository, "registry description updated");
        Ok(())
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("failed to build HTTP client")]
    Client { source: reqwest::Error },

    #[error("Docker Hub request failed")]
    Network { source: reqwest::Error },

    #[error("Docker Hub login rejected (HTTP {status}) — check DOCKERHUB_USERNAME / DOCKERHUB_TOKEN")]
    Login { status: u16 },

    #[error("Docker Hub rejected description update for {repository} (HTTP {status}): {body}")]
    Update {
        repository: String,
        status: u16,
        body: String,
    },

    #[error("unparsable Docker Hub response: {detail}")]
    InvalidResponse { detail: String },
}
