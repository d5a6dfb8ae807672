use secrecy::SecretString;

/// Environment variable holding the registry user name.
pub const REGISTRY_USERNAME_ENV: &str = "DOCKERHUB_USERNAME";
/// Environment variable holding the registry access token.
pub const REGISTRY_TOKEN_ENV: &str = "DOCKERHUB_TOKEN";

/// Registry login, passed through to `docker login` and the Docker Hub API.
#[derive(Clone)]
pub struct RegistryCredentials {
    pub username: String,
    pub token: SecretString,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

impl RegistryCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: SecretString::from(token.into()),
        }
    }

    /// Read credentials from the environment. `None` unless both variables
    /// are set and non-empty.
    pub fn from_env() -> Option<Self> {
        // arch-lint: allow(no-silent-result-drop) reason="unset variables mean anonymous access"
        let username = std::env::var(REGISTRY_USERNAME_ENV).ok()?;
        // arch-lint: allow(no-silent-result-drop) reason="unset variables mean anonymous access"
        let token = std::env::var(REGISTRY_TOKEN_ENV).ok()?;
        if username.trim().is_empty() || token.trim().is_empty() {
            return None;
        }
        Some(Self::new(username.trim(), token.trim()))
    }
}
