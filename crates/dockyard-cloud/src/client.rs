use std::fmt;
use std::path::Path;

use dockyard_build::ImagePlan;
use secrecy::ExposeSecret;

use crate::credentials::RegistryCredentials;
use crate::executor::{RealExecutor, ToolExecutor};
use crate::tool::{Tool, ToolError};

/// docker / git / gh operations, parameterized over the executor for testability.
pub struct ToolClient<E: ToolExecutor = RealExecutor> {
    executor: E,
}

impl ToolClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for ToolClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: ToolExecutor> ToolClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    // ── Doctor ──

    /// Run all diagnostic checks without early return.
    /// Returns a report with pass/fail for each check item.
    pub async fn doctor(&self) -> DoctorReport {
        let mut report = DoctorReport::default();

        // 1. docker CLI
        match self
            .executor
            .exec(
                Tool::Docker,
                &args(["version", "--format", "{{.Client.Version}}"]),
            )
            .await
        {
            Ok(v) => report.docker = CheckResult::ok(v.trim()),
            Err(e) => report.docker = CheckResult::fail(&e.to_string()),
        }

        // 2. buildx plugin ("github.com/docker/buildx v0.17.1 abc123")
        match self
            .executor
            .exec(Tool::Docker, &args(["buildx", "version"]))
            .await
        {
            Ok(v) => {
                // arch-lint: allow(no-silent-result-drop) reason="unrecognised version output is shown as-is"
                let version = v.split_whitespace().nth(1).unwrap_or(v.trim());
                report.buildx = CheckResult::ok(version);
            }
            Err(_) => report.buildx = CheckResult::fail("docker buildx not available"),
        }

        // 3. git ("git version 2.47.0")
        match self.executor.exec(Tool::Git, &args(["--version"])).await {
            Ok(v) => {
                // arch-lint: allow(no-silent-result-drop) reason="unrecognised version output is shown as-is"
                let version = v.trim().strip_prefix("git version ").unwrap_or(v.trim());
                report.git = CheckResult::ok(version);
            }
            Err(e) => report.git = CheckResult::fail(&e.to_string()),
        }

        // 4. gh ("gh version 2.62.0 (2024-11-14)")
        match self.executor.exec(Tool::Gh, &args(["--version"])).await {
            Ok(v) => {
                let version = v
                    .lines()
                    .next()
                    .and_then(|line| line.strip_prefix("gh version "))
                    .and_then(|rest| rest.split_whitespace().next())
                    // arch-lint: allow(no-silent-result-drop) reason="unrecognised version output is shown as-is"
                    .unwrap_or(v.trim());
                report.gh = CheckResult::ok(version);
            }
            Err(e) => report.gh = CheckResult::fail(&e.to_string()),
        }

        report
    }

    // ── Docker ──

    /// Log in to the registry, passing the token on stdin.
    pub async fn docker_login(
        &self,
        host: &str,
        credentials: &RegistryCredentials,
    ) -> Result<(), DockerError> {
        self.executor
            .exec_with_stdin(
                Tool::Docker,
                &args([
                    "login",
                    "--username",
                    &credentials.username,
                    "--password-stdin",
                    host,
                ]),
                credentials.token.expose_secret().as_bytes(),
            )
            .await
            .map_err(|e| DockerError::Login {
                host: host.to_owned(),
                source: e,
            })?;

        Ok(())
    }

    /// Build a variant into the buildx cache without pushing.
    pub async fn build_image(&self, plan: &ImagePlan) -> Result<(), DockerError> {
        self.executor
            .exec_streaming(Tool::Docker, &plan.buildx_args(false))
            .await
            .map_err(|e| DockerError::Build {
                image: plan.primary_ref(),
                source: e,
            })
    }

    /// Push the primary (versioned) tag. Layers come from the build cache.
    pub async fn push_image(&self, plan: &ImagePlan) -> Result<(), DockerError> {
        self.executor
            .exec_streaming(Tool::Docker, &plan.buildx_args(true))
            .await
            .map_err(|e| DockerError::Push {
                image: plan.primary_ref(),
                source: e,
            })
    }

    /// Point `alias` at the pushed primary reference.
    pub async fn create_alias(&self, plan: &ImagePlan, alias: &str) -> Result<(), DockerError> {
        self.executor
            .exec(Tool::Docker, &plan.alias_args(alias))
            .await
            .map_err(|e| DockerError::Push {
                image: alias.to_owned(),
                source: e,
            })?;

        Ok(())
    }

    // ── Git ──

    /// Stage and commit a single file as `author` ("Name <email>").
    pub async fn commit_file(
        &self,
        path: &Path,
        message: &str,
        author: &str,
    ) -> Result<(), GitError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| GitError::InvalidPath(path.to_path_buf()))?;
        let (name, email) = parse_author(author)?;

        self.executor
            .exec(Tool::Git, &args(["add", "--", path_str]))
            .await
            .map_err(|e| GitError::Add { source: e })?;

        let name_cfg = format!("user.name={name}");
        let email_cfg = format!("user.email={email}");
        self.executor
            .exec(
                Tool::Git,
                &args([
                    "-c", &name_cfg, "-c", &email_cfg, "commit", "-m", message, "--", path_str,
                ]),
            )
            .await
            .map_err(|e| GitError::Commit { source: e })?;

        Ok(())
    }

    pub async fn push(&self, branch: &str) -> Result<(), GitError> {
        let refspec = format!("HEAD:{branch}");
        self.executor
            .exec(Tool::Git, &args(["push", "origin", &refspec]))
            .await
            .map_err(|e| GitError::Push {
                branch: branch.to_owned(),
                source: e,
            })?;

        Ok(())
    }

    /// Drop the last local commit, keeping the working tree.
    pub async fn undo_last_commit(&self) -> Result<(), GitError> {
        self.executor
            .exec(Tool::Git, &args(["reset", "--mixed", "HEAD~1"]))
            .await
            .map_err(|e| GitError::Reset { source: e })?;

        Ok(())
    }

    // ── GitHub ──

    pub async fn release_exists(&self, tag: &str) -> bool {
        self.executor
            .exec(Tool::Gh, &args(["release", "view", tag, "--json", "tagName"]))
            .await
            .is_ok()
    }

    /// Create a GitHub release for `tag`. Returns `false` when a release for
    /// the tag already exists.
    pub async fn ensure_release(
        &self,
        tag: &str,
        title: &str,
        notes: &str,
        prerelease: bool,
    ) -> Result<bool, GithubError> {
        if self.release_exists(tag).await {
            tracing::info!(tag, "github release already exists");
            return Ok(false);
        }

        let mut cmd = args([
            "release", "create", tag, "--title", title, "--notes", notes,
        ]);
        if prerelease {
            cmd.push("--prerelease".to_owned());
        } else {
            cmd.push("--latest".to_owned());
        }

        self.executor
            .exec(Tool::Gh, &cmd)
            .await
            .map_err(|e| GithubError::CreateRelease {
                tag: tag.to_owned(),
                source: e,
            })?;

        Ok(true)
    }
}

// ── Helper ──

fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

/// Split "Name <email>" into its parts.
fn parse_author(author: &str) -> Result<(&str, &str), GitError> {
    let invalid = || GitError::InvalidAuthor(author.to_owned());

    let (name, rest) = author.split_once('<').ok_or_else(invalid)?;
    let email = rest.strip_suffix('>').ok_or_else(invalid)?;
    let (name, email) = (name.trim(), email.trim());

    if name.is_empty() || email.is_empty() {
        return Err(invalid());
    }
    Ok((name, email))
}

// ── Doctor types ──

#[derive(Debug, Default)]
pub struct DoctorReport {
    pub docker: CheckResult,
    pub buildx: CheckResult,
    pub git: CheckResult,
    pub gh: CheckResult,
    pub config_file: CheckResult,
    pub credentials: CheckResult,
}

impl DoctorReport {
    /// `gh` and credentials are only needed for releases and description
    /// sync, so they are reported but do not fail the run.
    pub fn all_passed(&self) -> bool {
        self.docker.passed && self.buildx.passed && self.git.passed && self.config_file.passed
    }
}

impl fmt::Display for DoctorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = [
            ("docker", &self.docker),
            ("buildx", &self.buildx),
            ("git", &self.git),
            ("gh", &self.gh),
            ("dockyard.toml", &self.config_file),
            ("credentials", &self.credentials),
        ];
        for (label, result) in rows {
            writeln!(f, "  [{}] {label:<14} {}", result.icon(), result.detail)?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub detail: String,
}

impl CheckResult {
    pub fn ok(detail: &str) -> Self {
        Self {
            passed: true,
            detail: detail.to_owned(),
        }
    }

    pub fn fail(detail: &str) -> Self {
        Self {
            passed: false,
            detail: detail.to_owned(),
        }
    }

    pub fn icon(&self) -> &'static str {
        if self.passed { "OK" } else { "NG" }
    }
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum DockerError {
    #[error("docker login to {host} failed")]
    Login { host: String, source: ToolError },

    #[error("build of {image} failed")]
    Build { image: String, source: ToolError },

    #[error("push of {image} failed")]
    Push { image: String, source: ToolError },
}

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("invalid commit author {0:?}, expected \"Name <email>\"")]
    InvalidAuthor(String),

    #[error("git add failed")]
    Add { source: ToolError },

    #[error("git commit failed")]
    Commit { source: ToolError },

    #[error("git push to {branch} failed")]
    Push { branch: String, source: ToolError },

    #[error("git reset failed")]
    Reset { source: ToolError },
}

#[derive(Debug, thiserror::Error)]
pub enum GithubError {
    #[error("failed to create GitHub release {tag}")]
    CreateRelease { tag: String, source: ToolError },
}
