//! Image publisher: builds every variant, then pushes each one's tags and
//! runs the registry/GitHub follow-ups.

use std::path::PathBuf;

use dockyard_build::{ImagePlan, Variant, plan_release};
use dockyard_cloud::{DescriptionSync, RegistryCredentials, ToolClient, ToolExecutor};
use dockyard_core::{DockyardConfig, ReleaseVersion};

use crate::error::{PublishError, PushFailure};

/// Tags one variant ended up with on the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantReport {
    pub variant: Variant,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptionStatus {
    Synced,
    Skipped(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseStatus {
    Created,
    AlreadyExists,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub version: ReleaseVersion,
    pub variants: Vec<VariantReport>,
    pub description: DescriptionStatus,
    pub release: ReleaseStatus,
}

impl PublishReport {
    /// Every pushed tag, in publish order.
    pub fn tags(&self) -> Vec<&str> {
        self.variants
            .iter()
            .flat_map(|v| v.tags.iter().map(String::as_str))
            .collect()
    }
}

pub struct Publisher<E: ToolExecutor, D: DescriptionSync> {
    tools: ToolClient<E>,
    hub: D,
    config: DockyardConfig,
    credentials: Option<RegistryCredentials>,
    root: PathBuf,
}

impl<E: ToolExecutor, D: DescriptionSync> Publisher<E, D> {
    /// `root` is the directory Dockerfiles, the build context and the
    /// description file are resolved against.
    pub fn new(
        tools: ToolClient<E>,
        hub: D,
        config: DockyardConfig,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            tools,
            hub,
            config,
            credentials: None,
            root: root.into(),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<RegistryCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn tools(&self) -> &ToolClient<E> {
        &self.tools
    }

    pub fn config(&self) -> &DockyardConfig {
        &self.config
    }

    pub async fn publish(
        &self,
        version: &ReleaseVersion,
        platforms: &[String],
    ) -> Result<PublishReport, PublishError> {
        let plans = plan_release(version, &self.config, platforms);
        for plan in &plans {
            plan.check_inputs(&self.root)?;
        }

        if let Some(credentials) = &self.credentials {
            self.tools
                .docker_login(&self.config.registry.host, credentials)
                .await
                .map_err(|e| PublishError::Login { source: e })?;
        } else {
            tracing::warn!("no registry credentials set, relying on existing docker login");
        }

        // Build phase: a failing variant stops the run before anything is pushed.
        for plan in &plans {
            tracing::info!(version = %version, variant = %plan.variant, "building image");
            self.tools
                .build_image(plan)
                .await
                .map_err(|e| PublishError::Build {
                    variant: plan.variant,
                    source: e,
                })?;
        }

        // Push phase: variants are independent of each other.
        let mut variants = Vec::with_capacity(plans.len());
        let mut failures = Vec::new();
        for plan in &plans {
            match self.push_variant(plan).await {
                Ok(tags) => variants.push(VariantReport {
                    variant: plan.variant,
                    tags,
                }),
                Err(failure) => {
                    tracing::error!(
                        variant = %failure.variant,
                        error = %failure.source,
                        "push aborted"
                    );
                    failures.push(failure);
                }
            }
        }
        if !failures.is_empty() {
            return Err(PublishError::Push { failures });
        }

        let description = self.sync_description().await?;
        let release = self.create_release(version, &variants).await?;

        tracing::info!(version = %version, "published");
        Ok(PublishReport {
            version: version.clone(),
            variants,
            description,
            release,
        })
    }

    async fn push_variant(&self, plan: &ImagePlan) -> Result<Vec<String>, PushFailure> {
        let mut pushed = Vec::new();

        if let Err(e) = self.tools.push_image(plan).await {
            return Err(PushFailure {
                variant: plan.variant,
                pushed,
                source: e,
            });
        }
        pushed.push(plan.primary_ref());

        for alias in plan.alias_refs() {
            if let Err(e) = self.tools.create_alias(plan, &alias).await {
                return Err(PushFailure {
                    variant: plan.variant,
                    pushed,
                    source: e,
                });
            }
            pushed.push(alias);
        }

        tracing::info!(variant = %plan.variant, tags = pushed.len(), "variant pushed");
        Ok(pushed)
    }

    async fn sync_description(&self) -> Result<DescriptionStatus, PublishError> {
        let registry = &self.config.registry;
        if !registry.sync_description {
            return Ok(DescriptionStatus::Skipped("disabled"));
        }
        let Some(credentials) = &self.credentials else {
            tracing::warn!("skipping description sync, no registry credentials");
            return Ok(DescriptionStatus::Skipped("no credentials"));
        };

        let path = self.root.join(&registry.description_file);
        let full = std::fs::read_to_string(&path)
            .map_err(|e| PublishError::ReadDescription { path, source: e })?;

        self.hub
            .sync_description(
                credentials,
                &registry.repository,
                &registry.short_description,
                &full,
            )
            .await
            .map_err(|e| PublishError::Description { source: e })?;

        Ok(DescriptionStatus::Synced)
    }

    async fn create_release(
        &self,
        version: &ReleaseVersion,
        variants: &[VariantReport],
    ) -> Result<ReleaseStatus, PublishError> {
        if !self.config.release.create_github_release {
            return Ok(ReleaseStatus::Disabled);
        }

        let created = self
            .tools
            .ensure_release(
                version.as_str(),
                &format!("Strapi {version}"),
                &release_notes(version, variants),
                version.is_prerelease(),
            )
            .await
            .map_err(|e| PublishError::Release { source: e })?;

        Ok(if created {
            ReleaseStatus::Created
        } else {
            ReleaseStatus::AlreadyExists
        })
    }
}

fn release_notes(version: &ReleaseVersion, variants: &[VariantReport]) -> String {
    let mut lines = vec![format!("Docker images for Strapi {version}:"), String::new()];
    for report in variants {
        lines.extend(report.tags.iter().map(|tag| format!("- `{tag}`")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_notes_list_every_tag() {
        let version = ReleaseVersion::parse("5.1.0").unwrap();
        let variants = vec![
            VariantReport {
                variant: Variant::Debian,
                tags: vec!["naskio/strapi:5.1.0".into(), "naskio/strapi:latest".into()],
            },
            VariantReport {
                variant: Variant::Alpine,
                tags: vec!["naskio/strapi:5.1.0-alpine".into()],
            },
        ];

        let notes = release_notes(&version, &variants);

        assert!(notes.starts_with("Docker images for Strapi 5.1.0:"));
        assert!(notes.contains("- `naskio/strapi:latest`"));
        assert!(notes.contains("- `naskio/strapi:5.1.0-alpine`"));
    }

    #[test]
    fn report_tags_flatten_in_order() {
        let report = PublishReport {
            version: ReleaseVersion::parse("5.1.0").unwrap(),
            variants: vec![
                VariantReport {
                    variant: Variant::Debian,
                    tags: vec!["a".into(), "b".into()],
                },
                VariantReport {
                    variant: Variant::Alpine,
                    tags: vec!["c".into()],
                },
            ],
            description: DescriptionStatus::Skipped("disabled"),
            release: ReleaseStatus::Disabled,
        };

        assert_eq!(report.tags(), vec!["a", "b", "c"]);
    }
}
