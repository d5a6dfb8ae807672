use std::path::{Path, PathBuf};

use dockyard_core::{DockyardConfig, RegistryConfig, ReleaseVersion};

use crate::variant::Variant;

/// Build argument carrying the upstream release version.
pub const STRAPI_VERSION_ARG: &str = "STRAPI_VERSION";
/// Build argument carrying the Node.js major version.
pub const NODE_VERSION_ARG: &str = "NODE_VERSION";

/// Everything needed to build and tag one variant of one release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlan {
    pub variant: Variant,
    pub version: ReleaseVersion,
    /// Image name without tag, e.g. `naskio/strapi` or `ghcr.io/acme/strapi`
    pub image: String,
    pub dockerfile: PathBuf,
    pub context: PathBuf,
    pub platforms: Vec<String>,
    /// Ordered build args; `STRAPI_VERSION` and `NODE_VERSION` come first.
    pub build_args: Vec<(String, String)>,
}

/// Plan every variant of `version`, in publish order.
pub fn plan_release(
    version: &ReleaseVersion,
    config: &DockyardConfig,
    platforms: &[String],
) -> Vec<ImagePlan> {
    Variant::ALL
        .iter()
        .map(|variant| ImagePlan::new(*variant, version, config, platforms))
        .collect()
}

/// Image name for the configured registry. Docker Hub images are referenced
/// without a host prefix.
pub fn image_name(registry: &RegistryConfig) -> String {
    let host = registry.host.trim_end_matches('/');
    if host.is_empty() || host == "docker.io" || host == "index.docker.io" {
        registry.repository.clone()
    } else {
        format!("{host}/{repo}", repo = registry.repository)
    }
}

impl ImagePlan {
    pub fn new(
        variant: Variant,
        version: &ReleaseVersion,
        config: &DockyardConfig,
        platforms: &[String],
    ) -> Self {
        let mut build_args = vec![
            (STRAPI_VERSION_ARG.to_owned(), version.as_str().to_owned()),
            (
                NODE_VERSION_ARG.to_owned(),
                config.build.node_version.to_string(),
            ),
        ];
        build_args.extend(
            config
                .build
                .args
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        Self {
            variant,
            version: version.clone(),
            image: image_name(&config.registry),
            dockerfile: variant.dockerfile(&config.build).to_path_buf(),
            context: config.build.context.clone(),
            platforms: platforms.to_vec(),
            build_args,
        }
    }

    pub fn image_ref(&self, tag: &str) -> String {
        format!("{image}:{tag}", image = self.image)
    }

    /// The versioned reference pushed by the build; aliases point at it.
    pub fn primary_ref(&self) -> String {
        self.image_ref(&self.variant.version_tag(&self.version))
    }

    pub fn alias_refs(&self) -> Vec<String> {
        vec![self.image_ref(&self.variant.latest_tag())]
    }

    /// Primary reference first, then aliases.
    pub fn all_refs(&self) -> Vec<String> {
        let mut refs = vec![self.primary_ref()];
        refs.extend(self.alias_refs());
        refs
    }

    pub fn build_arg(&self, name: &str) -> Option<&str> {
        self.build_args
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Arguments for `docker buildx build`.
    ///
    /// Without `push` the result stays in the build cache, so the pushing
    /// invocation afterwards reuses every layer.
    pub fn buildx_args(&self, push: bool) -> Vec<String> {
        let mut args = vec![
            "buildx".to_owned(),
            "build".to_owned(),
            "--platform".to_owned(),
            self.platforms.join(","),
            "--file".to_owned(),
            self.dockerfile.display().to_string(),
        ];

        for (name, value) in &self.build_args {
            args.push("--build-arg".to_owned());
            args.push(format!("{name}={value}"));
        }

        args.push("--tag".to_owned());
        args.push(self.primary_ref());

        if push {
            args.push("--push".to_owned());
        }

        args.push(self.context.display().to_string());
        args
    }

    /// Arguments for `docker buildx imagetools create` pointing `alias` at
    /// the primary reference, across all pushed platforms.
    pub fn alias_args(&self, alias: &str) -> Vec<String> {
        vec![
            "buildx".to_owned(),
            "imagetools".to_owned(),
            "create".to_owned(),
            "--tag".to_owned(),
            alias.to_owned(),
            self.primary_ref(),
        ]
    }

    /// Check that the Dockerfile and build context exist, relative to `root`.
    pub fn check_inputs(&self, root: &Path) -> Result<(), PlanError> {
        let dockerfile = root.join(&self.dockerfile);
        if !dockerfile.is_file() {
            return Err(PlanError::MissingDockerfile {
                variant: self.variant,
                path: dockerfile,
            });
        }

        let context = root.join(&self.context);
        if !context.is_dir() {
            return Err(PlanError::MissingContext { path: context });
        }

        Ok(())
    }

    /// Human-readable summary of the plan.
    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("[{}]", self.variant),
            format!("  dockerfile: {}", self.dockerfile.display()),
            format!("  platforms:  {}", self.platforms.join(", ")),
        ];
        lines.extend(
            self.build_args
                .iter()
                .map(|(name, value)| format!("  build-arg:  {name}={value}")),
        );
        lines.extend(
            self.all_refs()
                .iter()
                .map(|image_ref| format!("  tag:        {image_ref}")),
        );
        lines.join("\n") + "\n"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("{variant} Dockerfile not found at {path}")]
    MissingDockerfile { variant: Variant, path: PathBuf },

    #[error("build context not found at {path}")]
    MissingContext { path: PathBuf },
}
