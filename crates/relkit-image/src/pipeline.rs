use std::path::Path;

use secrecy::{ExposeSecret, SecretString};

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};

const GHCR: &str = "ghcr.io";
const QEMU_IMAGE: &str = "multiarch/qemu-user-static";

/// A registry namespace images are pushed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryTarget {
    /// Registry host for `docker login`; None means Docker Hub.
    pub registry: Option<String>,
    /// Reference prefix, e.g. `acme` or `ghcr.io/acme`.
    pub prefix: String,
}

impl RegistryTarget {
    pub fn docker_hub(username: &str) -> Self {
        Self {
            registry: None,
            prefix: username.to_owned(),
        }
    }

    /// ghcr.io namespaces must be lowercase.
    pub fn ghcr(owner: &str) -> Self {
        Self {
            registry: Some(GHCR.to_owned()),
            prefix: format!("{GHCR}/{}", owner.to_lowercase()),
        }
    }

    pub fn reference(&self, image: &str, tag: &str) -> String {
        format!("{}/{image}:{tag}", self.prefix)
    }
}

/// Every `target × tag` reference, grouped by target in the given order.
pub fn image_references(image: &str, tags: &[String], targets: &[RegistryTarget]) -> Vec<String> {
    targets
        .iter()
        .flat_map(|target| tags.iter().map(move |tag| target.reference(image, tag)))
        .collect()
}

/// OCI annotations attached to every build.
pub fn oci_labels(title: &str, version: &str, source: &str) -> Vec<(String, String)> {
    [
        ("org.opencontainers.image.title", title),
        ("org.opencontainers.image.version", version),
        ("org.opencontainers.image.source", source),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_owned(), v.to_owned()))
    .collect()
}

/// Inputs of a multi-platform `buildx build --push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    pub context: String,
    pub platforms: Vec<String>,
    pub references: Vec<String>,
    pub labels: Vec<(String, String)>,
}

impl BuildRequest {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "buildx".to_owned(),
            "build".to_owned(),
            "--platform".to_owned(),
            self.platforms.join(","),
            "--push".to_owned(),
        ];
        for reference in &self.references {
            args.push("-t".to_owned());
            args.push(reference.clone());
        }
        for (key, value) in &self.labels {
            args.push("--label".to_owned());
            args.push(format!("{key}={value}"));
        }
        args.push(self.context.clone());
        args
    }
}

/// Docker operations of the build pipeline, parameterized over the executor.
pub struct ImagePipeline<E: DockerExecutor = RealExecutor> {
    executor: E,
}

impl ImagePipeline<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor::new(),
        }
    }
}

impl Default for ImagePipeline<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: DockerExecutor> ImagePipeline<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    /// Create a buildx builder and register QEMU for foreign platforms.
    pub async fn setup_builder(&self) -> Result<(), PipelineError> {
        self.executor
            .exec(&args(["buildx", "create", "--use"]))
            .await
            .map_err(|e| PipelineError::Setup { source: e })?;

        self.executor
            .exec(&args([
                "run",
                "--rm",
                "--privileged",
                QEMU_IMAGE,
                "--reset",
                "-p",
                "yes",
            ]))
            .await
            .map_err(|e| PipelineError::Setup { source: e })?;

        Ok(())
    }

    /// `docker login`, with the password passed on stdin.
    pub async fn login(
        &self,
        registry: Option<&str>,
        username: &str,
        password: &SecretString,
    ) -> Result<(), PipelineError> {
        let mut cmd = vec!["login".to_owned()];
        if let Some(registry) = registry {
            cmd.push(registry.to_owned());
        }
        cmd.extend(args(["-u", username, "--password-stdin"]));

        self.executor
            .exec_with_stdin(&cmd, password.expose_secret().as_bytes())
            .await
            .map_err(|e| PipelineError::Login {
                registry: registry.unwrap_or("docker.io").to_owned(),
                source: e,
            })?;

        tracing::info!(registry = registry.unwrap_or("docker.io"), %username, "logged in");
        Ok(())
    }

    pub async fn build_and_push(&self, request: &BuildRequest) -> Result<(), PipelineError> {
        if request.references.is_empty() {
            return Err(PipelineError::NoReferences);
        }
        if request.platforms.is_empty() {
            return Err(PipelineError::NoPlatforms);
        }

        self.executor
            .exec_streaming(&request.to_args())
            .await
            .map_err(|e| PipelineError::Build { source: e })?;

        tracing::info!(
            references = request.references.len(),
            platforms = %request.platforms.join(","),
            "image pushed"
        );
        Ok(())
    }

    pub async fn pull(&self, image: &str) -> Result<(), PipelineError> {
        self.executor
            .exec_streaming(&args(["pull", image]))
            .await
            .map_err(|e| PipelineError::Pull { source: e })
    }

    /// `docker save` the image into a tarball.
    pub async fn save(&self, image: &str, output: &Path) -> Result<(), PipelineError> {
        let output_str = output
            .to_str()
            .ok_or_else(|| PipelineError::InvalidPath(output.to_path_buf()))?;

        self.executor
            .exec(&args(["save", image, "-o", output_str]))
            .await
            .map_err(|e| PipelineError::Save { source: e })?;

        Ok(())
    }
}

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("failed to set up buildx builder")]
    Setup { source: DockerError },

    #[error("docker login to {registry} failed")]
    Login {
        registry: String,
        source: DockerError,
    },

    #[error("no image references to push")]
    NoReferences,

    #[error("no target platforms configured")]
    NoPlatforms,

    #[error("docker buildx build failed")]
    Build { source: DockerError },

    #[error("docker pull failed")]
    Pull { source: DockerError },

    #[error("docker save failed")]
    Save { source: DockerError },

    #[error("output path is not valid UTF-8: {0}")]
    InvalidPath(std::path::PathBuf),
}
