use std::path::{Path, PathBuf};

use relkit_core::SbomConfig;

use crate::docker::DockerError;
use crate::executor::{DockerExecutor, RealExecutor};

const DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Runs the SBOM/vulnerability scanner container against a pushed image.
pub struct SbomScanner<E: DockerExecutor = RealExecutor> {
    executor: E,
    config: SbomConfig,
}

impl SbomScanner<RealExecutor> {
    pub fn new(config: SbomConfig) -> Self {
        Self::with_executor(RealExecutor::new(), config)
    }
}

impl<E: DockerExecutor> SbomScanner<E> {
    pub fn with_executor(executor: E, config: SbomConfig) -> Self {
        Self { executor, config }
    }

    /// Scan `image` and return the report files found in `output_dir`.
    ///
    /// `docker_config` is mounted read-only so the scanner can pull private
    /// images with the caller's credentials.
    pub async fn generate(
        &self,
        image: &str,
        output_dir: &Path,
        docker_config: Option<&Path>,
    ) -> Result<Vec<PathBuf>, SbomError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| SbomError::OutputDir {
                path: output_dir.to_path_buf(),
                source: e,
            })?;

        let output_dir = std::path::absolute(output_dir).map_err(|e| SbomError::OutputDir {
            path: output_dir.to_path_buf(),
            source: e,
        })?;

        let args = self.scan_args(image, &output_dir, docker_config)?;
        self.executor
            .exec_streaming(&args)
            .await
            .map_err(|e| SbomError::Scan {
                image: image.to_owned(),
                source: e,
            })?;

        let reports = list_files(&output_dir).await?;
        for report in &reports {
            tracing::info!(report = %report.display(), "sbom report generated");
        }
        Ok(reports)
    }

    /// Reports to commit back to the repository, as `(local file, repository path)`.
    ///
    /// Only `<file_name>.json` and `<file_name>.txt` qualify, in that order.
    pub fn commit_targets(&self, reports: &[PathBuf]) -> Vec<(PathBuf, String)> {
        let dir = self.config.commit_dir.trim_end_matches('/');

        ["json", "txt"]
            .iter()
            .filter_map(|ext| {
                let name = format!("{}.{ext}", self.config.file_name);
                let report = reports
                    .iter()
                    .find(|r| r.file_name().is_some_and(|n| n == name.as_str()))?;
                let target = if dir.is_empty() {
                    name
                } else {
                    format!("{dir}/{name}")
                };
                Some((report.clone(), target))
            })
            .collect()
    }

    fn scan_args(
        &self,
        image: &str,
        output_dir: &Path,
        docker_config: Option<&Path>,
    ) -> Result<Vec<String>, SbomError> {
        let mut args: Vec<String> = vec![
            "run".into(),
            "--rm".into(),
            "-e".into(),
            format!("IMAGES={image}"),
            "-e".into(),
            "FILE_PREFIX=".into(),
            "-e".into(),
            "FILE_SUFFIX=".into(),
            "-e".into(),
            format!("FILE_NAME={}", self.config.file_name),
            "-v".into(),
            format!("{DOCKER_SOCKET}:{DOCKER_SOCKET}"),
            "-v".into(),
            format!("{}:/output", utf8(output_dir)?),
        ];

        if let Some(config) = docker_config {
            args.push("-v".into());
            args.push(format!("{}:/root/.docker/config.json:ro", utf8(config)?));
        }

        args.push(self.config.scanner_image.clone());
        Ok(args)
    }
}

fn utf8(path: &Path) -> Result<&str, SbomError> {
    path.to_str()
        .ok_or_else(|| SbomError::InvalidPath(path.to_path_buf()))
}

async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SbomError> {
    let read_err = |e| SbomError::OutputDir {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(read_err)? {
        if entry.file_type().await.map_err(read_err)?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

#[derive(Debug, thiserror::Error)]
pub enum SbomError {
    #[error("cannot prepare SBOM output directory {path}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("SBOM scan of {image} failed")]
    Scan { image: String, source: DockerError },
}
