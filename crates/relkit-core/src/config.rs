use serde::{Deserialize, Serialize};

/// relkit.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelkitConfig {
    #[serde(default)]
    pub github: GithubConfig,
    #[serde(default)]
    pub image: ImageConfig,
    #[serde(default)]
    pub sbom: SbomConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    /// REST API base URL (GitHub Enterprise installs override this)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Branch holding the `.version_<branch>.json` files.
    /// When None, the repository default branch is used.
    #[serde(default)]
    pub state_branch: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image name (defaults to the IMAGE_NAME environment variable)
    pub name: Option<String>,
    /// Target platforms for `docker buildx build --platform`
    #[serde(default = "default_platforms")]
    pub platforms: Vec<String>,
    /// Build context directory
    #[serde(default = "default_context")]
    pub context: String,
    /// Push to Docker Hub under DOCKER_USERNAME
    #[serde(default = "default_true")]
    pub push_dockerhub: bool,
    /// Push to ghcr.io under the repository owner
    #[serde(default = "default_true")]
    pub push_ghcr: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SbomConfig {
    /// Scanner container image
    #[serde(default = "default_scanner_image")]
    pub scanner_image: String,
    /// Directory receiving the generated reports
    #[serde(default = "default_sbom_output_dir")]
    pub output_dir: String,
    /// Base file name of the reports (without extension)
    #[serde(default = "default_sbom_file_name")]
    pub file_name: String,
    /// Repository directory that `image sbom --commit` writes the reports to
    #[serde(default = "default_sbom_commit_dir")]
    pub commit_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    /// Seconds between reap cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            user_agent: default_user_agent(),
            state_branch: None,
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            name: None,
            platforms: default_platforms(),
            context: default_context(),
            push_dockerhub: true,
            push_ghcr: true,
        }
    }
}

impl Default for SbomConfig {
    fn default() -> Self {
        Self {
            scanner_image: default_scanner_image(),
            output_dir: default_sbom_output_dir(),
            file_name: default_sbom_file_name(),
            commit_dir: default_sbom_commit_dir(),
        }
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

impl RelkitConfig {
    /// Load from relkit.toml at the given path, or return defaults if not found.
    pub fn load(project_dir: &std::path::Path) -> crate::Result<Self> {
        let config_path = project_dir.join("relkit.toml");
        if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            let config: Self = toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path.clone(),
                source: e,
            })?;
            config.validate(&config_path)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    fn validate(&self, path: &std::path::Path) -> crate::Result<()> {
        if self.reaper.interval_secs == 0 {
            return Err(crate::Error::InvalidConfig {
                path: path.to_path_buf(),
                reason: "[reaper].interval_secs must be at least 1",
            });
        }
        Ok(())
    }
}

impl ReaperConfig {
    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs)
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_owned()
}

fn default_user_agent() -> String {
    "relkit".to_owned()
}

fn default_platforms() -> Vec<String> {
    vec!["linux/amd64".to_owned(), "linux/arm64".to_owned()]
}

fn default_context() -> String {
    "src".to_owned()
}

fn default_true() -> bool {
    true
}

fn default_scanner_image() -> String {
    "ghcr.io/dockforge/sbominify:latest".to_owned()
}

fn default_sbom_output_dir() -> String {
    "sbom_output".to_owned()
}

fn default_sbom_file_name() -> String {
    "sbom".to_owned()
}

fn default_sbom_commit_dir() -> String {
    ".sbom".to_owned()
}

fn default_interval_secs() -> u64 {
    300
}
