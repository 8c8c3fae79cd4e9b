mod image;
mod release;
mod runners;
mod version;

use std::path::Path;

use relkit_core::{CiEnv, RelkitConfig};
use relkit_github::GithubClient;
use secrecy::{ExposeSecret, SecretString};

pub use image::{image_build, image_sbom};
pub use release::release_publish;
pub use runners::{runners_reap, runners_token};
pub use version::{version_bump, version_show};

/// `relkit.toml` plus the CI environment, resolved once per command.
pub(crate) struct Settings {
    pub config: RelkitConfig,
    pub env: CiEnv,
}

impl Settings {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            config: RelkitConfig::load(Path::new("."))?,
            env: CiEnv::from_process(),
        })
    }

    /// Branch from `--branch`, falling back to `GITHUB_REF`.
    pub fn branch(&self, explicit: Option<String>) -> anyhow::Result<String> {
        match explicit {
            Some(branch) => Ok(branch),
            None => Ok(self.env.require_branch()?),
        }
    }

    /// API client authenticated with `GH_TOKEN`/`GITHUB_TOKEN`.
    pub fn github(&self) -> anyhow::Result<GithubClient> {
        let token = self.env.require_token()?;
        github_client(&self.config, token)
    }
}

pub(crate) fn github_client(
    config: &RelkitConfig,
    token: &SecretString,
) -> anyhow::Result<GithubClient> {
    let token = SecretString::from(token.expose_secret().to_owned());
    Ok(GithubClient::new(&config.github, token)?)
}
