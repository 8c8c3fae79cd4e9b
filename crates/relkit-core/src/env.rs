use std::path::PathBuf;

use secrecy::SecretString;

use crate::actions::ActionsOutput;
use crate::scope::Repository;
use crate::version::branch_from_ref;

const DEFAULT_SERVER_URL: &str = "https://github.com";

/// Snapshot of the GitHub Actions environment, read once at startup.
///
/// Nothing downstream touches `std::env`; commands pull what they need
/// through the `require_*` accessors, which fail with
/// [`Error::MissingEnvVar`](crate::Error::MissingEnvVar).
#[derive(Debug, Default)]
pub struct CiEnv {
    pub repository: Option<String>,
    pub git_ref: Option<String>,
    pub sha: Option<String>,
    pub token: Option<SecretString>,
    pub actor: Option<String>,
    pub output_path: Option<PathBuf>,
    pub server_url: Option<String>,
    pub image_name: Option<String>,
    pub docker_username: Option<String>,
    pub docker_token: Option<SecretString>,
}

impl CiEnv {
    /// Read from the process environment.
    pub fn from_process() -> Self {
        Self::from_lookup(|key| {
            std::env::var(key)
                // arch-lint: allow(no-silent-result-drop) reason="unset and non-UTF-8 variables are both treated as absent"
                .ok()
                .filter(|v| !v.is_empty())
        })
    }

    /// Read through an arbitrary lookup function.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("GH_TOKEN").or_else(|| lookup("GITHUB_TOKEN"));

        Self {
            repository: lookup("GITHUB_REPOSITORY"),
            git_ref: lookup("GITHUB_REF"),
            sha: lookup("GITHUB_SHA"),
            token: token.map(SecretString::from),
            actor: lookup("GITHUB_ACTOR"),
            output_path: lookup("GITHUB_OUTPUT").map(PathBuf::from),
            server_url: lookup("GITHUB_SERVER_URL"),
            image_name: lookup("IMAGE_NAME"),
            docker_username: lookup("DOCKER_USERNAME"),
            docker_token: lookup("DOCKER_TOKEN").map(SecretString::from),
        }
    }

    pub fn require_repository(&self) -> crate::Result<Repository> {
        let value = required(self.repository.as_deref(), "GITHUB_REPOSITORY")?;
        Repository::parse(value)
    }

    /// Branch name from `GITHUB_REF`, without the `refs/heads/` prefix.
    pub fn require_branch(&self) -> crate::Result<String> {
        let git_ref = required(self.git_ref.as_deref(), "GITHUB_REF")?;
        Ok(branch_from_ref(git_ref).to_owned())
    }

    pub fn require_sha(&self) -> crate::Result<&str> {
        required(self.sha.as_deref(), "GITHUB_SHA")
    }

    pub fn require_token(&self) -> crate::Result<&SecretString> {
        self.token
            .as_ref()
            .ok_or_else(|| crate::Error::MissingEnvVar("GH_TOKEN or GITHUB_TOKEN".to_owned()))
    }

    pub fn require_actor(&self) -> crate::Result<&str> {
        required(self.actor.as_deref(), "GITHUB_ACTOR")
    }

    pub fn require_docker_credentials(&self) -> crate::Result<(&str, &SecretString)> {
        let user = required(self.docker_username.as_deref(), "DOCKER_USERNAME")?;
        let token = self
            .docker_token
            .as_ref()
            .ok_or_else(|| crate::Error::MissingEnvVar("DOCKER_TOKEN".to_owned()))?;
        Ok((user, token))
    }

    /// `configured` wins over `IMAGE_NAME`.
    pub fn require_image_name<'a>(&'a self, configured: Option<&'a str>) -> crate::Result<&'a str> {
        match configured {
            Some(name) => Ok(name),
            None => required(self.image_name.as_deref(), "IMAGE_NAME"),
        }
    }

    /// Step output sink for `GITHUB_OUTPUT`.
    pub fn output(&self) -> ActionsOutput {
        ActionsOutput::new(self.output_path.clone())
    }

    pub fn server_url(&self) -> &str {
        self.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL)
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> crate::Result<&'a str> {
    value.ok_or_else(|| crate::Error::MissingEnvVar(key.to_owned()))
}
