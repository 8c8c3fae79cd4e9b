use std::fmt;

/// `owner/repo` coordinates of a GitHub repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parse the `owner/repo` form used by `GITHUB_REPOSITORY`.
    pub fn parse(value: &str) -> crate::Result<Self> {
        split_owner_repo(value.trim()).ok_or_else(|| crate::Error::InvalidRepository {
            value: value.to_owned(),
        })
    }

    /// Registry namespaces (ghcr.io) require a lowercase owner.
    pub fn owner_lowercase(&self) -> String {
        self.owner.to_lowercase()
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Where self-hosted runners are registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerScope {
    Repository(Repository),
    Organization(String),
}

impl RunnerScope {
    /// Derive the scope from a github.com URL.
    ///
    /// - `https://github.com/acme/api` → repository `acme/api`
    /// - `https://github.com/acme`     → organization `acme`
    pub fn from_url(url: &str) -> crate::Result<Self> {
        let invalid = |reason| crate::Error::InvalidRunnerUrl {
            url: url.to_owned(),
            reason,
        };

        let (_, rest) = url
            .split_once("github.com/")
            .ok_or_else(|| invalid("expected a github.com URL"))?;
        let base = rest.trim_end_matches('/');

        if base.is_empty() {
            return Err(invalid("missing organization or repository"));
        }

        if base.contains('/') {
            split_owner_repo(base)
                .map(Self::Repository)
                .ok_or_else(|| invalid("expected github.com/<owner>/<repo>"))
        } else {
            Ok(Self::Organization(base.to_owned()))
        }
    }

    /// Path prefix for the Actions runners API, relative to the API root.
    pub fn api_prefix(&self) -> String {
        match self {
            Self::Repository(repo) => format!("repos/{repo}"),
            Self::Organization(org) => format!("orgs/{org}"),
        }
    }
}

impl fmt::Display for RunnerScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository(repo) => write!(f, "repository {repo}"),
            Self::Organization(org) => write!(f, "organization {org}"),
        }
    }
}

fn split_owner_repo(value: &str) -> Option<Repository> {
    let (owner, name) = value.split_once('/')?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(Repository {
        owner: owner.to_owned(),
        name: name.to_owned(),
    })
}
