use relkit_core::{GithubConfig, Repository};
use secrecy::SecretString;

use crate::contents::RepoFiles;
use crate::reaper::RunnerReaper;
use crate::release::ReleaseCoordinator;
use crate::store::VersionStore;
use crate::transport::{GithubTransport, HttpTransport, TransportError};

/// GitHub API client, parameterized over the transport for testability.
pub struct GithubClient<T: GithubTransport = HttpTransport> {
    transport: T,
}

impl GithubClient<HttpTransport> {
    pub fn new(config: &GithubConfig, token: SecretString) -> Result<Self, TransportError> {
        Ok(Self {
            transport: HttpTransport::new(config, token)?,
        })
    }
}

impl<T: GithubTransport> GithubClient<T> {
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Version files of `repo`, optionally kept on a dedicated branch.
    pub fn version_store<'a>(
        &'a self,
        repo: &'a Repository,
        state_branch: Option<&'a str>,
    ) -> VersionStore<'a, T> {
        VersionStore::new(&self.transport, repo, state_branch)
    }

    /// Arbitrary files of `repo`, on `branch` or the default branch.
    pub fn repo_files<'a>(
        &'a self,
        repo: &'a Repository,
        branch: Option<&'a str>,
    ) -> RepoFiles<'a, T> {
        RepoFiles::new(&self.transport, repo, branch)
    }

    pub fn releases<'a>(&'a self, repo: &'a Repository) -> ReleaseCoordinator<'a, T> {
        ReleaseCoordinator::new(&self.transport, repo)
    }

    pub fn runners(&self) -> RunnerReaper<'_, T> {
        RunnerReaper::new(&self.transport)
    }
}
