//! Per-branch version records stored as files in the repository.
//!
//! The blob SHA returned by the contents API is the compare-and-swap token:
//! an update must present the SHA it read, and GitHub rejects it (409) when
//! another writer got there first. Conflicts are surfaced, never retried,
//! so a build number is handed out at most once.

use relkit_core::Repository;
use relkit_core::version::{ParsedBranch, VersionRecord, version_file_path};

use crate::contents::RepoFiles;
use crate::transport::GithubTransport;

pub use crate::contents::{ContentToken, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredVersion {
    pub record: VersionRecord,
    pub token: ContentToken,
}

/// Result of [`VersionStore::bump`].
#[derive(Debug, Clone)]
pub struct Bump {
    pub record: VersionRecord,
    pub parsed: ParsedBranch,
    pub token: ContentToken,
}

pub struct VersionStore<'a, T: GithubTransport> {
    files: RepoFiles<'a, T>,
}

impl<'a, T: GithubTransport> VersionStore<'a, T> {
    pub fn new(transport: &'a T, repo: &'a Repository, state_branch: Option<&'a str>) -> Self {
        Self {
            files: RepoFiles::new(transport, repo, state_branch),
        }
    }

    /// Fetch the record for `branch`. A missing file is `Ok(None)`.
    pub async fn read(&self, branch: &str) -> Result<Option<StoredVersion>, StoreError> {
        let path = version_file_path(branch);
        let Some(file) = self.files.read(&path).await? else {
            tracing::debug!(%branch, "no version file yet");
            return Ok(None);
        };

        let record = VersionRecord::from_json(&file.content)
            .map_err(|e| StoreError::Parse { path, source: e })?;

        Ok(Some(StoredVersion {
            record,
            token: file.token,
        }))
    }

    /// Create (`token` = None) or update the record for `branch`.
    ///
    /// Fails with [`StoreError::WriteConflict`] when the stored file no
    /// longer matches `token`, or when creating a file that already exists.
    pub async fn write(
        &self,
        branch: &str,
        record: &VersionRecord,
        token: Option<&ContentToken>,
    ) -> Result<ContentToken, StoreError> {
        let path = version_file_path(branch);
        let json = record.to_pretty_json().map_err(|e| StoreError::Parse {
            path: path.clone(),
            source: e,
        })?;

        let token = self
            .files
            .write(
                &path,
                json.as_bytes(),
                &format!("Update version to {}", record.version),
                token,
            )
            .await?;

        tracing::info!(
            %branch,
            version = %record.version,
            build_number = record.build_number,
            "version file written"
        );
        Ok(token)
    }

    /// Read, compute the next build, and write it back under the read token.
    pub async fn bump(&self, branch: &str) -> Result<Bump, StoreError> {
        let current = self.read(branch).await?;
        let previous = current.as_ref().map(|stored| &stored.record);

        let (record, parsed) =
            VersionRecord::next(branch, previous).map_err(|e| StoreError::BuildNumber {
                branch: branch.to_owned(),
                source: e,
            })?;
        if parsed.is_defaulted() {
            tracing::warn!(
                %branch,
                version = %record.version,
                "branch is not a version branch, using default version"
            );
        }

        let token = self
            .write(branch, &record, current.as_ref().map(|stored| &stored.token))
            .await?;

        Ok(Bump {
            record,
            parsed,
            token,
        })
    }
}
