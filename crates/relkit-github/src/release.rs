//! Tag + release publishing from a stored version record.
//!
//! ```text
//! VersionRecord ──create_tag──▶ CreatedTag ──create_release──▶ ReleaseHandle ──upload_asset──▶ …
//! ```
//!
//! The two calls are not transactional. A run that dies after tagging
//! leaves a tag without a release; re-running fails with
//! [`TagError::AlreadyExists`] and the release has to be created by hand.

use std::path::Path;

use relkit_core::{Repository, VersionRecord};
use serde::Deserialize;
use serde_json::json;

use crate::transport::{ApiRequest, GithubTransport, TransportError, query_string};

const PRERELEASE_CHANNELS: &[&str] = &["alpha", "beta"];

/// True when the first `-` segment of `version` is `alpha` or `beta`
/// (case-insensitive). `v1.0-rc` and `v1.2.1` are regular releases.
pub fn determine_prerelease(version: &str) -> bool {
    let Some((_, rest)) = version.split_once('-') else {
        return false;
    };
    let channel = rest.split('-').next().unwrap_or(rest);
    PRERELEASE_CHANNELS
        .iter()
        .any(|c| channel.eq_ignore_ascii_case(c))
}

/// Release body for `record`.
pub fn release_notes(record: &VersionRecord) -> String {
    let release_type = if determine_prerelease(&record.version) {
        "Pre-release"
    } else {
        "Regular Release"
    };

    let tags = record
        .tags
        .iter()
        .map(|tag| format!("- {tag}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Version {version}\n\
         Build Number: {build}\n\
         Branch: {branch}\n\
         Release Type: {release_type}\n\
         Docker Tags:\n\
         {tags}\n",
        version = record.version,
        build = record.build_number,
        branch = record.branch,
    )
}

/// Proof that `refs/tags/<name>` was created. Only [`ReleaseCoordinator::create_tag`]
/// hands these out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTag {
    name: String,
    sha: String,
}

impl CreatedTag {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sha(&self) -> &str {
        &self.sha
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseHandle {
    pub id: u64,
    pub tag_name: String,
    /// URI template (`…/assets{?name,label}`) for asset uploads.
    pub upload_url: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl ReleaseHandle {
    /// Upload endpoint for a file called `name`.
    pub fn asset_url(&self, name: &str) -> String {
        let base = self
            .upload_url
            .split_once('{')
            .map_or(self.upload_url.as_str(), |(base, _)| base);
        format!("{base}?{}", query_string(&[("name", name)]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedAsset {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub browser_download_url: Option<String>,
}

pub struct ReleaseCoordinator<'a, T: GithubTransport> {
    transport: &'a T,
    repo: &'a Repository,
}

impl<'a, T: GithubTransport> ReleaseCoordinator<'a, T> {
    pub fn new(transport: &'a T, repo: &'a Repository) -> Self {
        Self { transport, repo }
    }

    /// Create `refs/tags/<version>` at `commit_sha`.
    pub async fn create_tag(&self, commit_sha: &str, version: &str) -> Result<CreatedTag, TagError> {
        let body = json!({
            "ref": format!("refs/tags/{version}"),
            "sha": commit_sha,
        });

        let response = self
            .transport
            .send(ApiRequest::post_json(
                format!("repos/{}/git/refs", self.repo),
                body,
            ))
            .await
            .map_err(|e| TagError::Transport {
                tag: version.to_owned(),
                source: e,
            })?;

        match response.status {
            201 => {
                tracing::info!(tag = %version, sha = %commit_sha, "tag created");
                Ok(CreatedTag {
                    name: version.to_owned(),
                    sha: commit_sha.to_owned(),
                })
            }
            422 => Err(TagError::AlreadyExists {
                tag: version.to_owned(),
            }),
            status => Err(TagError::UnexpectedStatus {
                tag: version.to_owned(),
                status,
                body: response.body,
            }),
        }
    }

    /// Create the release for `record` on top of an existing tag.
    pub async fn create_release(
        &self,
        tag: &CreatedTag,
        record: &VersionRecord,
    ) -> Result<ReleaseHandle, ReleaseError> {
        if tag.name != record.version {
            return Err(ReleaseError::TagMismatch {
                tag: tag.name.clone(),
                version: record.version.clone(),
            });
        }

        let prerelease = determine_prerelease(&record.version);
        let body = json!({
            "tag_name": record.version,
            "target_commitish": tag.sha,
            "name": format!("Release {}", record.version),
            "body": release_notes(record),
            "draft": false,
            "prerelease": prerelease,
        });

        let response = self
            .transport
            .send(ApiRequest::post_json(
                format!("repos/{}/releases", self.repo),
                body,
            ))
            .await
            .map_err(|e| ReleaseError::Transport { source: e })?;

        if response.status != 201 {
            return Err(ReleaseError::UnexpectedStatus {
                version: record.version.clone(),
                status: response.status,
                body: response.body,
            });
        }

        let handle: ReleaseHandle = response
            .json()
            .map_err(|e| ReleaseError::Decode { source: e })?;
        tracing::info!(version = %record.version, release_id = handle.id, prerelease, "release created");
        Ok(handle)
    }

    /// Attach a local file to `release`.
    pub async fn upload_asset(
        &self,
        release: &ReleaseHandle,
        path: &Path,
    ) -> Result<UploadedAsset, AssetError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AssetError::InvalidPath(path.to_path_buf()))?;

        let data = tokio::fs::read(path).await.map_err(|e| AssetError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size = data.len();

        let response = self
            .transport
            .send(ApiRequest::post_bytes(
                release.asset_url(name),
                "application/octet-stream",
                data,
            ))
            .await
            .map_err(|e| AssetError::Transport {
                name: name.to_owned(),
                source: e,
            })?;

        if response.status != 201 {
            return Err(AssetError::UnexpectedStatus {
                name: name.to_owned(),
                status: response.status,
                body: response.body,
            });
        }

        let asset: UploadedAsset = response.json().map_err(|e| AssetError::Decode {
            name: name.to_owned(),
            source: e,
        })?;
        tracing::info!(release_id = release.id, asset = %asset.name, size, "asset uploaded");
        Ok(asset)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TagError {
    #[error("tag {tag} already exists")]
    AlreadyExists { tag: String },

    #[error("failed to create tag {tag}")]
    Transport {
        tag: String,
        source: TransportError,
    },

    #[error("unexpected HTTP {status} creating tag {tag}: {body}")]
    UnexpectedStatus {
        tag: String,
        status: u16,
        body: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ReleaseError {
    #[error("tag {tag} does not match release version {version}")]
    TagMismatch { tag: String, version: String },

    #[error("failed to create release")]
    Transport { source: TransportError },

    #[error("unexpected HTTP {status} creating release {version}: {body}")]
    UnexpectedStatus {
        version: String,
        status: u16,
        body: String,
    },

    #[error("release response could not be decoded")]
    Decode { source: serde_json::Error },
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset path has no UTF-8 file name: {0}")]
    InvalidPath(std::path::PathBuf),

    #[error("failed to read asset {path}")]
    Read {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("failed to upload asset {name}")]
    Transport {
        name: String,
        source: TransportError,
    },

    #[error("unexpected HTTP {status} uploading {name}: {body}")]
    UnexpectedStatus {
        name: String,
        status: u16,
        body: String,
    },

    #[error("asset upload response for {name} could not be decoded")]
    Decode {
        name: String,
        source: serde_json::Error,
    },
}
