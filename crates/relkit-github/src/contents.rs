//! Raw file access through the repository contents API.
//!
//! Paths and refs are percent-encoded per segment, so a branch such as
//! `fix#12` addresses `.version_fix%2312.json` and never collides with
//! `fix#13`.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use relkit_core::Repository;
use serde::Deserialize;
use serde_json::json;

use crate::transport::{ApiRequest, GithubTransport, TransportError, encode_path, query_string};

/// Opaque revision of a stored file (its blob SHA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentToken(String);

impl ContentToken {
    pub fn new(sha: impl Into<String>) -> Self {
        Self(sha.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Decoded file content plus the token needed to update it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoFile {
    pub content: Vec<u8>,
    pub token: ContentToken,
}

#[derive(Deserialize)]
struct ContentFile {
    content: String,
    sha: String,
}

#[derive(Deserialize)]
struct PutResponse {
    content: PutContent,
}

#[derive(Deserialize)]
struct PutContent {
    sha: String,
}

/// Files of one repository, optionally pinned to a branch.
pub struct RepoFiles<'a, T: GithubTransport> {
    transport: &'a T,
    repo: &'a Repository,
    branch: Option<&'a str>,
}

impl<'a, T: GithubTransport> RepoFiles<'a, T> {
    pub fn new(transport: &'a T, repo: &'a Repository, branch: Option<&'a str>) -> Self {
        Self {
            transport,
            repo,
            branch,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "repos/{owner}/{name}/contents/{path}",
            owner = encode_path(&self.repo.owner),
            name = encode_path(&self.repo.name),
            path = encode_path(path),
        )
    }

    /// Fetch `path`. A missing file is `Ok(None)`.
    pub async fn read(&self, path: &str) -> Result<Option<RepoFile>, StoreError> {
        let mut url = self.url(path);
        if let Some(branch) = self.branch {
            url.push('?');
            url.push_str(&query_string(&[("ref", branch)]));
        }

        let response = self
            .transport
            .send(ApiRequest::get(url))
            .await
            .map_err(|e| StoreError::Transport {
                path: path.to_owned(),
                source: e,
            })?;

        match response.status {
            200 => {}
            404 => {
                tracing::debug!(%path, "file not found");
                return Ok(None);
            }
            status => {
                return Err(StoreError::UnexpectedStatus {
                    path: path.to_owned(),
                    status,
                    body: response.body,
                });
            }
        }

        let file: ContentFile = response.json().map_err(|e| StoreError::Parse {
            path: path.to_owned(),
            source: e,
        })?;

        // GitHub wraps base64 content at 60 columns.
        let encoded: String = file
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        let content = STANDARD.decode(encoded).map_err(|e| StoreError::Decode {
            path: path.to_owned(),
            source: e,
        })?;

        Ok(Some(RepoFile {
            content,
            token: ContentToken(file.sha),
        }))
    }

    /// Create (`token` = None) or update `path`.
    ///
    /// Fails with [`StoreError::WriteConflict`] when the stored file no
    /// longer matches `token`, or when creating a file that already exists.
    pub async fn write(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
        token: Option<&ContentToken>,
    ) -> Result<ContentToken, StoreError> {
        let mut body = json!({
            "message": message,
            "content": STANDARD.encode(content),
        });
        if let Some(token) = token {
            body["sha"] = json!(token.as_str());
        }
        if let Some(branch) = self.branch {
            body["branch"] = json!(branch);
        }

        let response = self
            .transport
            .send(ApiRequest::put_json(self.url(path), body))
            .await
            .map_err(|e| StoreError::Transport {
                path: path.to_owned(),
                source: e,
            })?;

        match response.status {
            200 | 201 => {
                let put: PutResponse = response.json().map_err(|e| StoreError::Parse {
                    path: path.to_owned(),
                    source: e,
                })?;
                Ok(ContentToken(put.content.sha))
            }
            // 409: sha mismatch. 422: create raced an existing file.
            409 | 422 => Err(StoreError::WriteConflict {
                path: path.to_owned(),
                status: response.status,
            }),
            status => Err(StoreError::UnexpectedStatus {
                path: path.to_owned(),
                status,
                body: response.body,
            }),
        }
    }

    /// Write `content` to `path` over whatever is there now.
    ///
    /// Last writer wins. Only for artifacts such as scan reports, never for
    /// version records.
    pub async fn upsert(
        &self,
        path: &str,
        content: &[u8],
        message: &str,
    ) -> Result<ContentToken, StoreError> {
        let current = self.read(path).await?;
        let token = self
            .write(path, content, message, current.as_ref().map(|f| &f.token))
            .await?;
        tracing::info!(%path, bytes = content.len(), "file committed");
        Ok(token)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("file {path} changed since it was read (HTTP {status}); another build won the race")]
    WriteConflict { path: String, status: u16 },

    #[error("request for file {path} failed")]
    Transport {
        path: String,
        source: TransportError,
    },

    #[error("unexpected HTTP {status} for file {path}: {body}")]
    UnexpectedStatus {
        path: String,
        status: u16,
        body: String,
    },

    #[error("file {path} is not valid base64")]
    Decode {
        path: String,
        source: base64::DecodeError,
    },

    #[error("file {path} could not be parsed")]
    Parse {
        path: String,
        source: serde_json::Error,
    },

    #[error("cannot allocate the next build for branch {branch}")]
    BuildNumber {
        branch: String,
        source: relkit_core::Error,
    },
}
