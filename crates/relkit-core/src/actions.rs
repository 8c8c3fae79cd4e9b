use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

const HEREDOC_DELIMITER: &str = "EOF";

/// Appends step outputs to the file named by `GITHUB_OUTPUT`.
///
/// Outside of GitHub Actions (no output file) every call is a no-op.
#[derive(Debug, Clone, Default)]
pub struct ActionsOutput {
    path: Option<PathBuf>,
}

impl ActionsOutput {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append a `key=value` line.
    pub fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        self.append(&format!("{key}={value}\n"))
    }

    /// Append a value that may span lines, using the heredoc form.
    pub fn set_multiline(&self, key: &str, value: &str) -> crate::Result<()> {
        self.append(&format!(
            "{key}<<{HEREDOC_DELIMITER}\n{value}\n{HEREDOC_DELIMITER}\n"
        ))
    }

    /// Append `value` serialized as JSON, in heredoc form.
    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> crate::Result<()> {
        let json = serde_json::to_string(value).map_err(|e| crate::Error::OutputEncode {
            key: key.to_owned(),
            source: e,
        })?;
        self.set_multiline(key, &json)
    }

    fn append(&self, text: &str) -> crate::Result<()> {
        let Some(path) = &self.path else {
            tracing::debug!("GITHUB_OUTPUT not set, skipping step output");
            return Ok(());
        };

        let write = || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            file.write_all(text.as_bytes())
        };

        write().map_err(|e| crate::Error::OutputWrite {
            path: path.clone(),
            source: e,
        })
    }
}
