use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to load config from {path}")]
    ConfigLoad {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config at {path}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid config at {path}: {reason}")]
    InvalidConfig {
        path: PathBuf,
        reason: &'static str,
    },

    // ── CI environment ──
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid repository {value:?}: expected <owner>/<repo>")]
    InvalidRepository { value: String },

    #[error("invalid runner URL {url:?}: {reason}")]
    InvalidRunnerUrl { url: String, reason: &'static str },

    #[error("branch {branch:?} does not match v<N>(.<N>)*(-<suffix>)?")]
    InvalidBranch { branch: String },

    #[error("build number {previous} cannot be incremented")]
    BuildNumberOverflow { previous: u64 },

    // ── GitHub Actions outputs ──
    #[error("failed to write GitHub Actions output to {path}")]
    OutputWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to encode output {key}")]
    OutputEncode {
        key: String,
        source: serde_json::Error,
    },
}
