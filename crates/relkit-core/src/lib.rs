//! Core types and configuration for relkit.
//!
//! This crate defines the `relkit.toml` schema ([`RelkitConfig`]), the CI
//! environment snapshot ([`CiEnv`]), the pure version policy
//! ([`version`]) and shared error types.

pub mod actions;
pub mod config;
pub mod env;
pub mod error;
pub mod scope;
pub mod version;

pub use actions::ActionsOutput;
pub use config::{GithubConfig, ImageConfig, ReaperConfig, RelkitConfig, SbomConfig};
pub use env::CiEnv;
pub use error::{Error, Result};
pub use scope::{Repository, RunnerScope};
pub use version::{BranchVersion, ParsedBranch, VersionRecord};
