//! Branch-scoped build versions, GitHub releases, and CI housekeeping.
//!
//! This is the facade crate that re-exports the relkit sub-crates.
//! Use feature flags to control which components are included.
//!
//! # Feature flags
//!
//! | Feature | Default | Crate | Description |
//! |---------|---------|-------|-------------|
//! | `core` | yes | [`relkit-core`](https://crates.io/crates/relkit-core) | Version policy, configuration, CI environment |
//! | `github` | yes | [`relkit-github`](https://crates.io/crates/relkit-github) | Version store, releases, runner reaper |
//! | `image` | yes | [`relkit-image`](https://crates.io/crates/relkit-image) | Multi-platform image builds and SBOM scans |
//!
//! # Quick start
//!
//! ```rust
//! use relkit::VersionRecord;
//!
//! # fn main() -> relkit::Result<()> {
//! let (record, parsed) = VersionRecord::next("v2.0.1-beta", None)?;
//! assert!(!parsed.is_defaulted());
//! assert_eq!(record.version, "v2.0.1.1-beta");
//! # Ok(())
//! # }
//! ```

// Core types flattened into root namespace for convenience.
#[cfg(feature = "core")]
pub use relkit_core::*;

/// GitHub contents, git refs, releases, and runners APIs.
///
/// See [`relkit-github`](https://crates.io/crates/relkit-github) for details.
#[cfg(feature = "github")]
pub mod github {
    pub use relkit_github::*;
}

/// Docker buildx pipeline and SBOM scanner.
///
/// See [`relkit-image`](https://crates.io/crates/relkit-image) for details.
#[cfg(feature = "image")]
pub mod image {
    pub use relkit_image::*;
}
