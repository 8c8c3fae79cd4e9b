//! Docker image pipeline for relkit.
//!
//! # Build pipeline
//!
//! ```text
//! relkit image build
//!   1. Version      ── .version_<branch>.json (written by `relkit version bump`)
//!   2. Builder      ── docker buildx create --use + QEMU binfmt
//!   3. Login        ── docker login (Docker Hub, ghcr.io), password on stdin
//!   4. Build & push ── docker buildx build --platform … --push -t … --label …
//!
//! relkit image sbom
//!   1. Login        ── docker login ghcr.io
//!   2. Scan         ── docker run <scanner> → sbom_output/
//! ```
//!
//! All Docker interaction goes through [`DockerExecutor`], so the pipeline
//! is tested against mocks and never needs a daemon.

pub mod docker;
pub mod executor;
pub mod pipeline;
pub mod sbom;

pub use docker::DockerError;
pub use executor::{DockerExecutor, RealExecutor};
pub use pipeline::{
    BuildRequest, ImagePipeline, PipelineError, RegistryTarget, image_references, oci_labels,
};
pub use sbom::{SbomError, SbomScanner};
