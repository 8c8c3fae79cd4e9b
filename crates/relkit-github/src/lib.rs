pub mod client;
pub mod contents;
pub mod reaper;
pub mod release;
pub mod store;
pub mod transport;

pub use client::GithubClient;
pub use contents::{RepoFile, RepoFiles};
pub use reaper::{
    ReapReport, ReaperError, RegistrationToken, Runner, RunnerReaper, run_reaper,
};
pub use release::{
    AssetError, CreatedTag, ReleaseCoordinator, ReleaseError, ReleaseHandle, TagError,
    UploadedAsset, determine_prerelease, release_notes,
};
pub use store::{Bump, ContentToken, StoreError, StoredVersion, VersionStore};
pub use transport::{
    ApiRequest, ApiResponse, Body, GithubTransport, HttpTransport, Method, TransportError,
    encode_path, query_string,
};
