//! Branch-scoped version policy.
//!
//! Everything here is pure: a branch name goes in, a version record comes
//! out. Persistence lives in `relkit-github`.
//!
//! ```text
//! branch "v2.0.1-beta", previous build 5
//!   parse_branch      → ("v2.0.1", "2.0.1", "-beta")
//!   next_build_number → 6
//!   full version      → v2.0.1.6-beta
//!   tags              → v2-beta, v2.0-beta, v2.0.1-beta, v2.0.1.6-beta, beta
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static BRANCH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(v[0-9]+(\.[0-9]+)*)([-][a-zA-Z0-9._-]+)?$").expect("branch pattern is valid")
});

const DEFAULT_PREFIX: &str = "v0.0";
const DEFAULT_NUMERIC: &str = "0.0";
const LATEST_CHANNEL: &str = "latest";

/// Version components derived from a branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchVersion {
    /// Leading `vN(.N)*` part, e.g. `v1.2`.
    pub version_prefix: String,
    /// `version_prefix` without the `v`, e.g. `1.2`.
    pub numeric_parts: String,
    /// Trailing `-xxx` part including the dash, or empty.
    pub suffix: String,
}

impl BranchVersion {
    fn fallback() -> Self {
        Self {
            version_prefix: DEFAULT_PREFIX.to_owned(),
            numeric_parts: DEFAULT_NUMERIC.to_owned(),
            suffix: String::new(),
        }
    }
}

/// Outcome of [`parse_branch`].
///
/// Branches that are not version branches still produce a usable
/// [`BranchVersion`] (`v0.0`), but callers can tell the two cases apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedBranch {
    Parsed(BranchVersion),
    Defaulted(BranchVersion),
}

impl ParsedBranch {
    pub fn version(&self) -> &BranchVersion {
        match self {
            Self::Parsed(v) | Self::Defaulted(v) => v,
        }
    }

    pub fn into_version(self) -> BranchVersion {
        match self {
            Self::Parsed(v) | Self::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Self::Defaulted(_))
    }

    /// Reject defaulted parses.
    pub fn strict(self, branch: &str) -> crate::Result<BranchVersion> {
        match self {
            Self::Parsed(v) => Ok(v),
            Self::Defaulted(_) => Err(crate::Error::InvalidBranch {
                branch: branch.to_owned(),
            }),
        }
    }
}

/// Split a branch name into version prefix, numeric parts and suffix.
///
/// Never fails: non-matching branches yield [`ParsedBranch::Defaulted`]
/// carrying `("v0.0", "0.0", "")`.
pub fn parse_branch(branch: &str) -> ParsedBranch {
    let Some(caps) = BRANCH_PATTERN.captures(branch) else {
        return ParsedBranch::Defaulted(BranchVersion::fallback());
    };

    let prefix = caps.get(1).map_or("", |m| m.as_str());
    let suffix = caps.get(3).map_or("", |m| m.as_str());

    ParsedBranch::Parsed(BranchVersion {
        version_prefix: prefix.to_owned(),
        numeric_parts: prefix.trim_start_matches('v').to_owned(),
        suffix: suffix.to_owned(),
    })
}

/// Strip `refs/heads/` from a Git ref, as found in `GITHUB_REF`.
pub fn branch_from_ref(git_ref: &str) -> &str {
    git_ref.strip_prefix("refs/heads/").unwrap_or(git_ref)
}

/// `previous + 1`, or 1 for a branch with no record yet.
///
/// `previous` is read from the stored file and may already be `u64::MAX`.
pub fn next_build_number(previous: Option<u64>) -> crate::Result<u64> {
    match previous {
        None => Ok(1),
        Some(n) => n
            .checked_add(1)
            .ok_or(crate::Error::BuildNumberOverflow { previous: n }),
    }
}

/// Docker tags for a build, most general first.
///
/// `("1.2.3", "-rc", 7)` renders `v1-rc, v1.2-rc, v1.2.3-rc, v1.2.3.7-rc, rc`.
/// The order is consumed as-is by the image pipeline.
pub fn render_tags(numeric_parts: &str, suffix: &str, build_number: u64) -> Vec<String> {
    let mut tags = Vec::new();
    let mut current = String::from("v");

    for (i, part) in numeric_parts.split('.').enumerate() {
        if i > 0 {
            current.push('.');
        }
        current.push_str(part);
        tags.push(format!("{current}{suffix}"));
    }

    tags.push(format!("v{numeric_parts}.{build_number}{suffix}"));
    tags.push(channel_tag(suffix).to_owned());
    tags
}

/// `-beta` → `beta`, empty → `latest`.
pub fn channel_tag(suffix: &str) -> &str {
    if suffix.is_empty() {
        LATEST_CHANNEL
    } else {
        suffix.trim_start_matches('-')
    }
}

pub fn render_full_version(version_prefix: &str, build_number: u64, suffix: &str) -> String {
    format!("{version_prefix}.{build_number}{suffix}")
}

/// Per-branch version state, persisted as `.version_<branch>.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub branch: String,
    pub build_number: u64,
    pub version: String,
    pub tags: Vec<String>,
}

impl VersionRecord {
    /// Compute the record following `previous` for `branch`.
    ///
    /// Returns the parse outcome alongside so callers can warn on (or
    /// reject) defaulted branches.
    pub fn next(
        branch: &str,
        previous: Option<&VersionRecord>,
    ) -> crate::Result<(Self, ParsedBranch)> {
        let parsed = parse_branch(branch);
        let record = Self::for_version(branch, parsed.version(), previous)?;
        Ok((record, parsed))
    }

    pub fn for_version(
        branch: &str,
        version: &BranchVersion,
        previous: Option<&VersionRecord>,
    ) -> crate::Result<Self> {
        let build_number = next_build_number(previous.map(|p| p.build_number))?;
        Ok(Self {
            branch: branch.to_owned(),
            build_number,
            version: render_full_version(&version.version_prefix, build_number, &version.suffix),
            tags: render_tags(&version.numeric_parts, &version.suffix, build_number),
        })
    }

    /// Indented JSON, as stored in the repository.
    pub fn to_pretty_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Repository path of the version file for `branch`.
pub fn version_file_path(branch: &str) -> String {
    format!(".version_{branch}.json")
}
