//! Version and source resolution
//!
//! Turns a declared skill (source string plus optional `version`/`ref`) into
//! an immutable revision: a full commit SHA for remote sources, a content
//! fingerprint for local ones. Resolution is read-only; it never touches the
//! cache or install roots.

pub mod local;
pub mod remote;

use std::fmt;

use crate::error::{Result, SkilletError};

pub use local::{LocalSkill, resolve_local};
pub use remote::resolve_remote;

/// How a declared version narrows the candidate revisions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    /// A tag named verbatim, e.g. `v1.2.3`
    ExactTag(String),
    /// `^M.m.p`: highest tag in `[M.m.p, (M+1).0.0)`
    SemverCaret(semver::Version),
    /// `~M.m.p`: highest tag in `[M.m.p, M.(m+1).0)`
    SemverTilde(semver::Version),
    /// Most recently published non-prerelease, non-draft release
    Latest,
    /// A branch name, or a full 40-hex commit SHA
    Ref(String),
    /// Head of the repository's default branch
    DefaultBranch,
}

impl VersionConstraint {
    /// Build the constraint a declaration implies
    ///
    /// `version` and `ref` are mutually exclusive (enforced at config load);
    /// with neither present the default branch head is used.
    pub fn from_declaration(version: Option<&str>, reference: Option<&str>) -> Result<Self> {
        if let Some(r) = reference {
            return Ok(VersionConstraint::Ref(r.to_string()));
        }
        let Some(version) = version else {
            return Ok(VersionConstraint::DefaultBranch);
        };
        match version {
            "latest" => Ok(VersionConstraint::Latest),
            v if v.starts_with('^') => Ok(VersionConstraint::SemverCaret(parse_version(&v[1..])?)),
            v if v.starts_with('~') => Ok(VersionConstraint::SemverTilde(parse_version(&v[1..])?)),
            v => Ok(VersionConstraint::ExactTag(v.to_string())),
        }
    }
}

fn parse_version(text: &str) -> Result<semver::Version> {
    semver::Version::parse(text.trim_start_matches('v')).map_err(|e| {
        SkilletError::ConfigInvalid {
            message: format!("invalid semver constraint '{text}': {e}"),
        }
    })
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionConstraint::ExactTag(tag) => write!(f, "{tag}"),
            VersionConstraint::SemverCaret(v) => write!(f, "^{v}"),
            VersionConstraint::SemverTilde(v) => write!(f, "~{v}"),
            VersionConstraint::Latest => write!(f, "latest"),
            VersionConstraint::Ref(r) => write!(f, "{r}"),
            VersionConstraint::DefaultBranch => write!(f, "default branch"),
        }
    }
}

/// A fully pinned revision of a remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRevision {
    /// Human-facing version label, e.g. `v1.2.3` or `main@abc1234`
    pub label: String,
    /// Full commit SHA
    pub immutable_id: String,
    /// Provider archive URL for the commit
    pub fetch_locator: Option<String>,
}
