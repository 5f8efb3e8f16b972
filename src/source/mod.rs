//! Skill source references
//!
//! A declared source is either a remote repository (optionally narrowed to a
//! subpath) or a local directory. Parsing is a pure function over the input
//! string; no filesystem or network access happens here.

use std::fmt;
use std::path::PathBuf;

use crate::error::{Result, SkilletError};

/// A parsed skill source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceReference {
    /// Remote repository, `remote:<owner>/<repo>[/<subpath>]`
    Remote {
        owner: String,
        repo: String,
        subpath: Option<String>,
    },
    /// Local directory, `local:<path>`
    Local { path: PathBuf },
}

fn valid_segment(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

impl SourceReference {
    /// Parse a source string
    ///
    /// Supported formats:
    /// - `remote:<owner>/<repo>` - repository root
    /// - `remote:<owner>/<repo>/<subpath>` - subdirectory within a repository
    /// - `local:<path>` - local directory (absolute, relative, or `~/` prefixed)
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();

        if let Some(rest) = input.strip_prefix("remote:") {
            return Self::parse_remote(input, rest);
        }

        if let Some(path) = input.strip_prefix("local:") {
            if path.is_empty() {
                return Err(SkilletError::MalformedSource {
                    input: input.to_string(),
                    reason: "empty path".to_string(),
                });
            }
            return Ok(SourceReference::Local {
                path: PathBuf::from(path),
            });
        }

        Err(SkilletError::MalformedSource {
            input: input.to_string(),
            reason: "unknown prefix, expected 'remote:' or 'local:'".to_string(),
        })
    }

    fn parse_remote(input: &str, rest: &str) -> Result<Self> {
        let malformed = |reason: &str| SkilletError::MalformedSource {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = rest.splitn(3, '/');
        let owner = parts.next().unwrap_or_default();
        let repo = parts.next().unwrap_or_default();
        let subpath = parts.next();

        if owner.is_empty() || repo.is_empty() {
            return Err(malformed("expected <owner>/<repo>"));
        }
        if !valid_segment(owner) {
            return Err(malformed("owner contains invalid characters"));
        }
        if !valid_segment(repo) {
            return Err(malformed("repo contains invalid characters"));
        }
        if let Some(sub) = subpath {
            if sub.is_empty() || sub.split('/').any(str::is_empty) {
                return Err(malformed("subpath contains empty components"));
            }
        }

        Ok(SourceReference::Remote {
            owner: owner.to_string(),
            repo: repo.to_string(),
            subpath: subpath.map(String::from),
        })
    }

    /// Check if this is a local directory source
    pub fn is_local(&self) -> bool {
        matches!(self, SourceReference::Local { .. })
    }
}

impl fmt::Display for SourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceReference::Remote {
                owner,
                repo,
                subpath,
            } => match subpath {
                Some(sub) => write!(f, "remote:{owner}/{repo}/{sub}"),
                None => write!(f, "remote:{owner}/{repo}"),
            },
            SourceReference::Local { path } => write!(f, "local:{}", path.display()),
        }
    }
}
