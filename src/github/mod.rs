//! GitHub REST API client
//!
//! Implements the remote metadata operations the resolver needs (tag and
//! branch lookups, tag/release listings) plus tarball download for the fetch
//! step. All requests are blocking `ureq` calls with a shared agent. The base
//! URL can be pointed at a fixture server via `SKILLET_API_BASE`.

use std::io::Read;
use std::thread;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, SkilletError};

/// Production API base URL
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Environment variable overriding the API base URL
pub const API_BASE_ENV: &str = "SKILLET_API_BASE";

const USER_AGENT: &str = concat!("skillet/", env!("CARGO_PKG_VERSION"));
const PER_PAGE: usize = 100;

const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_BASE_MS: u64 = 500;
const BACKOFF_CAP_MS: u64 = 5_000;

/// Metadata operations the version resolver depends on
///
/// Kept as a trait so resolution logic can be tested against a canned
/// in-memory provider.
pub trait RemoteMetadata {
    /// Commit SHA a tag points at, following annotated tag objects
    fn tag_commit(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<String>>;

    /// Head commit SHA of a branch
    fn branch_head_commit(&self, owner: &str, repo: &str, branch: &str) -> Result<Option<String>>;

    /// Whether a full commit SHA exists in the repository
    fn commit_exists(&self, owner: &str, repo: &str, sha: &str) -> Result<bool>;

    /// Name of the repository's default branch
    fn default_branch(&self, owner: &str, repo: &str) -> Result<String>;

    /// All tag names, in API order
    fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<String>>;

    /// All releases, in API order
    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>>;

    /// Archive URL for a commit, recorded as the fetch locator
    fn archive_url(&self, owner: &str, repo: &str, sha: &str) -> String;
}

/// Release metadata relevant to `latest` resolution
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseInfo {
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub draft: bool,
    /// RFC 3339 publication timestamp; drafts have none
    pub published_at: Option<String>,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct AnnotatedTag {
    object: TagTarget,
}

#[derive(Deserialize)]
struct TagTarget {
    sha: String,
}

#[derive(Deserialize)]
struct BranchInfo {
    commit: BranchCommit,
}

#[derive(Deserialize)]
struct BranchCommit {
    sha: String,
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct TagListItem {
    name: String,
}

/// Blocking GitHub API client
pub struct GitHubClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client against a given base URL
    ///
    /// `token`, when present, is sent as `Authorization: Bearer`. `timeout`
    /// bounds each individual request.
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Create a client using `SKILLET_API_BASE` or the production base URL
    pub fn from_env(token: Option<String>, timeout: Duration) -> Self {
        let base = std::env::var(API_BASE_ENV).unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        Self::new(base, token, timeout)
    }

    fn request(&self, path: &str) -> ureq::Request {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .agent
            .get(&url)
            .set("User-Agent", USER_AGENT)
            .set("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            req = req.set("Authorization", &format!("Bearer {token}"));
        }
        req
    }

    /// GET a JSON resource; `Ok(None)` on 404
    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        match self.request(path).call() {
            Ok(response) => {
                let value = response.into_json().map_err(|e| {
                    SkilletError::network(format!("malformed response from {path}: {e}"))
                })?;
                Ok(Some(value))
            }
            Err(ureq::Error::Status(404, _)) => Ok(None),
            Err(e) => Err(map_api_error(path, e)),
        }
    }

    /// Stream the gzip tarball of a repository at a commit
    pub fn download_archive(
        &self,
        owner: &str,
        repo: &str,
        sha: &str,
    ) -> Result<impl Read + Send> {
        let path = format!("/repos/{owner}/{repo}/tarball/{sha}");
        match self.request(&path).call() {
            Ok(response) => Ok(response.into_reader()),
            Err(ureq::Error::Status(404, _)) => Err(SkilletError::SourceNotFound {
                what: format!("archive for {owner}/{repo}@{sha}"),
            }),
            Err(e) => Err(map_api_error(&path, e)),
        }
    }

    fn get_paginated<T: serde::de::DeserializeOwned>(&self, base_path: &str) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let path = format!("{base_path}?per_page={PER_PAGE}&page={page}");
            let Some(batch) = self.get_json::<Vec<T>>(&path)? else {
                break;
            };
            let count = batch.len();
            all.extend(batch);
            if count < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(all)
    }
}

impl RemoteMetadata for GitHubClient {
    fn tag_commit(&self, owner: &str, repo: &str, tag: &str) -> Result<Option<String>> {
        let path = format!("/repos/{owner}/{repo}/git/ref/tags/{tag}");
        let Some(reference) = self.get_json::<GitRef>(&path)? else {
            return Ok(None);
        };
        if reference.object.kind != "tag" {
            return Ok(Some(reference.object.sha));
        }
        // Annotated tag: the ref points at a tag object, not the commit.
        let tag_path = format!("/repos/{owner}/{repo}/git/tags/{}", reference.object.sha);
        let Some(annotated) = self.get_json::<AnnotatedTag>(&tag_path)? else {
            return Ok(None);
        };
        Ok(Some(annotated.object.sha))
    }

    fn branch_head_commit(&self, owner: &str, repo: &str, branch: &str) -> Result<Option<String>> {
        let path = format!("/repos/{owner}/{repo}/branches/{branch}");
        Ok(self
            .get_json::<BranchInfo>(&path)?
            .map(|b| b.commit.sha))
    }

    fn commit_exists(&self, owner: &str, repo: &str, sha: &str) -> Result<bool> {
        let path = format!("/repos/{owner}/{repo}/commits/{sha}");
        Ok(self.get_json::<serde_json::Value>(&path)?.is_some())
    }

    fn default_branch(&self, owner: &str, repo: &str) -> Result<String> {
        let path = format!("/repos/{owner}/{repo}");
        self.get_json::<RepoInfo>(&path)?
            .map(|r| r.default_branch)
            .ok_or_else(|| SkilletError::SourceNotFound {
                what: format!("repository {owner}/{repo}"),
            })
    }

    fn list_tags(&self, owner: &str, repo: &str) -> Result<Vec<String>> {
        let items: Vec<TagListItem> = self.get_paginated(&format!("/repos/{owner}/{repo}/tags"))?;
        Ok(items.into_iter().map(|t| t.name).collect())
    }

    fn list_releases(&self, owner: &str, repo: &str) -> Result<Vec<ReleaseInfo>> {
        self.get_paginated(&format!("/repos/{owner}/{repo}/releases"))
    }

    fn archive_url(&self, owner: &str, repo: &str, sha: &str) -> String {
        format!("{}/repos/{owner}/{repo}/tarball/{sha}", self.base_url)
    }
}

/// Map a non-404 ureq error to a terminal error
fn map_api_error(path: &str, error: ureq::Error) -> SkilletError {
    match error {
        ureq::Error::Status(code @ (401 | 403), response) => {
            let body = response.into_string().unwrap_or_default();
            if body.to_lowercase().contains("rate limit") {
                SkilletError::rate_limited(format!(
                    "GitHub API rate limit hit on {path} (HTTP {code})"
                ))
            } else {
                SkilletError::network(format!("GitHub API denied {path} (HTTP {code})"))
            }
        }
        ureq::Error::Status(code, _) => {
            SkilletError::network(format!("GitHub API returned HTTP {code} for {path}"))
        }
        ureq::Error::Transport(t) => SkilletError::network(format!("request to {path} failed: {t}")),
    }
}

/// Run an operation, retrying retryable network failures
///
/// Up to three attempts with exponential backoff starting at 500 ms and
/// capped at 5 s. Non-retryable errors propagate immediately.
pub fn with_retry<T>(mut op: impl FnMut() -> Result<T>) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt + 1 < MAX_ATTEMPTS => {
                let delay = (BACKOFF_BASE_MS << attempt).min(BACKOFF_CAP_MS);
                thread::sleep(Duration::from_millis(delay));
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::TcpListener;

    use super::*;

    /// Serve a single canned HTTP response and return the base URL
    fn serve_once(status: u16, reason: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();
        let reason = reason.to_string();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}")
    }

    fn client(base: String) -> GitHubClient {
        GitHubClient::new(base, None, Duration::from_secs(5))
    }

    #[test]
    fn test_get_json_maps_404_to_none() {
        let base = serve_once(404, "Not Found", r#"{"message":"Not Found"}"#);
        let result: Option<serde_json::Value> =
            client(base).get_json("/repos/octo/missing").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_tag_commit_lightweight_tag() {
        let sha = "a".repeat(40);
        let base = serve_once(
            200,
            "OK",
            &format!(r#"{{"object":{{"sha":"{sha}","type":"commit"}}}}"#),
        );
        let commit = client(base).tag_commit("octo", "skills", "v1.0.0").unwrap();
        assert_eq!(commit, Some(sha));
    }

    #[test]
    fn test_branch_head_commit() {
        let base = serve_once(200, "OK", r#"{"name":"main","commit":{"sha":"deadbeef"}}"#);
        let head = client(base)
            .branch_head_commit("octo", "skills", "main")
            .unwrap();
        assert_eq!(head.as_deref(), Some("deadbeef"));
    }

    #[test]
    fn test_rate_limit_surfaces_flag() {
        let base = serve_once(
            403,
            "Forbidden",
            r#"{"message":"API rate limit exceeded for 1.2.3.4."}"#,
        );
        let err = client(base)
            .get_json::<serde_json::Value>("/repos/octo/skills/tags")
            .unwrap_err();
        assert!(err.is_rate_limited());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_missing_repo_default_branch_is_source_not_found() {
        let base = serve_once(404, "Not Found", r#"{"message":"Not Found"}"#);
        let err = client(base).default_branch("octo", "gone").unwrap_err();
        assert!(matches!(err, SkilletError::SourceNotFound { .. }));
    }

    #[test]
    fn test_archive_url_shape() {
        let c = client("https://api.example.test".to_string());
        assert_eq!(
            c.archive_url("octo", "skills", "abc123"),
            "https://api.example.test/repos/octo/skills/tarball/abc123"
        );
    }

    #[test]
    fn test_with_retry_recovers_from_transient_failure() {
        let mut attempts = 0;
        let result = with_retry(|| {
            attempts += 1;
            if attempts < 3 {
                Err(SkilletError::network("connection reset"))
            } else {
                Ok(attempts)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_with_retry_stops_after_three_attempts() {
        let mut attempts = 0;
        let result: Result<()> = with_retry(|| {
            attempts += 1;
            Err(SkilletError::network("still down"))
        });
        assert!(result.is_err());
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_with_retry_skips_non_retryable_errors() {
        let mut attempts = 0;
        let result: Result<()> = with_retry(|| {
            attempts += 1;
            Err(SkilletError::ValidationFailed {
                name: "notes".to_string(),
                message: "bad manifest".to_string(),
            })
        });
        assert!(result.is_err());
        assert_eq!(attempts, 1);
    }
}
