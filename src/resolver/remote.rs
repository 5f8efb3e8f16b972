//! Remote revision resolution against a metadata provider
//!
//! Every constraint ends in a full commit SHA. Semver constraints enumerate
//! the repository's tags; `latest` walks its releases; refs and branches go
//! through the commit and branch endpoints directly.

use chrono::{DateTime, Utc};

use crate::error::{Result, SkilletError};
use crate::github::RemoteMetadata;
use crate::resolver::{ResolvedRevision, VersionConstraint};

const SHORT_SHA_LEN: usize = 7;

/// Resolve a remote source to an immutable revision
pub fn resolve_remote(
    provider: &dyn RemoteMetadata,
    owner: &str,
    repo: &str,
    constraint: &VersionConstraint,
) -> Result<ResolvedRevision> {
    let (label, sha) = match constraint {
        VersionConstraint::ExactTag(tag) => {
            let sha = provider.tag_commit(owner, repo, tag)?.ok_or_else(|| {
                SkilletError::SourceNotFound {
                    what: format!("tag '{tag}' in {owner}/{repo}"),
                }
            })?;
            (tag.clone(), sha)
        }
        VersionConstraint::SemverCaret(base) | VersionConstraint::SemverTilde(base) => {
            let upper = match constraint {
                VersionConstraint::SemverCaret(_) => semver::Version::new(base.major + 1, 0, 0),
                _ => semver::Version::new(base.major, base.minor + 1, 0),
            };
            let tag = best_matching_tag(provider, owner, repo, base, &upper)?.ok_or_else(|| {
                SkilletError::NoMatchingVersion {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    constraint: constraint.to_string(),
                }
            })?;
            let sha = provider.tag_commit(owner, repo, &tag)?.ok_or_else(|| {
                SkilletError::SourceNotFound {
                    what: format!("tag '{tag}' in {owner}/{repo}"),
                }
            })?;
            (tag, sha)
        }
        VersionConstraint::Latest => {
            let tag = latest_release_tag(provider, owner, repo)?.ok_or_else(|| {
                SkilletError::NoMatchingVersion {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    constraint: constraint.to_string(),
                }
            })?;
            let sha = provider.tag_commit(owner, repo, &tag)?.ok_or_else(|| {
                SkilletError::SourceNotFound {
                    what: format!("tag '{tag}' in {owner}/{repo}"),
                }
            })?;
            (tag, sha)
        }
        VersionConstraint::Ref(r) if is_commit_sha(r) => {
            if !provider.commit_exists(owner, repo, r)? {
                return Err(SkilletError::SourceNotFound {
                    what: format!("commit {r} in {owner}/{repo}"),
                });
            }
            (r[..SHORT_SHA_LEN].to_string(), r.clone())
        }
        VersionConstraint::Ref(branch) => branch_revision(provider, owner, repo, branch)?,
        VersionConstraint::DefaultBranch => {
            let branch = provider.default_branch(owner, repo)?;
            branch_revision(provider, owner, repo, &branch)?
        }
    };

    let fetch_locator = Some(provider.archive_url(owner, repo, &sha));
    Ok(ResolvedRevision {
        label,
        immutable_id: sha,
        fetch_locator,
    })
}

fn branch_revision(
    provider: &dyn RemoteMetadata,
    owner: &str,
    repo: &str,
    branch: &str,
) -> Result<(String, String)> {
    let sha = provider
        .branch_head_commit(owner, repo, branch)?
        .ok_or_else(|| SkilletError::SourceNotFound {
            what: format!("branch '{branch}' in {owner}/{repo}"),
        })?;
    let short = &sha[..SHORT_SHA_LEN.min(sha.len())];
    Ok((format!("{branch}@{short}"), sha))
}

fn is_commit_sha(text: &str) -> bool {
    text.len() == 40 && text.chars().all(|c| c.is_ascii_hexdigit())
}

/// Highest tag whose version lands in `[base, upper)`
///
/// Tags parse as semver after stripping a single leading `v`; unparseable
/// tags are ignored. Pre-release tags only participate when the constraint
/// itself carries a pre-release component.
fn best_matching_tag(
    provider: &dyn RemoteMetadata,
    owner: &str,
    repo: &str,
    base: &semver::Version,
    upper: &semver::Version,
) -> Result<Option<String>> {
    let allow_prerelease = !base.pre.is_empty();
    let mut best: Option<(semver::Version, String)> = None;

    for tag in provider.list_tags(owner, repo)? {
        let Ok(version) = semver::Version::parse(tag.strip_prefix('v').unwrap_or(&tag)) else {
            continue;
        };
        if !version.pre.is_empty() && !allow_prerelease {
            continue;
        }
        if version < *base || version >= *upper {
            continue;
        }
        if best.as_ref().is_none_or(|(v, _)| version > *v) {
            best = Some((version, tag));
        }
    }

    Ok(best.map(|(_, tag)| tag))
}

/// Tag of the most recently published non-prerelease, non-draft release
fn latest_release_tag(
    provider: &dyn RemoteMetadata,
    owner: &str,
    repo: &str,
) -> Result<Option<String>> {
    let mut best: Option<(DateTime<Utc>, String)> = None;

    for release in provider.list_releases(owner, repo)? {
        if release.prerelease || release.draft {
            continue;
        }
        let Some(published) = release
            .published_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        else {
            continue;
        };
        let published = published.with_timezone(&Utc);
        if best.as_ref().is_none_or(|(t, _)| published > *t) {
            best = Some((published, release.tag_name));
        }
    }

    Ok(best.map(|(_, tag)| tag))
}
