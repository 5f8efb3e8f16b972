//! Per-skill installer
//!
//! Drives one declared skill through resolve, fetch, validate, place. Each
//! stage failure becomes a `Failed` outcome for that item alone; the
//! orchestrator decides what the batch result means. Placement is always
//! atomic: content is staged beside the target and swapped in with a single
//! rename, symlinks replace their occupant in one step.

use std::fs;
use std::path::Path;
use std::time::Instant;

use walkdir::WalkDir;

use crate::cache::{ContentCache, LAST_USED_FILE};
use crate::config::lockfile::{LockEntry, Lockfile};
use crate::config::skillset::{SkillDeclaration, SkillScope};
use crate::context::RunContext;
use crate::error::{Result, SkilletError};
use crate::extract;
use crate::github::{GitHubClient, with_retry};
use crate::hash;
use crate::resolver::{self, VersionConstraint};
use crate::source::SourceReference;
use crate::validator;

/// Reason recorded when an item needs no work
pub const REASON_UP_TO_DATE: &str = "up_to_date";

/// Stages an item moves through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Pending,
    Resolving,
    Fetching,
    Validating,
    Placing,
    Done,
    Failed,
}

impl InstallState {
    pub fn as_str(self) -> &'static str {
        match self {
            InstallState::Pending => "pending",
            InstallState::Resolving => "resolving",
            InstallState::Fetching => "fetching",
            InstallState::Validating => "validating",
            InstallState::Placing => "placing",
            InstallState::Done => "done",
            InstallState::Failed => "failed",
        }
    }
}

/// Terminal result for one declared skill
#[derive(Debug)]
pub enum InstallOutcome {
    Installed(LockEntry),
    Skipped {
        name: String,
        scope: SkillScope,
        reason: String,
    },
    Failed {
        name: String,
        scope: SkillScope,
        error: SkilletError,
    },
}

impl InstallOutcome {
    pub fn name(&self) -> &str {
        match self {
            InstallOutcome::Installed(entry) => &entry.name,
            InstallOutcome::Skipped { name, .. } | InstallOutcome::Failed { name, .. } => name,
        }
    }

    pub fn scope(&self) -> SkillScope {
        match self {
            InstallOutcome::Installed(entry) => entry.scope,
            InstallOutcome::Skipped { scope, .. } | InstallOutcome::Failed { scope, .. } => *scope,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, InstallOutcome::Failed { .. })
    }
}

/// Installs one declared skill at a time
pub struct ItemInstaller<'a> {
    ctx: &'a RunContext,
    cache: &'a ContentCache,
    client: &'a GitHubClient,
    prior: &'a Lockfile,
    force: bool,
}

impl<'a> ItemInstaller<'a> {
    pub fn new(
        ctx: &'a RunContext,
        cache: &'a ContentCache,
        client: &'a GitHubClient,
        prior: &'a Lockfile,
        force: bool,
    ) -> Self {
        Self {
            ctx,
            cache,
            client,
            prior,
            force,
        }
    }

    /// Run the full state machine for one declaration
    ///
    /// Never panics and never returns `Err`; every failure is folded into a
    /// `Failed` outcome so sibling items keep going.
    pub fn install(
        &self,
        decl: &SkillDeclaration,
        on_state: &(dyn Fn(InstallState) + Sync),
    ) -> InstallOutcome {
        let name = decl.install_name().to_string();
        let scope = decl.scope;
        match self.run(decl, &name, on_state) {
            Ok(outcome) => {
                on_state(InstallState::Done);
                outcome
            }
            Err(error) => {
                on_state(InstallState::Failed);
                InstallOutcome::Failed { name, scope, error }
            }
        }
    }

    fn run(
        &self,
        decl: &SkillDeclaration,
        name: &str,
        on_state: &(dyn Fn(InstallState) + Sync),
    ) -> Result<InstallOutcome> {
        let source = SourceReference::parse(&decl.source)?;
        on_state(InstallState::Resolving);

        if !self.force && self.is_up_to_date(decl, name) {
            return Ok(InstallOutcome::Skipped {
                name: name.to_string(),
                scope: decl.scope,
                reason: REASON_UP_TO_DATE.to_string(),
            });
        }

        match source {
            SourceReference::Local { path } => self.install_local(decl, name, &path, on_state),
            SourceReference::Remote {
                owner,
                repo,
                subpath,
            } => self.install_remote(decl, name, &owner, &repo, subpath.as_deref(), on_state),
        }
    }

    /// Prior entry with the same source and a still-present install path
    fn is_up_to_date(&self, decl: &SkillDeclaration, name: &str) -> bool {
        let Some(prior) = self.prior.get(decl.scope, name) else {
            return false;
        };
        prior.source == decl.source
            && fs::symlink_metadata(self.ctx.install_path(decl.scope, name)).is_ok()
    }

    fn install_local(
        &self,
        decl: &SkillDeclaration,
        name: &str,
        declared_path: &Path,
        on_state: &(dyn Fn(InstallState) + Sync),
    ) -> Result<InstallOutcome> {
        let skill = resolver::resolve_local(declared_path, &self.ctx.config_dir)?;

        on_state(InstallState::Validating);
        validator::validate(&skill.root, self.ctx.settings.strict)?
            .into_result(name)?;

        on_state(InstallState::Placing);
        let install_path = self.ctx.install_path(decl.scope, name);
        place_symlink(&skill.root, &install_path, name)?;

        let checksum = hash::hash_file(&validator::manifest_path(&skill.root))?;
        Ok(InstallOutcome::Installed(LockEntry {
            name: name.to_string(),
            scope: decl.scope,
            source: decl.source.clone(),
            resolved_version: skill.label,
            resolved_commit: skill.fingerprint,
            installed_at: chrono::Utc::now(),
            checksum,
            symlink: true,
            resolved_path: Some(skill.root.display().to_string()),
        }))
    }

    fn install_remote(
        &self,
        decl: &SkillDeclaration,
        name: &str,
        owner: &str,
        repo: &str,
        subpath: Option<&str>,
        on_state: &(dyn Fn(InstallState) + Sync),
    ) -> Result<InstallOutcome> {
        let constraint =
            VersionConstraint::from_declaration(decl.version.as_deref(), decl.reference.as_deref())?;
        let revision = resolver::resolve_remote(self.client, owner, repo, &constraint)?;

        on_state(InstallState::Fetching);
        let started = Instant::now();
        let fetched = self.cache.get_or_fetch(&revision.immutable_id, |dest| {
            with_retry(|| {
                let stream = self
                    .client
                    .download_archive(owner, repo, &revision.immutable_id)?;
                extract::extract_tar_gz(stream, dest, &self.ctx.limits)
            })
        });
        let cached = match fetched {
            Ok(path) => path,
            Err(e)
                if e.is_retryable()
                    && started.elapsed().as_secs() >= self.ctx.settings.timeout_secs =>
            {
                return Err(SkilletError::Timeout {
                    name: name.to_string(),
                    secs: self.ctx.settings.timeout_secs,
                });
            }
            Err(e) => return Err(e),
        };
        let content_root = extract::discover_content_root(&cached, subpath)?;

        on_state(InstallState::Validating);
        validator::validate(&content_root, self.ctx.settings.strict)?
            .into_result(name)?;

        on_state(InstallState::Placing);
        let install_path = self.ctx.install_path(decl.scope, name);
        place_directory(&content_root, &install_path, name)?;

        let checksum = hash::hash_file(&validator::manifest_path(&install_path))?;
        Ok(InstallOutcome::Installed(LockEntry {
            name: name.to_string(),
            scope: decl.scope,
            source: decl.source.clone(),
            resolved_version: revision.label,
            resolved_commit: revision.immutable_id,
            installed_at: chrono::Utc::now(),
            checksum,
            symlink: false,
            resolved_path: None,
        }))
    }
}

/// Swap a symlink to `target` into `install_path`
///
/// The target is re-checked immediately before the swap; a local skill
/// deleted mid-run must not leave a dangling link behind.
fn place_symlink(target: &Path, install_path: &Path, name: &str) -> Result<()> {
    let parent = install_parent(install_path, name)?;
    fs::create_dir_all(parent)?;

    if !target.is_dir() {
        return Err(SkilletError::SourceNotFound {
            what: format!("local path {}", target.display()),
        });
    }

    remove_occupant(install_path, name)?;
    make_symlink(target, install_path).map_err(|e| SkilletError::InstallationFailed {
        name: name.to_string(),
        message: format!("failed to link {}: {}", install_path.display(), e),
    })
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn make_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(target, link)
}

/// Stage a copy of `content_root` beside `install_path` and swap it in
fn place_directory(content_root: &Path, install_path: &Path, name: &str) -> Result<()> {
    let parent = install_parent(install_path, name)?;
    fs::create_dir_all(parent)?;

    let stage = tempfile::Builder::new()
        .prefix(".skillet-stage-")
        .tempdir_in(parent)
        .map_err(|e| SkilletError::InstallationFailed {
            name: name.to_string(),
            message: format!("failed to create staging directory: {e}"),
        })?;
    copy_tree(content_root, stage.path())?;

    remove_occupant(install_path, name)?;
    fs::rename(stage.path(), install_path).map_err(|e| SkilletError::InstallationFailed {
        name: name.to_string(),
        message: format!("failed to move skill into place: {e}"),
    })?;
    // The staged path was consumed by the rename; skip TempDir cleanup.
    std::mem::forget(stage);
    Ok(())
}

fn install_parent<'p>(install_path: &'p Path, name: &str) -> Result<&'p Path> {
    install_path
        .parent()
        .ok_or_else(|| SkilletError::InstallationFailed {
            name: name.to_string(),
            message: format!("install path {} has no parent", install_path.display()),
        })
}

/// Remove whatever currently occupies `path`, if anything
fn remove_occupant(path: &Path, name: &str) -> Result<()> {
    let Ok(meta) = fs::symlink_metadata(path) else {
        return Ok(());
    };
    let result = if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(|e| SkilletError::InstallationFailed {
        name: name.to_string(),
        message: format!("failed to remove existing {}: {}", path.display(), e),
    })
}

/// Copy a directory tree without following symlinks
///
/// The cache's `.last-used` stamp is not part of the skill content and is
/// left behind.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| SkilletError::IoError {
            message: format!("failed to walk {}: {}", src.display(), e),
        })?;
        if entry.depth() == 1 && entry.file_name() == std::ffi::OsStr::new(LAST_USED_FILE) {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| SkilletError::IoError {
                message: format!("unexpected path outside {}: {}", src.display(), e),
            })?;
        let target = dst.join(rel);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            make_symlink(&link, &target).map_err(|e| SkilletError::IoError {
                message: format!("failed to copy symlink {}: {}", entry.path().display(), e),
            })?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
