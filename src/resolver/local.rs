//! Local source resolution
//!
//! Local skills live on disk next to the configuration that declares them.
//! Their identity is a fingerprint of the manifest bytes, so edits to
//! SKILL.md show up as a new revision on the next run.

use std::path::{Path, PathBuf};

use crate::error::{Result, SkilletError};
use crate::hash;
use crate::validator::{self, MANIFEST_FILE};

const LABEL_HEX_LEN: usize = 8;

/// A local skill directory pinned by its manifest fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSkill {
    /// Absolute path to the skill root
    pub root: PathBuf,
    /// Version label, `local@` plus the fingerprint's first 8 hex chars
    pub label: String,
    /// Full hex SHA-256 of the manifest bytes
    pub fingerprint: String,
}

/// Resolve a declared local path
///
/// A leading `~/` expands to the home directory; relative paths resolve
/// against `config_dir`, the directory holding the declaring skillset.yaml.
pub fn resolve_local(declared: &Path, config_dir: &Path) -> Result<LocalSkill> {
    let expanded = expand_tilde(declared)?;
    let root = if expanded.is_absolute() {
        expanded
    } else {
        config_dir.join(expanded)
    };

    if !root.is_dir() {
        return Err(SkilletError::SourceNotFound {
            what: format!("local path {}", root.display()),
        });
    }

    let root = root.canonicalize().map_err(|e| SkilletError::IoError {
        message: format!("failed to canonicalize {}: {}", root.display(), e),
    })?;

    let manifest = validator::manifest_path(&root);
    if !manifest.is_file() {
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        return Err(SkilletError::ValidationFailed {
            name,
            message: format!("{MANIFEST_FILE} not found at {}", root.display()),
        });
    }

    let fingerprint = hash::digest_hex(&manifest)?;
    let label = format!("local@{}", &fingerprint[..LABEL_HEX_LEN]);

    Ok(LocalSkill {
        root,
        label,
        fingerprint,
    })
}

fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs::home_dir().ok_or_else(|| SkilletError::IoError {
        message: "cannot expand '~': home directory unknown".to_string(),
    })?;
    Ok(home.join(rest))
}
