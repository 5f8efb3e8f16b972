//! Installed-state verification against the lockfile

use std::fmt;
use std::path::Path;

use crate::config::lockfile::LockEntry;
use crate::hash;
use crate::validator;

/// Condition of one installed skill relative to its lock entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyStatus {
    /// Present and consistent
    Ok,
    /// Install path does not exist
    Missing,
    /// Present but inconsistent with the lock entry
    Modified,
    /// Symlink exists but its target is gone
    BrokenSymlink,
}

impl VerifyStatus {
    pub fn is_ok(self) -> bool {
        self == VerifyStatus::Ok
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            VerifyStatus::Ok => "ok",
            VerifyStatus::Missing => "missing",
            VerifyStatus::Modified => "modified",
            VerifyStatus::BrokenSymlink => "broken symlink",
        };
        write!(f, "{text}")
    }
}

/// Check one lock entry against the filesystem
///
/// Checksum comparison only happens when `verify_checksums` is set; the
/// default check is structural (existence, link kind, manifest presence).
pub fn verify(entry: &LockEntry, installed: &Path, verify_checksums: bool) -> VerifyStatus {
    let Ok(meta) = std::fs::symlink_metadata(installed) else {
        return VerifyStatus::Missing;
    };

    if entry.symlink {
        if !meta.file_type().is_symlink() {
            return VerifyStatus::Modified;
        }
        // exists() follows the link
        if !installed.exists() {
            return VerifyStatus::BrokenSymlink;
        }
    } else if meta.file_type().is_symlink() {
        return VerifyStatus::Modified;
    }

    let manifest = validator::manifest_path(installed);
    if !manifest.is_file() {
        return VerifyStatus::Modified;
    }

    if verify_checksums {
        match hash::hash_file(&manifest) {
            Ok(actual) if hash::verify_hash(&entry.checksum, &actual) => {}
            _ => return VerifyStatus::Modified,
        }
    }

    VerifyStatus::Ok
}
