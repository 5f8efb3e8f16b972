//! Lockfile (skillset.lock) handling
//!
//! The lockfile records what was installed, at which revision, with what
//! checksum. It is regenerated wholesale on every run and keyed by
//! (scope, name) with BTreeMap ordering, so repeated runs over unchanged
//! inputs produce byte-identical output. Concurrent processes writing the
//! same lockfile are last-writer-wins; the file is always recoverable by
//! re-running install.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::skillset::SkillScope;
use crate::error::{Result, SkilletError};

/// Default lockfile name
pub const LOCK_FILE: &str = "skillset.lock";

/// Current lockfile format version
pub const LOCK_VERSION: u32 = 1;

/// A resolved, installed skill in the lockfile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Skill name
    pub name: String,

    /// Install scope
    pub scope: SkillScope,

    /// Declared source string
    pub source: String,

    /// Human-facing resolved version label, e.g. `v1.2.3` or `main@abc1234`
    pub resolved_version: String,

    /// Full commit SHA for remote sources, content fingerprint for local ones
    pub resolved_commit: String,

    /// When the skill was installed
    pub installed_at: DateTime<Utc>,

    /// Prefixed SHA-256 of the installed manifest
    pub checksum: String,

    /// Whether the installed path is a symlink to a local source
    #[serde(default)]
    pub symlink: bool,

    /// Original path for symlinked local sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_path: Option<String>,
}

/// Lockfile structure (skillset.lock)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lockfile {
    /// Format version
    pub version: u32,

    /// When this lockfile was written
    pub generated_at: DateTime<Utc>,

    /// Entries keyed by scope, then name
    pub skills: BTreeMap<SkillScope, BTreeMap<String, LockEntry>>,
}

impl Default for Lockfile {
    fn default() -> Self {
        Self::new()
    }
}

impl Lockfile {
    /// Create an empty lockfile
    pub fn new() -> Self {
        Self {
            version: LOCK_VERSION,
            generated_at: Utc::now(),
            skills: BTreeMap::new(),
        }
    }

    /// Parse a lockfile from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SkilletError::ConfigParseFailed {
            path: LOCK_FILE.to_string(),
            reason: e.to_string(),
        })
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SkilletError::ConfigParseFailed {
                path: LOCK_FILE.to_string(),
                reason: e.to_string(),
            })?;
        Ok(format!("{json}\n"))
    }

    /// Load the lockfile if it exists
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path).map_err(|e| SkilletError::IoError {
            message: format!("failed to read {}: {}", path.display(), e),
        })?;
        Ok(Some(Self::from_json(&text)?))
    }

    /// Write the lockfile to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?).map_err(|e| SkilletError::IoError {
            message: format!("failed to write {}: {}", path.display(), e),
        })
    }

    /// Find an entry by scope and name
    pub fn get(&self, scope: SkillScope, name: &str) -> Option<&LockEntry> {
        self.skills.get(&scope).and_then(|m| m.get(name))
    }

    /// Insert or overwrite an entry
    pub fn insert(&mut self, entry: LockEntry) {
        self.skills
            .entry(entry.scope)
            .or_default()
            .insert(entry.name.clone(), entry);
    }

    /// All entries in (scope, name) order
    pub fn entries(&self) -> Vec<&LockEntry> {
        self.skills.values().flat_map(BTreeMap::values).collect()
    }

    /// Total entry count
    pub fn len(&self) -> usize {
        self.skills.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Build the next lockfile generation from a prior one
    ///
    /// Entries in `installed` overwrite their (scope, name) slot. Prior
    /// entries survive only while still declared, so failed and skipped
    /// items keep their last good record and removed items disappear.
    pub fn reconcile(
        prior: &Lockfile,
        declared: &[(SkillScope, String)],
        installed: Vec<LockEntry>,
    ) -> Lockfile {
        let mut next = Lockfile::new();

        for (scope, name) in declared {
            if let Some(entry) = prior.get(*scope, name) {
                next.insert(entry.clone());
            }
        }
        for entry in installed {
            next.insert(entry);
        }

        next
    }
}
