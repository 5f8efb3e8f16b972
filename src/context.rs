//! Shared run context
//!
//! One `RunContext` is built per invocation from the project directory and
//! the loaded settings. It knows where everything lives: install roots, the
//! configuration and lock files, the cache, and the GitHub credentials.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::{self, ContentCache};
use crate::config::lockfile::LOCK_FILE;
use crate::config::skillset::{SKILLSET_FILE, SkillScope, Skillset, SkillsetSettings};
use crate::error::{Result, SkilletError};
use crate::extract::ExtractLimits;
use crate::github::GitHubClient;

/// Install root subdirectory, relative to home or the project directory
pub const SKILLS_SUBDIR: &str = ".claude/skills";

/// Everything a command needs to know about the current run
pub struct RunContext {
    pub project_dir: PathBuf,
    /// Directory of the declaring configuration file; relative local sources
    /// resolve against it. Usually the project directory.
    pub config_dir: PathBuf,
    pub home_dir: PathBuf,
    pub settings: SkillsetSettings,
    pub cache_root: PathBuf,
    pub token: Option<String>,
    pub limits: ExtractLimits,
}

impl RunContext {
    pub fn new(project_dir: PathBuf, settings: SkillsetSettings) -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| SkilletError::IoError {
            message: "cannot determine home directory".to_string(),
        })?;
        let cache_root = cache::cache_root(settings.cache_dir.as_deref())?;
        let token = std::env::var(&settings.github_token_env)
            .ok()
            .filter(|t| !t.is_empty());
        Ok(Self {
            config_dir: project_dir.clone(),
            project_dir,
            home_dir,
            settings,
            cache_root,
            token,
            limits: ExtractLimits::default(),
        })
    }

    /// Context for a project that may not have a skillset.yaml yet
    pub fn for_project(project_dir: PathBuf) -> Result<Self> {
        let config = project_dir.join(SKILLSET_FILE);
        let settings = if config.is_file() {
            Skillset::load(&config)?.settings
        } else {
            SkillsetSettings::default()
        };
        Self::new(project_dir, settings)
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_dir.join(SKILLSET_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.project_dir.join(LOCK_FILE)
    }

    /// Directory skills of a scope are installed under
    pub fn install_root(&self, scope: SkillScope) -> PathBuf {
        match scope {
            SkillScope::Global => self.home_dir.join(SKILLS_SUBDIR),
            SkillScope::Project => self.project_dir.join(SKILLS_SUBDIR),
        }
    }

    /// Final path of one installed skill
    pub fn install_path(&self, scope: SkillScope, name: &str) -> PathBuf {
        self.install_root(scope).join(name)
    }

    pub fn content_cache(&self) -> ContentCache {
        ContentCache::new(self.cache_root.clone())
    }

    pub fn github_client(&self) -> GitHubClient {
        GitHubClient::from_env(
            self.token.clone(),
            Duration::from_secs(self.settings.timeout_secs),
        )
    }

    pub fn load_skillset(&self) -> Result<Skillset> {
        Skillset::load(&self.config_path())
    }
}
