//! Skillset configuration (skillset.yaml)
//!
//! The file carries two skill sections, `global:` and `project:`, plus an
//! optional `config:` block with run settings. Skill sections accept either a
//! list of mappings or a mapping keyed by skill name.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SkilletError};
use crate::source::SourceReference;

/// Default config file name
pub const SKILLSET_FILE: &str = "skillset.yaml";

/// Where a skill is installed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillScope {
    Global,
    #[default]
    Project,
}

impl SkillScope {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillScope::Global => "global",
            SkillScope::Project => "project",
        }
    }
}

impl fmt::Display for SkillScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A declared skill in skillset.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDeclaration {
    /// Skill name (install directory name unless aliased)
    pub name: String,

    /// Source string, e.g. `remote:owner/repo/path` or `local:./dir`
    pub source: String,

    /// Version constraint: exact tag, `^X.Y.Z`, `~X.Y.Z`, or `latest`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Git ref: branch name or 40-hex commit SHA
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    /// Install directory name override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Disabled skills are skipped entirely
    #[serde(default = "default_enabled", skip_serializing_if = "is_true")]
    pub enabled: bool,

    /// Scope is implied by the section, never written per skill
    #[serde(skip)]
    pub scope: SkillScope,
}

fn default_enabled() -> bool {
    true
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn is_true(v: &bool) -> bool {
    *v
}

impl Default for SkillDeclaration {
    fn default() -> Self {
        Self {
            name: String::new(),
            source: String::new(),
            version: None,
            reference: None,
            alias: None,
            enabled: true,
            scope: SkillScope::Project,
        }
    }
}

impl SkillDeclaration {
    /// Name of the directory the skill installs into
    pub fn install_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Validate the declaration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(SkilletError::ConfigInvalid {
                message: "skill name cannot be empty".to_string(),
            });
        }
        if self.version.is_some() && self.reference.is_some() {
            return Err(SkilletError::ConfigInvalid {
                message: format!(
                    "skill '{}' declares both 'version' and 'ref'; pick one",
                    self.name
                ),
            });
        }
        SourceReference::parse(&self.source)?;
        Ok(())
    }
}

/// Run settings from the `config:` block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkillsetSettings {
    /// Worker count for the install orchestrator, 1-10
    pub parallel_downloads: usize,

    /// Name of the environment variable holding the API token
    pub github_token_env: String,

    /// Cache root override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Cache entries unused longer than this are swept by `cache clean`
    pub cache_retention_days: u64,

    /// Promote manifest validation warnings to errors
    pub strict: bool,

    /// Per-item fetch timeout in seconds
    pub timeout_secs: u64,
}

impl Default for SkillsetSettings {
    fn default() -> Self {
        Self {
            parallel_downloads: 4,
            github_token_env: "GITHUB_TOKEN".to_string(),
            cache_dir: None,
            cache_retention_days: 30,
            strict: false,
            timeout_secs: 300,
        }
    }
}

impl SkillsetSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10).contains(&self.parallel_downloads) {
            return Err(SkilletError::ConfigInvalid {
                message: format!(
                    "parallel_downloads must be between 1 and 10, got {}",
                    self.parallel_downloads
                ),
            });
        }
        Ok(())
    }
}

/// Complete skillset.yaml representation
#[derive(Debug, Clone, Default)]
pub struct Skillset {
    pub global: Vec<SkillDeclaration>,
    pub project: Vec<SkillDeclaration>,
    pub settings: SkillsetSettings,
}

impl Skillset {
    /// Load and parse a skillset.yaml file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkilletError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| SkilletError::ConfigParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(&text, &path.display().to_string())
    }

    /// Parse skillset.yaml content
    pub fn from_yaml(text: &str, path: &str) -> Result<Self> {
        let doc: serde_yaml::Value =
            serde_yaml::from_str(text).map_err(|e| SkilletError::ConfigParseFailed {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let settings = match doc.get("config") {
            Some(value) => serde_yaml::from_value(value.clone()).map_err(|e| {
                SkilletError::ConfigParseFailed {
                    path: path.to_string(),
                    reason: format!("config section: {e}"),
                }
            })?,
            None => SkillsetSettings::default(),
        };

        let skillset = Self {
            global: parse_skill_section(doc.get("global"), "global", SkillScope::Global)?,
            project: parse_skill_section(doc.get("project"), "project", SkillScope::Project)?,
            settings,
        };
        skillset.validate()?;
        Ok(skillset)
    }

    fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        let mut seen = BTreeSet::new();
        for decl in self.all() {
            decl.validate()?;
            if !seen.insert((decl.scope, decl.name.clone())) {
                return Err(SkilletError::DuplicateSkill {
                    name: decl.name.clone(),
                    scope: decl.scope.to_string(),
                });
            }
        }
        Ok(())
    }

    /// All declared skills, global section first
    pub fn all(&self) -> impl Iterator<Item = &SkillDeclaration> {
        self.global.iter().chain(self.project.iter())
    }

    /// Declared skills that are enabled
    pub fn enabled(&self) -> Vec<&SkillDeclaration> {
        self.all().filter(|d| d.enabled).collect()
    }

    /// Find a skill by name and optional scope
    pub fn get(&self, name: &str, scope: Option<SkillScope>) -> Option<&SkillDeclaration> {
        self.all()
            .find(|d| d.name == name && scope.is_none_or(|s| d.scope == s))
    }

    /// Append a new declaration, rejecting duplicates within its scope
    pub fn add(&mut self, decl: SkillDeclaration) -> Result<()> {
        decl.validate()?;
        if self.get(&decl.name, Some(decl.scope)).is_some() {
            return Err(SkilletError::DuplicateSkill {
                name: decl.name,
                scope: decl.scope.to_string(),
            });
        }
        match decl.scope {
            SkillScope::Global => self.global.push(decl),
            SkillScope::Project => self.project.push(decl),
        }
        Ok(())
    }

    /// Serialize back to YAML (list format for skill sections)
    pub fn to_yaml(&self) -> Result<String> {
        #[derive(Serialize)]
        struct Doc<'a> {
            #[serde(skip_serializing_if = "<[_]>::is_empty")]
            global: &'a [SkillDeclaration],
            #[serde(skip_serializing_if = "<[_]>::is_empty")]
            project: &'a [SkillDeclaration],
            config: &'a SkillsetSettings,
        }
        let doc = Doc {
            global: &self.global,
            project: &self.project,
            config: &self.settings,
        };
        Ok(serde_yaml::to_string(&doc)?)
    }

    /// Write the skillset back to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_yaml()?).map_err(|e| SkilletError::IoError {
            message: format!("failed to write {}: {}", path.display(), e),
        })
    }
}

/// Parse one skill section, accepting list and name-keyed mapping formats
fn parse_skill_section(
    data: Option<&serde_yaml::Value>,
    section: &str,
    scope: SkillScope,
) -> Result<Vec<SkillDeclaration>> {
    let Some(data) = data else {
        return Ok(vec![]);
    };

    match data {
        serde_yaml::Value::Null => Ok(vec![]),
        serde_yaml::Value::Sequence(items) => items
            .iter()
            .map(|item| {
                let mut decl: SkillDeclaration =
                    serde_yaml::from_value(item.clone()).map_err(|e| {
                        SkilletError::ConfigInvalid {
                            message: format!("invalid skill in '{section}' section: {e}"),
                        }
                    })?;
                decl.scope = scope;
                Ok(decl)
            })
            .collect(),
        serde_yaml::Value::Mapping(map) => {
            // A bare mapping with a 'name' key is a single skill written
            // without either accepted wrapper; reject with the fix spelled out.
            if map.get("name").is_some() {
                return Err(SkilletError::ConfigInvalid {
                    message: format!(
                        "single skill mapping in '{section}' section is not supported; \
                         use a list entry ('- name: ...') or key the mapping by skill name"
                    ),
                });
            }
            map.iter()
                .map(|(key, value)| {
                    let name = key.as_str().ok_or_else(|| SkilletError::ConfigInvalid {
                        message: format!("non-string skill name in '{section}' section"),
                    })?;
                    if !value.is_mapping() {
                        return Err(SkilletError::ConfigInvalid {
                            message: format!(
                                "invalid skill definition for '{name}' in '{section}': \
                                 expected a mapping"
                            ),
                        });
                    }
                    let mut decl: SkillDeclaration = serde_yaml::from_value(with_name(
                        value.clone(),
                        name,
                    ))
                    .map_err(|e| SkilletError::ConfigInvalid {
                        message: format!("invalid skill '{name}' in '{section}': {e}"),
                    })?;
                    decl.scope = scope;
                    Ok(decl)
                })
                .collect()
        }
        other => Err(SkilletError::ConfigInvalid {
            message: format!(
                "invalid '{section}' section: expected a list or mapping, got {}",
                yaml_kind(other)
            ),
        }),
    }
}

fn with_name(mut value: serde_yaml::Value, name: &str) -> serde_yaml::Value {
    if let serde_yaml::Value::Mapping(map) = &mut value {
        map.insert(
            serde_yaml::Value::String("name".to_string()),
            serde_yaml::Value::String(name.to_string()),
        );
    }
    value
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "bool",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "list",
        serde_yaml::Value::Mapping(_) => "mapping",
        serde_yaml::Value::Tagged(_) => "tagged value",
    }
}
