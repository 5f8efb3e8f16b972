//! SKILL.md manifest validation
//!
//! A skill root must carry a `SKILL.md` with YAML frontmatter between `---`
//! delimiter lines. The frontmatter needs a `name` matching
//! `^[a-z0-9-]{1,64}$` and a non-empty `description`; everything else is kept
//! as metadata.

use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::error::{Result, SkilletError};

/// Manifest file name at a skill root
pub const MANIFEST_FILE: &str = "SKILL.md";

/// Longest description that passes without a warning
const MAX_DESCRIPTION_CHARS: usize = 1024;

/// Result of validating one skill root
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: serde_yaml::Mapping,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Declared skill name from the frontmatter, when present
    pub fn name(&self) -> Option<&str> {
        self.metadata.get("name").and_then(Value::as_str)
    }

    /// Declared description from the frontmatter, when present
    pub fn description(&self) -> Option<&str> {
        self.metadata.get("description").and_then(Value::as_str)
    }

    /// Convert to a terminal error for the named item when invalid
    pub fn into_result(self, item: &str) -> Result<Self> {
        if self.is_valid() {
            Ok(self)
        } else {
            Err(SkilletError::ValidationFailed {
                name: item.to_string(),
                message: self.errors.join("; "),
            })
        }
    }
}

/// Path of the manifest inside a skill root
pub fn manifest_path(root: &Path) -> PathBuf {
    root.join(MANIFEST_FILE)
}

/// Check a skill name against `^[a-z0-9-]{1,64}$`
pub fn is_valid_skill_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Parse content into YAML frontmatter (between the first two `---` lines)
/// and body. Returns `None` when the delimiters are missing or the
/// frontmatter is not a mapping.
pub fn parse_frontmatter(content: &str) -> Option<(serde_yaml::Mapping, String)> {
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 3 || lines[0].trim() != "---" {
        return None;
    }
    let end_idx = lines[1..].iter().position(|l| l.trim() == "---")? + 1;
    let frontmatter_str = lines[1..end_idx].join("\n");
    let body = lines[end_idx + 1..].join("\n");
    let value: Value = serde_yaml::from_str(&frontmatter_str).ok()?;
    match value {
        Value::Mapping(map) => Some((map, body)),
        _ => None,
    }
}

/// Validate the skill rooted at `root`
///
/// Returns `Ok` with a report whether or not the manifest passes; only an
/// unreadable existing file is an `Err`. Under `strict`, warnings are
/// promoted to errors.
pub fn validate(root: &Path, strict: bool) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();

    let manifest = manifest_path(root);
    if !manifest.is_file() {
        report.errors.push(format!("{MANIFEST_FILE} not found"));
        return Ok(report);
    }

    let content = std::fs::read_to_string(&manifest).map_err(|e| SkilletError::IoError {
        message: format!("failed to read {}: {}", manifest.display(), e),
    })?;

    let Some((frontmatter, body)) = parse_frontmatter(&content) else {
        report
            .errors
            .push("missing or malformed YAML frontmatter".to_string());
        return Ok(report);
    };
    report.metadata = frontmatter;

    check_name(&mut report);
    check_description(&mut report);

    if body.trim().is_empty() {
        report
            .warnings
            .push("manifest body is empty".to_string());
    }

    if strict {
        report.errors.append(&mut report.warnings);
    }

    Ok(report)
}

fn check_name(report: &mut ValidationReport) {
    match report.name() {
        None => report
            .errors
            .push("frontmatter is missing required field 'name'".to_string()),
        Some(name) if !is_valid_skill_name(name) => report.errors.push(format!(
            "invalid name '{name}': must be 1-64 lowercase letters, digits, or hyphens"
        )),
        Some(_) => {}
    }
}

fn check_description(report: &mut ValidationReport) {
    match report.description() {
        None => report
            .errors
            .push("frontmatter is missing required field 'description'".to_string()),
        Some(desc) if desc.trim().is_empty() => report
            .errors
            .push("'description' cannot be empty".to_string()),
        Some(desc) if desc.chars().count() > MAX_DESCRIPTION_CHARS => {
            report.warnings.push(format!(
                "description is longer than {MAX_DESCRIPTION_CHARS} characters"
            ));
        }
        Some(_) => {}
    }
}
