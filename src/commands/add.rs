//! Add command implementation
//!
//! Installs the whole set including the new declaration before touching
//! skillset.yaml, so a source that fails to resolve or validate never
//! lands in the config.

use std::path::{Path, PathBuf};

use crate::cli::AddArgs;
use crate::config::skillset::{SKILLSET_FILE, SkillDeclaration, SkillScope, Skillset};
use crate::context::RunContext;
use crate::error::{Result, SkilletError};
use crate::installer::InstallOutcome;
use crate::source::SourceReference;
use crate::validator;

/// Run add command
pub fn run(project: Option<PathBuf>, args: AddArgs, verbose: bool) -> Result<i32> {
    let project_dir = super::project_dir(project)?;
    let config_path = project_dir.join(SKILLSET_FILE);

    let mut skillset = if config_path.is_file() {
        Skillset::load(&config_path)?
    } else {
        Skillset::default()
    };

    let source = normalize_source(&args.source);
    let parsed = SourceReference::parse(&source)?;
    let name = match args.name {
        Some(name) => name,
        None => infer_name(&parsed)?,
    };
    if !validator::is_valid_skill_name(&name) {
        return Err(SkilletError::ConfigInvalid {
            message: format!("'{name}' is not a valid skill name; pass one with --name"),
        });
    }

    let scope = if args.global {
        SkillScope::Global
    } else {
        SkillScope::Project
    };
    skillset.add(SkillDeclaration {
        name: name.clone(),
        source,
        version: args.version,
        reference: args.reference,
        alias: None,
        enabled: true,
        scope,
    })?;

    let ctx = RunContext::new(project_dir, skillset.settings.clone())?;
    let report = super::install::converge(&ctx, &skillset, None, false, verbose)?;

    let added = report
        .outcomes
        .iter()
        .find(|o| o.scope() == scope && o.name() == name);
    if added.is_some_and(InstallOutcome::is_failed) {
        return Err(SkilletError::InstallationFailed {
            name: name.clone(),
            message: "skill could not be installed; skillset.yaml left unchanged".to_string(),
        });
    }

    println!("Found skill: {name}");
    skillset.save(&config_path)?;
    println!("Added '{name}' to {}", config_path.display());

    Ok(i32::from(report.has_failures()))
}

/// Accept bare `owner/repo[/path]` and plain directory paths as shorthand
fn normalize_source(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("remote:") || trimmed.starts_with("local:") {
        return trimmed.to_string();
    }
    if trimmed.starts_with("./")
        || trimmed.starts_with("../")
        || trimmed.starts_with('/')
        || trimmed.starts_with("~/")
        || Path::new(trimmed).is_dir()
    {
        return format!("local:{trimmed}");
    }
    format!("remote:{trimmed}")
}

/// Default skill name: last path segment of the source
fn infer_name(source: &SourceReference) -> Result<String> {
    match source {
        SourceReference::Remote { repo, subpath, .. } => Ok(subpath
            .as_deref()
            .and_then(|sub| sub.rsplit('/').next())
            .unwrap_or(repo)
            .to_string()),
        SourceReference::Local { path } => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| SkilletError::ConfigInvalid {
                message: format!(
                    "cannot infer a skill name from '{}'; pass one with --name",
                    path.display()
                ),
            }),
    }
}
