//! Install command implementation
//!
//! Loads the declaration file, runs the batch installer, and prints a
//! per-item summary. Exit code 1 when any item failed, 0 otherwise.

use std::path::PathBuf;

use console::Style;

use crate::cli::{InstallArgs, ScopeArg};
use crate::config::skillset::{SKILLSET_FILE, SkillScope, Skillset};
use crate::context::RunContext;
use crate::error::Result;
use crate::installer::{InstallOutcome, InstallState};
use crate::operations::{InstallReport, install_all};
use crate::progress::InstallProgress;

/// Run install command
pub fn run(project: Option<PathBuf>, args: InstallArgs, verbose: bool) -> Result<i32> {
    let project_dir = super::project_dir(project)?;

    let (skillset, config_dir) = match &args.file {
        Some(file) => {
            let skillset = Skillset::load(file)?;
            // Relative local sources in an alternate file resolve against
            // that file's directory, not the project.
            let dir = match file.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => project_dir.clone(),
            };
            (skillset, dir)
        }
        None => {
            let skillset = Skillset::load(&project_dir.join(SKILLSET_FILE))?;
            (skillset, project_dir.clone())
        }
    };

    let mut ctx = RunContext::new(project_dir, skillset.settings.clone())?;
    ctx.config_dir = config_dir;

    let report = converge(
        &ctx,
        &skillset,
        args.scope.map(ScopeArg::to_scope),
        args.force,
        verbose,
    )?;
    Ok(i32::from(report.has_failures()))
}

/// Install every enabled declaration and print the outcome summary
///
/// Also used by `add`, which inspects the report before persisting the
/// new declaration.
pub fn converge(
    ctx: &RunContext,
    skillset: &Skillset,
    scope: Option<SkillScope>,
    force: bool,
    verbose: bool,
) -> Result<InstallReport> {
    let declarations = skillset.enabled();
    let in_scope = declarations
        .iter()
        .filter(|d| scope.is_none_or(|s| d.scope == s))
        .count();

    let progress = if console::user_attended() {
        InstallProgress::new(in_scope as u64)
    } else {
        InstallProgress::hidden()
    };

    let result = install_all(ctx, &declarations, scope, force, &|name, state| {
        match state {
            InstallState::Resolving => progress.item_started(name),
            InstallState::Done | InstallState::Failed => progress.item_finished(),
            _ => {}
        }
    });
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            progress.abandon();
            return Err(e);
        }
    };
    progress.finish("done");

    for outcome in &report.outcomes {
        match outcome {
            InstallOutcome::Installed(entry) => {
                if verbose {
                    println!("  installed {} ({})", entry.name, entry.resolved_version);
                }
            }
            InstallOutcome::Skipped { name, .. } => {
                if verbose {
                    println!("  up to date {name}");
                }
            }
            InstallOutcome::Failed { name, error, .. } => {
                eprintln!(
                    "  {} {name}: {error}",
                    Style::new().red().apply_to("failed")
                );
            }
        }
    }

    println!(
        "{} installed, {} up to date, {} failed",
        report.installed(),
        report.skipped(),
        report.failed()
    );

    Ok(report)
}
