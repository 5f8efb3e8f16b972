//! List command implementation
//!
//! Shows every declared skill with its source and, when the lockfile has a
//! record for it, the installed version.

use std::path::PathBuf;

use console::Style;

use crate::cli::{ListArgs, ScopeArg};
use crate::config::lockfile::Lockfile;
use crate::config::skillset::Skillset;
use crate::context::RunContext;
use crate::error::Result;

/// Run list command
pub fn run(project: Option<PathBuf>, args: ListArgs) -> Result<()> {
    let project_dir = super::project_dir(project)?;
    let ctx = RunContext::for_project(project_dir)?;

    let skillset = if ctx.config_path().is_file() {
        ctx.load_skillset()?
    } else {
        Skillset::default()
    };
    let lock = Lockfile::load(&ctx.lock_path())?.unwrap_or_default();

    let scope = args.scope.map(ScopeArg::to_scope);
    let declarations: Vec<_> = skillset
        .all()
        .filter(|d| scope.is_none_or(|s| d.scope == s))
        .collect();

    if declarations.is_empty() {
        println!("No skills declared.");
        return Ok(());
    }

    println!("Declared skills ({}):", declarations.len());
    println!();
    for decl in declarations {
        let name = decl.install_name();
        println!(
            "  {} [{}]",
            Style::new().bold().yellow().apply_to(name),
            decl.scope
        );
        println!(
            "    {} {}",
            Style::new().bold().apply_to("Source:"),
            decl.source
        );
        if !decl.enabled {
            println!("    {}", Style::new().dim().apply_to("Disabled"));
            println!();
            continue;
        }
        match lock.get(decl.scope, name) {
            Some(entry) => {
                let short = entry
                    .resolved_commit
                    .get(..7)
                    .unwrap_or(&entry.resolved_commit);
                println!(
                    "    {} {} ({})",
                    Style::new().bold().apply_to("Installed:"),
                    entry.resolved_version,
                    short
                );
            }
            None => println!("    {}", Style::new().dim().apply_to("Not installed")),
        }
        println!();
    }

    Ok(())
}
