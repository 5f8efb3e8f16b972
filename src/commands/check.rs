//! Check command implementation
//!
//! Exit codes: 0 when everything verifies, 1 on drift, 2 when no lockfile
//! exists yet.

use std::path::PathBuf;

use crate::checker;
use crate::cli::CheckArgs;
use crate::config::lockfile::Lockfile;
use crate::context::RunContext;
use crate::error::Result;

/// Run check command
pub fn run(project: Option<PathBuf>, args: CheckArgs, verbose: bool) -> Result<i32> {
    let project_dir = super::project_dir(project)?;
    let ctx = RunContext::for_project(project_dir)?;
    let skillset = ctx.load_skillset()?;

    let Some(lock) = Lockfile::load(&ctx.lock_path())? else {
        eprintln!("No lockfile found; run 'skillet install' first.");
        return Ok(2);
    };

    let mut drifted = 0usize;
    let declarations = skillset.enabled();
    for decl in &declarations {
        let name = decl.install_name();
        match lock.get(decl.scope, name) {
            None => {
                println!("  {name} [{}]: not installed", decl.scope);
                drifted += 1;
            }
            Some(entry) => {
                let installed = ctx.install_path(decl.scope, name);
                let status = checker::verify(entry, &installed, args.verify_checksums);
                if status.is_ok() {
                    if verbose {
                        println!("  {name} [{}]: ok", decl.scope);
                    }
                } else {
                    println!("  {name} [{}]: {status}", decl.scope);
                    drifted += 1;
                }
            }
        }
    }

    // Entries whose declaration was removed stay drift until the next
    // install run reconciles them away.
    for entry in lock.entries() {
        let declared = declarations
            .iter()
            .any(|d| d.scope == entry.scope && d.install_name() == entry.name);
        if !declared {
            println!("  {} [{}]: no longer declared", entry.name, entry.scope);
            drifted += 1;
        }
    }

    if drifted == 0 {
        println!("{} skill(s) verified.", declarations.len());
        Ok(0)
    } else {
        println!("{drifted} skill(s) drifted; run 'skillet install' to reconcile.");
        Ok(1)
    }
}
