//! Install orchestration
//!
//! Fans declared skills out over a bounded worker pool, collects per-item
//! outcomes, and writes the next lockfile generation exactly once. Failures
//! never cross item boundaries; the batch always runs to completion and the
//! lockfile reflects whatever actually happened.

use std::thread;

use crossbeam_channel::unbounded;

use crate::config::lockfile::{LockEntry, Lockfile};
use crate::config::skillset::{SkillDeclaration, SkillScope};
use crate::context::RunContext;
use crate::error::Result;
use crate::installer::{InstallOutcome, InstallState, ItemInstaller};

/// Observer invoked from worker threads as items move through their stages
pub type InstallObserver<'a> = &'a (dyn Fn(&str, InstallState) + Sync);

/// Outcome of a whole install run
#[derive(Debug)]
pub struct InstallReport {
    /// Per-item outcomes, ordered by (scope, name)
    pub outcomes: Vec<InstallOutcome>,
}

impl InstallReport {
    pub fn installed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, InstallOutcome::Installed(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, InstallOutcome::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }
}

/// Install every declaration in scope, then reconcile and write the lockfile
///
/// `declarations` must carry ALL enabled skills even when `scope` narrows the
/// work list: the reconcile step treats undeclared entries as removed, so a
/// scoped run handed only its own scope would wipe the other scope's records.
pub fn install_all(
    ctx: &RunContext,
    declarations: &[&SkillDeclaration],
    scope: Option<SkillScope>,
    force: bool,
    observer: InstallObserver<'_>,
) -> Result<InstallReport> {
    let prior = Lockfile::load(&ctx.lock_path())?.unwrap_or_default();
    let cache = ctx.content_cache();
    let client = ctx.github_client();
    let installer = ItemInstaller::new(ctx, &cache, &client, &prior, force);

    let targets: Vec<&SkillDeclaration> = declarations
        .iter()
        .copied()
        .filter(|d| scope.is_none_or(|s| d.scope == s))
        .collect();

    let workers = ctx
        .settings
        .parallel_downloads
        .clamp(1, 10)
        .min(targets.len().max(1));

    let (work_tx, work_rx) = unbounded::<&SkillDeclaration>();
    let (result_tx, result_rx) = unbounded::<InstallOutcome>();
    for decl in &targets {
        let _ = work_tx.send(*decl);
    }
    drop(work_tx);

    thread::scope(|scope| {
        for _ in 0..workers {
            let work_rx = work_rx.clone();
            let result_tx = result_tx.clone();
            let installer = &installer;
            scope.spawn(move || {
                while let Ok(decl) = work_rx.recv() {
                    let name = decl.install_name().to_string();
                    let outcome = installer.install(decl, &|state| observer(&name, state));
                    if result_tx.send(outcome).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut outcomes: Vec<InstallOutcome> = result_rx.iter().collect();
    outcomes.sort_by(|a, b| {
        (a.scope(), a.name()).cmp(&(b.scope(), b.name()))
    });

    let declared: Vec<(SkillScope, String)> = declarations
        .iter()
        .map(|d| (d.scope, d.install_name().to_string()))
        .collect();
    let installed: Vec<LockEntry> = outcomes
        .iter()
        .filter_map(|o| match o {
            InstallOutcome::Installed(entry) => Some(entry.clone()),
            _ => None,
        })
        .collect();

    let next = Lockfile::reconcile(&prior, &declared, installed);
    next.save(&ctx.lock_path())?;

    Ok(InstallReport { outcomes })
}
