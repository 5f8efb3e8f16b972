//! Context command implementation

use std::path::PathBuf;

use crate::cli::ContextArgs;
use crate::config::skillset::SkillScope;
use crate::context::RunContext;
use crate::error::{Result, SkilletError};

/// Run context command
pub fn run(project: Option<PathBuf>, args: ContextArgs) -> Result<()> {
    let project_dir = super::project_dir(project)?;
    let ctx = RunContext::for_project(project_dir)?;

    if args.json {
        let value = serde_json::json!({
            "project_dir": ctx.project_dir.display().to_string(),
            "config_path": ctx.config_path().display().to_string(),
            "lock_path": ctx.lock_path().display().to_string(),
            "install_roots": {
                "global": ctx.install_root(SkillScope::Global).display().to_string(),
                "project": ctx.install_root(SkillScope::Project).display().to_string(),
            },
            "cache_root": ctx.cache_root.display().to_string(),
            "github_token": ctx.token.is_some(),
            "settings": ctx.settings,
        });
        let rendered =
            serde_json::to_string_pretty(&value).map_err(|e| SkilletError::IoError {
                message: e.to_string(),
            })?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Project directory: {}", ctx.project_dir.display());
    println!("Config file:       {}", ctx.config_path().display());
    println!("Lockfile:          {}", ctx.lock_path().display());
    println!(
        "Global skills:     {}",
        ctx.install_root(SkillScope::Global).display()
    );
    println!(
        "Project skills:    {}",
        ctx.install_root(SkillScope::Project).display()
    );
    println!("Cache root:        {}", ctx.cache_root.display());
    println!(
        "GitHub token:      {}",
        if ctx.token.is_some() { "set" } else { "not set" }
    );
    println!("Parallel workers:  {}", ctx.settings.parallel_downloads);
    println!("Fetch timeout:     {}s", ctx.settings.timeout_secs);
    println!("Strict validation: {}", ctx.settings.strict);

    Ok(())
}
