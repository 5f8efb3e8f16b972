//! Cache command implementation

use std::path::PathBuf;

use crate::cli::{CacheArgs, CacheSubcommand};
use crate::context::RunContext;
use crate::error::Result;

/// Run cache command; bare `skillet cache` shows statistics
pub fn run(project: Option<PathBuf>, args: CacheArgs) -> Result<()> {
    let project_dir = super::project_dir(project)?;
    let ctx = RunContext::for_project(project_dir)?;
    let cache = ctx.content_cache();

    match args.command {
        None | Some(CacheSubcommand::Stats) => {
            let stats = cache.stats()?;
            println!("Cache directory: {}", cache.root().display());
            println!("Entries: {}", stats.entries);
            println!("Total size: {}", stats.formatted_size());
        }
        Some(CacheSubcommand::Clean(clean)) => {
            let days = clean.days.unwrap_or(ctx.settings.cache_retention_days);
            let removed = cache.clean(days)?;
            println!("Removed {removed} entries unused for more than {days} days");
        }
        Some(CacheSubcommand::Clear) => {
            cache.clear()?;
            println!("Cache cleared");
        }
    }

    Ok(())
}
