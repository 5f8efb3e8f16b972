use clap::Parser;
use std::path::PathBuf;

use super::ScopeArg;

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Install everything declared:\n    skillet install\n\n\
                  Install only project-scope skills:\n    skillet install --scope project\n\n\
                  Install from another declaration file:\n    skillet install --file ./configs/skillset.yaml\n\n\
                  Reinstall even when up to date:\n    skillet install --force")]
pub struct InstallArgs {
    /// Read declarations from this file instead of skillset.yaml
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Only install skills declared in one scope
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Reinstall even when the lockfile says the skill is up to date
    #[arg(long)]
    pub force: bool,
}
