//! CLI definitions using clap derive API
//!
//! This module is organized into submodules for each command's argument types:
//! - install: Install command arguments
//! - add: Add command arguments
//! - list: List command arguments
//! - check: Check command arguments
//! - context: Context command arguments
//! - cache: Cache command arguments
//! - completions: Completions command arguments

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod add;
pub mod cache;
pub mod check;
pub mod completions;
pub mod context;
pub mod install;
pub mod list;

pub use add::AddArgs;
pub use cache::{CacheArgs, CacheSubcommand, CleanCacheArgs};
pub use check::CheckArgs;
pub use completions::CompletionsArgs;
pub use context::ContextArgs;
pub use install::InstallArgs;
pub use list::ListArgs;

use crate::config::skillset::SkillScope;

/// Skillet - declarative skill manager for Claude Code
///
/// Declare skills in skillset.yaml, install them reproducibly, and pin what
/// was installed in skillset.lock.
#[derive(Parser, Debug)]
#[command(
    name = "skillet",
    author,
    version,
    color = clap::ColorChoice::Always,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Declarative package manager for Claude Agent Skills",
    long_about = "Skillet installs Claude Agent Skills declared in skillset.yaml into \
                  ~/.claude/skills (global scope) and .claude/skills (project scope), \
                  resolving versions against GitHub and recording the result in skillset.lock.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  skillet install                       \x1b[90m# Install everything declared\x1b[0m\n   \
                  skillet install --scope project       \x1b[90m# Only this project's skills\x1b[0m\n   \
                  skillet add octo/skills/notes         \x1b[90m# Declare and install a skill\x1b[0m\n   \
                  skillet add ./tools/notes --global    \x1b[90m# Declare a local skill globally\x1b[0m\n   \
                  skillet list                          \x1b[90m# Show declared and installed skills\x1b[0m\n   \
                  skillet check --verify-checksums      \x1b[90m# Verify installs against the lockfile\x1b[0m\n\n\
                  "
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'p', global = true, env = "SKILLET_PROJECT_DIR")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a starter skillset.yaml
    Init,

    /// Install declared skills and write the lockfile
    Install(InstallArgs),

    /// Declare a new skill and install it
    Add(AddArgs),

    /// List declared skills and their installed state
    List(ListArgs),

    /// Verify installed skills against the lockfile
    Check(CheckArgs),

    /// Show resolved paths and settings for this run
    Context(ContextArgs),

    /// Manage the download cache
    #[command(name = "cache")]
    Cache(CacheArgs),

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Scope selector shared by install and list
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    Global,
    Project,
}

impl ScopeArg {
    pub fn to_scope(self) -> SkillScope {
        match self {
            ScopeArg::Global => SkillScope::Global,
            ScopeArg::Project => SkillScope::Project,
        }
    }
}
