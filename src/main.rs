//! Skillet - declarative skill manager for Claude Code
//!
//! Installs Claude Agent Skills declared in skillset.yaml into the global
//! (~/.claude/skills) and project (.claude/skills) scopes, resolving versions
//! against GitHub and pinning the result in skillset.lock.

use clap::Parser;

mod cache;
mod checker;
mod cli;
mod commands;
mod config;
mod context;
mod error;
mod extract;
mod github;
mod hash;
mod installer;
mod operations;
mod progress;
mod resolver;
mod source;
mod validator;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::run(cli.project).map(|()| 0),
        Commands::Install(args) => commands::install::run(cli.project, args, cli.verbose),
        Commands::Add(args) => commands::add::run(cli.project, args, cli.verbose),
        Commands::List(args) => commands::list::run(cli.project, args).map(|()| 0),
        Commands::Check(args) => commands::check::run(cli.project, args, cli.verbose),
        Commands::Context(args) => commands::context::run(cli.project, args).map(|()| 0),
        Commands::Cache(args) => commands::cache::run(cli.project, args).map(|()| 0),
        Commands::Version => commands::version::run().map(|()| 0),
        Commands::Completions(args) => commands::completions::run(args).map(|()| 0),
    };

    match result {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
