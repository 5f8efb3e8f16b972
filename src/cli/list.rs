use clap::Parser;

use super::ScopeArg;

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List all declared skills:\n    skillet list\n\n\
                  List only global-scope skills:\n    skillet list --scope global")]
pub struct ListArgs {
    /// Only list skills declared in one scope
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,
}
