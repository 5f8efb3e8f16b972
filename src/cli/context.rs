use clap::Parser;

/// Arguments for the context command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show resolved paths and settings:\n    skillet context\n\n\
                  Machine-readable output:\n    skillet context --json")]
pub struct ContextArgs {
    /// Print the context as JSON
    #[arg(long)]
    pub json: bool,
}
