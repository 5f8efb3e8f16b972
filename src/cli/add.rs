use clap::Parser;

/// Arguments for the add command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Add from a GitHub repository:\n    skillet add octo/skills/notes\n\n\
                  Pin a version range:\n    skillet add octo/skills/notes --version ^1.0.0\n\n\
                  Track a branch:\n    skillet add octo/skills/notes --ref develop\n\n\
                  Add a local skill to the global scope:\n    skillet add ./tools/notes --global")]
pub struct AddArgs {
    /// Skill source: remote:owner/repo[/path], local:./dir, owner/repo[/path], or a directory path
    pub source: String,

    /// Declare in the global section instead of the project section
    #[arg(long, short = 'g')]
    pub global: bool,

    /// Version constraint: exact tag, ^X.Y.Z, ~X.Y.Z, or latest
    #[arg(long, conflicts_with = "reference")]
    pub version: Option<String>,

    /// Git ref: branch name or 40-hex commit SHA
    #[arg(long = "ref", value_name = "REF")]
    pub reference: Option<String>,

    /// Skill name (defaults to the last source path segment)
    #[arg(long)]
    pub name: Option<String>,
}
