use clap::Parser;

/// Arguments for the completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    skillet completions bash > ~/.bash_completion.d/skillet\n\n\
                  Generate zsh completions:\n    skillet completions zsh > ~/.zfunc/_skillet\n\n\
                  Generate fish completions:\n    skillet completions fish > ~/.config/fish/completions/skillet.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    pub shell: String,
}
