use clap::Parser;

/// Arguments for the check command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Verify installed skills:\n    skillet check\n\n\
                  Also re-hash installed manifests:\n    skillet check --verify-checksums")]
pub struct CheckArgs {
    /// Re-hash installed manifests against the recorded checksums
    #[arg(long)]
    pub verify_checksums: bool,
}
