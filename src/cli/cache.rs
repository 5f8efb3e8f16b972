use clap::{Parser, Subcommand};

/// Arguments for the cache command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show cache statistics:\n    skillet cache\n\n\
                  Remove entries unused for 7 days:\n    skillet cache clean --days 7\n\n\
                  Clear the whole cache:\n    skillet cache clear")]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// Show cache statistics
    Stats,

    /// Remove cache entries unused longer than the retention period
    Clean(CleanCacheArgs),

    /// Remove every cache entry
    Clear,
}

/// Arguments for cache clean
#[derive(Parser, Debug)]
pub struct CleanCacheArgs {
    /// Retention period in days (defaults to cache_retention_days from config)
    #[arg(long)]
    pub days: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn test_cli_parsing_cache_defaults_to_stats() {
        let cli = Cli::try_parse_from(["skillet", "cache"]).unwrap();
        match cli.command {
            Commands::Cache(args) => assert!(args.command.is_none()),
            _ => panic!("Expected Cache command"),
        }
    }

    #[test]
    fn test_cli_parsing_cache_clean_days() {
        let cli = Cli::try_parse_from(["skillet", "cache", "clean", "--days", "7"]).unwrap();
        match cli.command {
            Commands::Cache(args) => match args.command {
                Some(super::CacheSubcommand::Clean(clean)) => {
                    assert_eq!(clean.days, Some(7));
                }
                _ => panic!("Expected cache clean subcommand"),
            },
            _ => panic!("Expected Cache command"),
        }
    }
}
