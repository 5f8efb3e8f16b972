//! Error types and handling for Skillet
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//! A single enum covers every failure domain; each variant carries a
//! diagnostic code under the `skillet::` namespace.

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for Skillet operations
#[derive(Error, Diagnostic, Debug)]
pub enum SkilletError {
    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(skillet::config::not_found),
        help("Run 'skillet init' to create a skillset.yaml")
    )]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(skillet::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(skillet::config::invalid))]
    ConfigInvalid { message: String },

    #[error("Skill '{name}' is already declared in the {scope} section")]
    #[diagnostic(code(skillet::config::duplicate_skill))]
    DuplicateSkill { name: String, scope: String },

    // Source errors
    #[error("Malformed source '{input}': {reason}")]
    #[diagnostic(
        code(skillet::source::malformed),
        help("Valid formats: remote:<owner>/<repo>[/<subpath>], local:<path>")
    )]
    MalformedSource { input: String, reason: String },

    #[error("Source not found: {what}")]
    #[diagnostic(code(skillet::source::not_found))]
    SourceNotFound { what: String },

    #[error("No version of '{owner}/{repo}' matches '{constraint}'")]
    #[diagnostic(
        code(skillet::source::no_matching_version),
        help("List the repository's tags and releases to see what is available")
    )]
    NoMatchingVersion {
        owner: String,
        repo: String,
        constraint: String,
    },

    // Network errors
    #[error("Network request failed: {message}")]
    #[diagnostic(
        code(skillet::network::request_failed),
        help("Check connectivity; transient failures are retried automatically")
    )]
    NetworkError { message: String, rate_limited: bool },

    // Security errors
    #[error("Archive entry '{entry}' rejected: {rule}")]
    #[diagnostic(
        code(skillet::security::entry_rejected),
        help("The archive violates extraction safety limits and was discarded")
    )]
    SecurityViolation { entry: String, rule: String },

    // Validation errors
    #[error("Skill validation failed for '{name}': {message}")]
    #[diagnostic(
        code(skillet::validation::failed),
        help("SKILL.md needs YAML frontmatter with 'name' and 'description' fields")
    )]
    ValidationFailed { name: String, message: String },

    // Installation errors
    #[error("Installation failed for '{name}': {message}")]
    #[diagnostic(code(skillet::install::failed))]
    InstallationFailed { name: String, message: String },

    #[error("Timed out installing '{name}' after {secs}s")]
    #[diagnostic(
        code(skillet::install::timeout),
        help("Raise 'timeout_secs' in the config section of skillset.yaml")
    )]
    Timeout { name: String, secs: u64 },

    // Lockfile errors
    #[error("Lockfile is missing")]
    #[diagnostic(
        code(skillet::lock::missing),
        help("Run 'skillet install' to generate skillset.lock")
    )]
    LockfileMissing,

    // File system errors
    #[error("IO error: {message}")]
    #[diagnostic(code(skillet::fs::io_error))]
    IoError { message: String },

    // Cache errors
    #[error("Cache operation failed: {message}")]
    #[diagnostic(code(skillet::cache::operation_failed))]
    CacheOperationFailed { message: String },
}

impl SkilletError {
    /// Whether the fetch step may retry this error automatically
    pub fn is_retryable(&self) -> bool {
        matches!(self, SkilletError::NetworkError { .. })
    }

    /// Whether the error was caused by provider rate limiting
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            SkilletError::NetworkError {
                rate_limited: true,
                ..
            }
        )
    }

    pub fn network(message: impl Into<String>) -> Self {
        SkilletError::NetworkError {
            message: message.into(),
            rate_limited: false,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        SkilletError::NetworkError {
            message: message.into(),
            rate_limited: true,
        }
    }

    pub fn security(entry: impl Into<String>, rule: impl Into<String>) -> Self {
        SkilletError::SecurityViolation {
            entry: entry.into(),
            rule: rule.into(),
        }
    }
}

impl From<std::io::Error> for SkilletError {
    fn from(err: std::io::Error) -> Self {
        SkilletError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for SkilletError {
    fn from(err: serde_yaml::Error) -> Self {
        SkilletError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SkilletError {
    fn from(err: serde_json::Error) -> Self {
        SkilletError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, SkilletError>;
