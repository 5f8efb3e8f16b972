//! Command implementations for the skillet CLI

use std::path::PathBuf;

use crate::error::{Result, SkilletError};

pub mod add;
pub mod cache;
pub mod check;
pub mod completions;
pub mod context;
pub mod init;
pub mod install;
pub mod list;
pub mod version;

/// Resolve the project directory from the global flag or the current directory
pub fn project_dir(flag: Option<PathBuf>) -> Result<PathBuf> {
    match flag {
        Some(path) => Ok(path),
        None => std::env::current_dir().map_err(|e| SkilletError::IoError {
            message: format!("failed to get current directory: {e}"),
        }),
    }
}
