//! Init command implementation

use std::fs;
use std::path::PathBuf;

use crate::config::skillset::SKILLSET_FILE;
use crate::error::{Result, SkilletError};

const STARTER: &str = "\
# Skills managed by skillet.
#
# global:  installed to ~/.claude/skills
# project: installed to .claude/skills in this project
#
# Example:
#
# project:
#   - name: notes
#     source: remote:owner/repo/skills/notes
#     version: ^1.0.0
#   - name: local-tool
#     source: local:./tools/local-tool

project: []
";

/// Run init command
pub fn run(project: Option<PathBuf>) -> Result<()> {
    let project_dir = super::project_dir(project)?;
    let path = project_dir.join(SKILLSET_FILE);

    if path.exists() {
        return Err(SkilletError::ConfigInvalid {
            message: format!("{} already exists", path.display()),
        });
    }
    fs::write(&path, STARTER).map_err(|e| SkilletError::IoError {
        message: format!("failed to write {}: {}", path.display(), e),
    })?;
    println!("Created {}", path.display());

    Ok(())
}
