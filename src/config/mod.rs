//! Configuration file handling for Skillet
//!
//! This module contains data structures for:
//! - `skillset.yaml` - Declared skills and run settings
//! - `skillset.lock` - Lockfile with resolved revisions and checksums

pub mod lockfile;
pub mod skillset;

// Re-export commonly used types
pub use lockfile::{LockEntry, Lockfile};
pub use skillset::{SkillDeclaration, SkillScope, Skillset, SkillsetSettings};
