//! Multi-skill operations built on the per-item installer

pub mod install;

pub use install::{InstallReport, install_all};
