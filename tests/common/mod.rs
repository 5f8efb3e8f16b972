//! Common test utilities for skillet integration tests

// Each integration test binary compiles this module separately and uses a
// different subset of the helpers.
#![allow(dead_code)]

use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

pub mod github_stub;

/// A sandboxed project for integration tests
///
/// Holds a temporary directory with a `project/` root, a fake `home/` and a
/// private cache, so runs never touch the developer's real skill
/// installations.
pub struct TestWorkspace {
    /// Temporary directory keeping everything alive
    #[allow(dead_code)]
    pub temp: TempDir,
    /// Project root the commands run in
    pub project: PathBuf,
    /// Fake home directory, passed as HOME
    pub home: PathBuf,
    /// Private cache directory, passed as SKILLET_CACHE_DIR
    pub cache: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let project = temp.path().join("project");
        let home = temp.path().join("home");
        let cache = temp.path().join("cache");
        std::fs::create_dir_all(&project).expect("Failed to create project directory");
        std::fs::create_dir_all(&home).expect("Failed to create home directory");
        Self {
            temp,
            project,
            home,
            cache,
        }
    }

    /// A skillet command sandboxed to this workspace
    #[allow(deprecated)]
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("skillet").expect("Failed to locate skillet binary");
        cmd.current_dir(&self.project);
        cmd.env("HOME", &self.home);
        cmd.env("SKILLET_CACHE_DIR", &self.cache);
        cmd.env_remove("SKILLET_PROJECT_DIR");
        cmd.env_remove("SKILLET_API_BASE");
        cmd.env_remove("GITHUB_TOKEN");
        cmd
    }

    /// Write a file under the project root
    pub fn write_file(&self, path: &str, content: &str) {
        let file_path = self.project.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&file_path, content).expect("Failed to write file");
    }

    /// Read a file from the project root
    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.project.join(path)).expect("Failed to read file")
    }

    /// Check if a path exists under the project root
    pub fn file_exists(&self, path: &str) -> bool {
        self.project.join(path).exists()
    }

    /// Create a local skill source directory with a valid SKILL.md
    pub fn create_skill(&self, name: &str) -> PathBuf {
        let dir = self.project.join("sources").join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create skill directory");
        std::fs::write(
            dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: A test skill\n---\n# {name}\n\nBody.\n"),
        )
        .expect("Failed to write SKILL.md");
        dir
    }

    /// Write a skillset.yaml declaring one project-scoped local skill
    pub fn declare_local_skill(&self, name: &str) {
        self.create_skill(name);
        self.write_file(
            "skillset.yaml",
            &format!("project:\n  - name: {name}\n    source: local:./sources/{name}\n"),
        );
    }

    /// Parse the project lockfile as JSON
    pub fn lockfile(&self) -> serde_json::Value {
        let content = self.read_file("skillset.lock");
        serde_json::from_str(&content).expect("Failed to parse lockfile")
    }

    /// Lock entry for a (scope, name) pair, if present
    pub fn lock_entry(&self, scope: &str, name: &str) -> Option<serde_json::Value> {
        let lock = self.lockfile();
        let entry = lock.get("skills")?.get(scope)?.get(name)?;
        Some(entry.clone())
    }

    /// Path a project-scoped skill is installed at
    pub fn installed_path(&self, name: &str) -> PathBuf {
        self.project.join(".claude/skills").join(name)
    }

    /// Path a global-scoped skill is installed at
    pub fn global_installed_path(&self, name: &str) -> PathBuf {
        self.home.join(".claude/skills").join(name)
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_creation() {
        let workspace = TestWorkspace::new();
        assert!(workspace.project.exists());
        assert!(workspace.home.exists());
    }

    #[test]
    fn test_workspace_file_operations() {
        let workspace = TestWorkspace::new();
        workspace.write_file("nested/file.txt", "hello");
        assert!(workspace.file_exists("nested/file.txt"));
        assert_eq!(workspace.read_file("nested/file.txt"), "hello");
    }

    #[test]
    fn test_workspace_create_skill() {
        let workspace = TestWorkspace::new();
        let dir = workspace.create_skill("notes");
        assert!(dir.join("SKILL.md").is_file());
    }
}
