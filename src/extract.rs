//! Security-hardened tar.gz extraction
//!
//! Extraction writes into a scratch directory created beside the destination
//! and promotes it with a single rename only when every entry passed
//! validation. Any violation aborts the archive, removes the scratch
//! directory, and leaves the destination untouched.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::{Result, SkilletError};

/// Longest allowed path component, in bytes
const MAX_COMPONENT_BYTES: usize = 255;

/// Limits applied while extracting an archive
#[derive(Debug, Clone)]
pub struct ExtractLimits {
    /// Maximum number of entries in the archive
    pub max_entries: usize,
    /// Maximum declared size of a single entry
    pub max_entry_bytes: u64,
    /// Maximum cumulative declared size across the archive
    pub max_total_bytes: u64,
}

impl Default for ExtractLimits {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            max_entry_bytes: 100 * 1024 * 1024,
            max_total_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Extract a gzip-compressed tar stream into `destination`
///
/// The destination must not exist yet; its parent directory must. On success
/// the fully validated content appears at `destination` via one rename.
pub fn extract_tar_gz<R: Read>(
    stream: R,
    destination: &Path,
    limits: &ExtractLimits,
) -> Result<()> {
    let parent = destination.parent().ok_or_else(|| SkilletError::IoError {
        message: format!("destination {} has no parent", destination.display()),
    })?;
    fs::create_dir_all(parent)?;

    let scratch = tempfile::Builder::new()
        .prefix(".skillet-extract-")
        .tempdir_in(parent)
        .map_err(|e| SkilletError::IoError {
            message: format!("failed to create scratch directory: {e}"),
        })?;

    let mut archive = Archive::new(GzDecoder::new(stream));
    unpack_all(&mut archive, scratch.path(), limits)?;

    if destination.exists() {
        fs::remove_dir_all(destination)?;
    }
    fs::rename(scratch.path(), destination)?;
    // The scratch path was consumed by the rename; skip TempDir cleanup.
    std::mem::forget(scratch);
    Ok(())
}

fn unpack_all<R: Read>(
    archive: &mut Archive<R>,
    scratch: &Path,
    limits: &ExtractLimits,
) -> Result<()> {
    let mut entry_count: usize = 0;
    let mut total_bytes: u64 = 0;

    let entries = archive.entries().map_err(|e| SkilletError::IoError {
        message: format!("failed to read archive: {e}"),
    })?;

    for entry in entries {
        let mut entry = entry.map_err(|e| SkilletError::IoError {
            message: format!("failed to read archive entry: {e}"),
        })?;

        entry_count += 1;
        if entry_count > limits.max_entries {
            return Err(SkilletError::security(
                entry_display_name(&entry),
                format!("archive exceeds {} entries", limits.max_entries),
            ));
        }

        let declared = entry.header().size().unwrap_or(0);
        if declared > limits.max_entry_bytes {
            return Err(SkilletError::security(
                entry_display_name(&entry),
                format!(
                    "entry size {declared} exceeds limit of {} bytes",
                    limits.max_entry_bytes
                ),
            ));
        }
        total_bytes = total_bytes.saturating_add(declared);
        if total_bytes > limits.max_total_bytes {
            return Err(SkilletError::security(
                entry_display_name(&entry),
                format!(
                    "archive exceeds cumulative size limit of {} bytes",
                    limits.max_total_bytes
                ),
            ));
        }

        unpack_entry(&mut entry, scratch)?;
    }

    Ok(())
}

fn entry_display_name<R: Read>(entry: &tar::Entry<'_, R>) -> String {
    entry
        .path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "<unreadable name>".to_string())
}

fn unpack_entry<R: Read>(entry: &mut tar::Entry<'_, R>, scratch: &Path) -> Result<()> {
    let name = entry_display_name(entry);
    let raw_path = entry.path_bytes().to_vec();

    check_name_constraints(&name, &raw_path)?;

    let rel = contain_path(&name, Path::new(&String::from_utf8_lossy(&raw_path).into_owned()))?;
    let target = scratch.join(&rel);

    match entry.header().entry_type() {
        EntryType::Directory => {
            fs::create_dir_all(&target)?;
        }
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => {
            write_regular(entry, &rel, &target)?;
        }
        EntryType::Symlink => {
            unpack_symlink(entry, &name, &rel, &target)?;
        }
        EntryType::Link => {
            unpack_hardlink(entry, &name, scratch, &target)?;
        }
        other => {
            return Err(SkilletError::security(
                &name,
                format!("entry type {other:?} is not allowed"),
            ));
        }
    }

    Ok(())
}

fn write_regular<R: Read>(
    entry: &mut tar::Entry<'_, R>,
    rel: &Path,
    target: &Path,
) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(target)?;
    io::copy(entry, &mut out).map_err(|e| SkilletError::IoError {
        message: format!("failed to extract {}: {}", rel.display(), e),
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Strip setuid/setgid regardless of archive metadata.
        let mode = entry.header().mode().unwrap_or(0o644) & 0o1777;
        fs::set_permissions(target, fs::Permissions::from_mode(mode))?;
    }

    Ok(())
}

fn unpack_symlink<R: Read>(
    entry: &tar::Entry<'_, R>,
    name: &str,
    rel: &Path,
    target: &Path,
) -> Result<()> {
    let link_target = entry
        .link_name()
        .map_err(|e| SkilletError::IoError {
            message: format!("failed to read link target of {name}: {e}"),
        })?
        .ok_or_else(|| SkilletError::security(name, "symlink entry has no target"))?;

    check_link_containment(name, rel, &link_target)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&link_target, target)?;
    #[cfg(not(unix))]
    {
        let _ = target;
    }
    Ok(())
}

fn unpack_hardlink<R: Read>(
    entry: &tar::Entry<'_, R>,
    name: &str,
    scratch: &Path,
    target: &Path,
) -> Result<()> {
    let link_target = entry
        .link_name()
        .map_err(|e| SkilletError::IoError {
            message: format!("failed to read link target of {name}: {e}"),
        })?
        .ok_or_else(|| SkilletError::security(name, "hard link entry has no target"))?;

    // Hard link targets are archive-root relative.
    let resolved = contain_path(name, &link_target)?;

    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::hard_link(scratch.join(resolved), target)?;
    Ok(())
}

/// Verify a link target stays inside the extraction root
///
/// Symlink targets resolve relative to the entry's own directory.
fn check_link_containment(name: &str, rel: &Path, link_target: &Path) -> Result<()> {
    if link_target.is_absolute() {
        return Err(SkilletError::security(
            name,
            "link target is an absolute path",
        ));
    }

    // Depth of the entry's directory inside the root.
    let mut depth: isize = rel.components().count() as isize - 1;
    for component in link_target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return Err(SkilletError::security(
                        name,
                        "link target escapes the destination",
                    ));
                }
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(SkilletError::security(
                    name,
                    "link target is an absolute path",
                ));
            }
        }
    }
    Ok(())
}

/// Normalize an entry path and reject anything that would land outside the
/// extraction root
fn contain_path(name: &str, path: &Path) -> Result<PathBuf> {
    let mut normalized = PathBuf::new();
    let mut depth: usize = 0;

    for component in path.components() {
        match component {
            Component::Normal(part) => {
                normalized.push(part);
                depth += 1;
            }
            Component::ParentDir => {
                if depth == 0 {
                    return Err(SkilletError::security(
                        name,
                        "path escapes the destination",
                    ));
                }
                normalized.pop();
                depth -= 1;
            }
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => {
                return Err(SkilletError::security(name, "path is absolute"));
            }
        }
    }

    if normalized.as_os_str().is_empty() {
        return Err(SkilletError::security(name, "path is empty"));
    }
    Ok(normalized)
}

fn check_name_constraints(name: &str, raw_path: &[u8]) -> Result<()> {
    if raw_path.contains(&0) {
        return Err(SkilletError::security(name, "path contains a null byte"));
    }
    for component in raw_path.split(|b| *b == b'/') {
        if component.len() > MAX_COMPONENT_BYTES {
            return Err(SkilletError::security(
                name,
                format!("path component exceeds {MAX_COMPONENT_BYTES} bytes"),
            ));
        }
    }
    Ok(())
}

/// Locate the content root of an extracted archive
///
/// Repository tarballs wrap everything in a single top-level directory; the
/// root is found by descending through a sole non-hidden directory. A
/// declared subpath is then joined and must exist.
pub fn discover_content_root(extracted: &Path, subpath: Option<&str>) -> Result<PathBuf> {
    let mut root = extracted.to_path_buf();

    let visible: Vec<PathBuf> = fs::read_dir(&root)?
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .map(|n| !n.to_string_lossy().starts_with('.'))
                .unwrap_or(false)
        })
        .collect();

    if visible.len() == 1 && visible[0].is_dir() {
        root = visible[0].clone();
    }

    if let Some(sub) = subpath {
        root = root.join(sub);
        if !root.is_dir() {
            return Err(SkilletError::SourceNotFound {
                what: format!("subpath '{sub}' in fetched archive"),
            });
        }
    }

    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    struct ArchiveBuilder {
        builder: tar::Builder<GzEncoder<Vec<u8>>>,
    }

    impl ArchiveBuilder {
        fn new() -> Self {
            let encoder = GzEncoder::new(Vec::new(), Compression::fast());
            Self {
                builder: tar::Builder::new(encoder),
            }
        }

        fn file(self, path: &str, content: &[u8]) -> Self {
            self.file_with_mode(path, content, 0o644)
        }

        fn file_with_mode(mut self, path: &str, content: &[u8], mode: u32) -> Self {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(mode);
            header.set_cksum();
            if self
                .builder
                .append_data(&mut header, path, content)
                .is_err()
            {
                // The high-level API refuses to encode `..` paths; write the
                // name straight into the header so the extractor's own
                // traversal guard is what rejects it.
                let mut raw = tar::Header::new_gnu();
                raw.set_size(content.len() as u64);
                raw.set_mode(mode);
                let name = &mut raw.as_old_mut().name;
                name[..path.len()].copy_from_slice(path.as_bytes());
                raw.set_cksum();
                self.builder.append(&raw, content).unwrap();
            }
            self
        }

        fn dir(mut self, path: &str) -> Self {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Directory);
            header.set_size(0);
            header.set_mode(0o755);
            header.set_cksum();
            self.builder
                .append_data(&mut header, path, std::io::empty())
                .unwrap();
            self
        }

        fn symlink(mut self, path: &str, target: &str) -> Self {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            header.set_mode(0o777);
            header.set_cksum();
            self.builder
                .append_link(&mut header, path, target)
                .unwrap();
            self
        }

        fn special(mut self, path: &str, entry_type: EntryType) -> Self {
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(entry_type);
            header.set_size(0);
            header.set_mode(0o644);
            header.set_cksum();
            self.builder
                .append_data(&mut header, path, std::io::empty())
                .unwrap();
            self
        }

        fn build(self) -> Vec<u8> {
            self.builder.into_inner().unwrap().finish().unwrap()
        }
    }

    fn extract_bytes(bytes: &[u8], dest: &Path, limits: &ExtractLimits) -> Result<()> {
        extract_tar_gz(bytes, dest, limits)
    }

    fn assert_clean(temp: &TempDir, dest: &Path) {
        assert!(!dest.exists(), "destination should not exist after failure");
        let leftovers: Vec<_> = fs::read_dir(temp.path())
            .unwrap()
            .filter_map(std::result::Result::ok)
            .collect();
        assert!(
            leftovers.is_empty(),
            "scratch directories should be cleaned up: {leftovers:?}"
        );
    }

    #[test]
    fn test_extracts_valid_archive() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .dir("pkg/")
            .file("pkg/SKILL.md", b"---\nname: s\n---\nbody")
            .file("pkg/docs/guide.md", b"guide")
            .build();

        extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap();
        assert!(dest.join("pkg/SKILL.md").is_file());
        assert!(dest.join("pkg/docs/guide.md").is_file());
    }

    #[test]
    fn test_rejects_path_traversal_entry() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("../evil.txt", b"pwned")
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(matches!(err, SkilletError::SecurityViolation { .. }));
        assert_clean(&temp, &dest);
        assert!(!temp.path().join("evil.txt").exists());
    }

    #[test]
    fn test_rejects_escaping_symlink() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("pkg/ok.txt", b"fine")
            .symlink("pkg/link", "../../../etc/passwd")
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(matches!(err, SkilletError::SecurityViolation { .. }));
        // None of the archive's entries survive the failed extraction.
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_allows_internal_symlink() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("pkg/SKILL.md", b"manifest")
            .symlink("pkg/docs/link.md", "../SKILL.md")
            .build();

        extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap();
        #[cfg(unix)]
        assert!(dest.join("pkg/docs/link.md").symlink_metadata().is_ok());
    }

    #[test]
    fn test_rejects_absolute_symlink_target() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .symlink("pkg/link", "/etc/passwd")
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(matches!(err, SkilletError::SecurityViolation { .. }));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_entry_count_over_limit() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("a.txt", b"1")
            .file("b.txt", b"2")
            .file("c.txt", b"3")
            .build();

        let limits = ExtractLimits {
            max_entries: 2,
            ..ExtractLimits::default()
        };
        let err = extract_bytes(&bytes, &dest, &limits).unwrap_err();
        assert!(err.to_string().contains("entries"));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_single_entry_over_size_limit() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("big.bin", &[0u8; 2048])
            .build();

        let limits = ExtractLimits {
            max_entry_bytes: 1024,
            ..ExtractLimits::default()
        };
        let err = extract_bytes(&bytes, &dest, &limits).unwrap_err();
        assert!(matches!(err, SkilletError::SecurityViolation { .. }));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_cumulative_size_over_limit() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file("a.bin", &[0u8; 600])
            .file("b.bin", &[0u8; 600])
            .build();

        let limits = ExtractLimits {
            max_total_bytes: 1000,
            ..ExtractLimits::default()
        };
        let err = extract_bytes(&bytes, &dest, &limits).unwrap_err();
        assert!(err.to_string().contains("cumulative"));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_fifo_entry() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .special("pkg/pipe", EntryType::Fifo)
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(err.to_string().contains("not allowed"));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_device_entry() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .special("pkg/dev", EntryType::Char)
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(matches!(err, SkilletError::SecurityViolation { .. }));
        assert_clean(&temp, &dest);
    }

    #[test]
    fn test_rejects_oversized_path_component() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let long = "x".repeat(256);
        let bytes = ArchiveBuilder::new()
            .file(&format!("pkg/{long}"), b"data")
            .build();

        let err = extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap_err();
        assert!(err.to_string().contains("255"));
        assert_clean(&temp, &dest);
    }

    #[cfg(unix)]
    #[test]
    fn test_strips_setuid_bit() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("out");
        let bytes = ArchiveBuilder::new()
            .file_with_mode("pkg/tool", b"#!/bin/sh\n", 0o4755)
            .build();

        extract_bytes(&bytes, &dest, &ExtractLimits::default()).unwrap();
        let mode = dest
            .join("pkg/tool")
            .metadata()
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o7000, 0, "setuid/setgid must be stripped");
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_discover_content_root_unwraps_single_dir() {
        let temp = TempDir::new().unwrap();
        let wrapper = temp.path().join("octo-skills-abc1234");
        fs::create_dir_all(wrapper.join("tools")).unwrap();
        fs::write(wrapper.join("SKILL.md"), "m").unwrap();

        let root = discover_content_root(temp.path(), None).unwrap();
        assert_eq!(root, wrapper);
    }

    #[test]
    fn test_discover_content_root_with_subpath() {
        let temp = TempDir::new().unwrap();
        let wrapper = temp.path().join("octo-skills-abc1234");
        fs::create_dir_all(wrapper.join("tools/search")).unwrap();

        let root = discover_content_root(temp.path(), Some("tools/search")).unwrap();
        assert_eq!(root, wrapper.join("tools/search"));
    }

    #[test]
    fn test_discover_content_root_missing_subpath() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("wrapper")).unwrap();

        let err = discover_content_root(temp.path(), Some("no/such/dir")).unwrap_err();
        assert!(matches!(err, SkilletError::SourceNotFound { .. }));
    }
}
