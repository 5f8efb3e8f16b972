//! Content-addressed download cache
//!
//! Fetched archives are extracted into one subdirectory per immutable
//! revision id under the cache root. The cache is purely an optimization:
//! deleting it at any time is safe, the next install re-fetches. Each use of
//! an entry touches a `.last-used` stamp so `cache clean` can sweep
//! long-untouched revisions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use walkdir::WalkDir;

use crate::error::{Result, SkilletError};

/// Environment variable overriding the cache root
pub const CACHE_DIR_ENV: &str = "SKILLET_CACHE_DIR";

/// Stamp file touched on every hit or populate
pub const LAST_USED_FILE: &str = ".last-used";

/// Resolve the cache root directory
///
/// Precedence: `SKILLET_CACHE_DIR`, then the configured `cache_dir`, then
/// the platform cache directory under a `skillet` subdirectory.
pub fn cache_root(configured: Option<&Path>) -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = configured {
        return Ok(dir.to_path_buf());
    }
    dirs::cache_dir()
        .map(|d| d.join("skillet"))
        .ok_or_else(|| SkilletError::CacheOperationFailed {
            message: "cannot determine a cache directory for this platform".to_string(),
        })
}

/// Cache statistics
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Number of cached revisions
    pub entries: usize,
    /// Total size in bytes
    pub total_size: u64,
}

impl CacheStats {
    /// Format total size as human-readable string
    pub fn formatted_size(&self) -> String {
        let size = self.total_size as f64;
        if size < 1024.0 {
            format!("{} B", self.total_size)
        } else if size < 1024.0 * 1024.0 {
            format!("{:.1} KB", size / 1024.0)
        } else if size < 1024.0 * 1024.0 * 1024.0 {
            format!("{:.1} MB", size / (1024.0 * 1024.0))
        } else {
            format!("{:.1} GB", size / (1024.0 * 1024.0 * 1024.0))
        }
    }
}

/// Content store keyed by immutable revision id
pub struct ContentCache {
    root: PathBuf,
    inflight: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContentCache {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory a revision occupies (whether or not it is populated)
    pub fn entry_path(&self, immutable_id: &str) -> PathBuf {
        self.root.join(immutable_id)
    }

    /// Return the cached directory for a revision, fetching it if absent
    ///
    /// Per-key single flight: concurrent callers for one id share exactly one
    /// `fetch` invocation. `fetch` must populate the given path atomically; a
    /// failed fetch leaves nothing behind and releases the key, so a later
    /// caller retries.
    pub fn get_or_fetch(
        &self,
        immutable_id: &str,
        fetch: impl FnOnce(&Path) -> Result<()>,
    ) -> Result<PathBuf> {
        let key_lock = self.key_lock(immutable_id);
        let _guard = key_lock.lock();

        let path = self.entry_path(immutable_id);
        if !path.is_dir() {
            fs::create_dir_all(&self.root).map_err(|e| SkilletError::CacheOperationFailed {
                message: format!("failed to create cache root {}: {}", self.root.display(), e),
            })?;
            let result = fetch(&path);
            drop(_guard);
            self.release(immutable_id);
            result?;
        } else {
            drop(_guard);
            self.release(immutable_id);
        }

        touch_last_used(&path)?;
        Ok(path)
    }

    fn key_lock(&self, immutable_id: &str) -> Arc<Mutex<()>> {
        let mut map = self.inflight.lock();
        map.entry(immutable_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release(&self, immutable_id: &str) {
        let mut map = self.inflight.lock();
        if let Some(lock) = map.get(immutable_id) {
            // Two strong refs: the map's and the caller's.
            if Arc::strong_count(lock) <= 2 {
                map.remove(immutable_id);
            }
        }
    }

    /// Remove entries unused for longer than `retention_days`
    ///
    /// Returns the number of entries removed.
    pub fn clean(&self, retention_days: u64) -> Result<usize> {
        if !self.root.is_dir() {
            return Ok(0);
        }
        let cutoff = Duration::from_secs(retention_days * 24 * 60 * 60);
        let mut removed = 0;

        for entry in read_cache_dir(&self.root)? {
            let age = match last_used_age(&entry) {
                Some(age) => age,
                None => continue,
            };
            if age > cutoff {
                fs::remove_dir_all(&entry).map_err(|e| SkilletError::CacheOperationFailed {
                    message: format!("failed to remove {}: {}", entry.display(), e),
                })?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    /// Remove every cached entry
    pub fn clear(&self) -> Result<()> {
        if self.root.exists() {
            fs::remove_dir_all(&self.root).map_err(|e| SkilletError::CacheOperationFailed {
                message: format!("failed to clear cache: {}", e),
            })?;
        }
        Ok(())
    }

    /// Entry count and total size on disk
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        if !self.root.is_dir() {
            return Ok(stats);
        }
        for entry in read_cache_dir(&self.root)? {
            stats.entries += 1;
            stats.total_size += dir_size(&entry);
        }
        Ok(stats)
    }
}

fn read_cache_dir(root: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    let iter = fs::read_dir(root).map_err(|e| SkilletError::CacheOperationFailed {
        message: format!("failed to read cache directory: {}", e),
    })?;
    for entry in iter {
        let entry = entry.map_err(|e| SkilletError::CacheOperationFailed {
            message: format!("failed to read cache entry: {}", e),
        })?;
        if entry.path().is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn touch_last_used(entry: &Path) -> Result<()> {
    fs::write(entry.join(LAST_USED_FILE), chrono::Utc::now().to_rfc3339()).map_err(|e| {
        SkilletError::CacheOperationFailed {
            message: format!("failed to touch {} stamp: {}", LAST_USED_FILE, e),
        }
    })
}

/// Age since the entry's stamp, falling back to the directory mtime
fn last_used_age(entry: &Path) -> Option<Duration> {
    let stamp = entry.join(LAST_USED_FILE);
    let modified = fs::metadata(&stamp)
        .or_else(|_| fs::metadata(entry))
        .and_then(|m| m.modified())
        .ok()?;
    SystemTime::now().duration_since(modified).ok()
}

fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .follow_links(false)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::*;
    use tempfile::TempDir;

    fn populate(path: &Path) -> Result<()> {
        fs::create_dir_all(path)?;
        fs::write(path.join("SKILL.md"), "content")?;
        Ok(())
    }

    #[test]
    fn test_fetch_then_hit() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path().join("cache"));
        let fetches = AtomicUsize::new(0);

        let fetch = |path: &Path| {
            fetches.fetch_add(1, Ordering::SeqCst);
            populate(path)
        };
        let first = cache.get_or_fetch("aaaa", fetch).unwrap();
        let second = cache
            .get_or_fetch("aaaa", |path| {
                fetches.fetch_add(1, Ordering::SeqCst);
                populate(path)
            })
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(first.join(LAST_USED_FILE).is_file());
    }

    #[test]
    fn test_concurrent_callers_share_one_fetch() {
        let temp = TempDir::new().unwrap();
        let cache = Arc::new(ContentCache::new(temp.path().join("cache")));
        let fetches = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let fetches = Arc::clone(&fetches);
                thread::spawn(move || {
                    cache
                        .get_or_fetch("bbbb", |path| {
                            fetches.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(50));
                            populate(path)
                        })
                        .unwrap()
                })
            })
            .collect();

        let paths: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(paths.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_fetch_not_cached() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path().join("cache"));

        let err = cache.get_or_fetch("cccc", |_| {
            Err(SkilletError::network("download interrupted"))
        });
        assert!(err.is_err());
        assert!(!cache.entry_path("cccc").exists());

        let fetched = cache.get_or_fetch("cccc", populate).unwrap();
        assert!(fetched.join("SKILL.md").is_file());
    }

    #[test]
    fn test_clean_respects_retention() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path().join("cache"));
        cache.get_or_fetch("dddd", populate).unwrap();

        assert_eq!(cache.clean(30).unwrap(), 0);
        assert!(cache.entry_path("dddd").is_dir());

        // Zero-day retention treats every entry as expired.
        assert_eq!(cache.clean(0).unwrap(), 1);
        assert!(!cache.entry_path("dddd").exists());
    }

    #[test]
    fn test_clear_removes_root() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path().join("cache"));
        cache.get_or_fetch("eeee", populate).unwrap();

        cache.clear().unwrap();
        assert!(!cache.root().exists());
        assert_eq!(cache.stats().unwrap().entries, 0);
    }

    #[test]
    fn test_stats_counts_entries_and_bytes() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::new(temp.path().join("cache"));
        cache.get_or_fetch("ffff", populate).unwrap();
        cache.get_or_fetch("gggg", populate).unwrap();

        let stats = cache.stats().unwrap();
        assert_eq!(stats.entries, 2);
        assert!(stats.total_size > 0);
    }

    #[test]
    fn test_formatted_size() {
        let stats = CacheStats {
            entries: 1,
            total_size: 1536,
        };
        assert_eq!(stats.formatted_size(), "1.5 KB");
        let small = CacheStats {
            entries: 1,
            total_size: 512,
        };
        assert_eq!(small.formatted_size(), "512 B");
    }

    #[test]
    fn test_cache_root_prefers_configured_dir() {
        let configured = PathBuf::from("/tmp/custom-cache");
        if std::env::var(CACHE_DIR_ENV).is_err() {
            assert_eq!(cache_root(Some(&configured)).unwrap(), configured);
        }
    }
}
