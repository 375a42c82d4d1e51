//! Source file cache shared across builds.
//!
//! File text is kept per path and trusted while the modification time is
//! unchanged. Scans are keyed by content hash and platform, so a touched
//! but unchanged file is not re-scanned and a rewritten file always is.

use rustc_hash::FxHashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;
use weapp_graph::SourceLoader;
use wxml_parser::{scan, Platform, ScanOptions, TokenRecord};

#[derive(Clone)]
struct CachedFile {
    modified: SystemTime,
    hash: blake3::Hash,
    text: Arc<str>,
}

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Reads answered without touching file contents.
    pub read_hits: usize,
    /// Reads that loaded the file.
    pub read_misses: usize,
    /// Scans reused by content hash.
    pub scan_hits: usize,
    /// Templates scanned.
    pub scan_misses: usize,
}

/// A [`SourceLoader`] that remembers what it has read and scanned.
#[derive(Default)]
pub struct ScanCache {
    files: Mutex<FxHashMap<PathBuf, CachedFile>>,
    scans: Mutex<FxHashMap<(blake3::Hash, Platform), Arc<TokenRecord>>>,
    read_hits: AtomicUsize,
    read_misses: AtomicUsize,
    scan_hits: AtomicUsize,
    scan_misses: AtomicUsize,
}

impl ScanCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            read_hits: self.read_hits.load(Ordering::Relaxed),
            read_misses: self.read_misses.load(Ordering::Relaxed),
            scan_hits: self.scan_hits.load(Ordering::Relaxed),
            scan_misses: self.scan_misses.load(Ordering::Relaxed),
        }
    }

    fn read(&self, path: &Path) -> io::Result<CachedFile> {
        let modified = fs::metadata(path)?.modified()?;
        if let Some(cached) = self
            .files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .filter(|cached| cached.modified == modified)
            .cloned()
        {
            self.read_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(cached);
        }

        let text = fs::read_to_string(path)?;
        let file = CachedFile {
            modified,
            hash: blake3::hash(text.as_bytes()),
            text: Arc::from(text),
        };
        self.read_misses.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(path = %path.display(), hash = %file.hash, "read source");
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf(), file.clone());
        Ok(file)
    }
}

impl SourceLoader for ScanCache {
    fn scan_template(&self, path: &Path, options: &ScanOptions) -> io::Result<Arc<TokenRecord>> {
        let file = self.read(path)?;
        let key = (file.hash, options.platform);
        if let Some(token) = self
            .scans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
        {
            self.scan_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(token);
        }

        // Scanned outside the lock; concurrent misses on one hash may both scan.
        let token = Arc::new(scan(file.text, options));
        self.scan_misses.fetch_add(1, Ordering::Relaxed);
        self.scans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::clone(&token));
        Ok(token)
    }

    fn read_script(&self, path: &Path) -> io::Result<Arc<str>> {
        Ok(self.read(path)?.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn write(path: &Path, content: &str, modified: SystemTime) {
        fs::write(path, content).unwrap();
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    #[test]
    fn test_reads_are_cached_until_mtime_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.ts");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        write(&path, "export const a = 1", t0);

        let cache = ScanCache::new();
        assert_eq!(&*cache.read_script(&path).unwrap(), "export const a = 1");
        assert_eq!(&*cache.read_script(&path).unwrap(), "export const a = 1");
        assert_eq!(cache.stats().read_hits, 1);

        write(&path, "export const a = 2", t0 + Duration::from_secs(5));
        assert_eq!(&*cache.read_script(&path).unwrap(), "export const a = 2");
        assert_eq!(cache.stats().read_misses, 2);
    }

    #[test]
    fn test_scans_are_keyed_by_content_and_platform() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.wxml");
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(2_000_000);
        write(&path, "<view @tap=\"go\"/>", t0);

        let cache = ScanCache::new();
        let weapp = ScanOptions::new(Platform::Weapp);
        let first = cache.scan_template(&path, &weapp).unwrap();
        let second = cache.scan_template(&path, &weapp).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Touched but unchanged: reread, not rescanned.
        write(&path, "<view @tap=\"go\"/>", t0 + Duration::from_secs(5));
        let third = cache.scan_template(&path, &weapp).unwrap();
        assert!(Arc::ptr_eq(&first, &third));

        let alipay = cache.scan_template(&path, &ScanOptions::new(Platform::Alipay)).unwrap();
        assert_eq!(alipay.platform, Platform::Alipay);

        write(&path, "<view/>", t0 + Duration::from_secs(10));
        let changed = cache.scan_template(&path, &weapp).unwrap();
        assert_eq!(changed.source(), "<view/>");
        assert!(changed.events.is_empty());

        assert_eq!(
            cache.stats(),
            CacheStats {
                read_hits: 2,
                read_misses: 3,
                scan_hits: 2,
                scan_misses: 3,
            }
        );
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let cache = ScanCache::new();
        let err = cache.read_script(Path::new("/definitely/not/here.ts")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
