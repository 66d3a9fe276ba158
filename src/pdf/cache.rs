//! LRU cache of document bytes keyed by URL

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use log::debug;
use lru::LruCache;

use super::backend::{DataSource, DocumentData};
use super::request::TransportError;

pub const DEFAULT_CACHE_SIZE: usize = 8;

/// Retrieves document bytes for a URL
pub trait Fetch {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, TransportError>;
}

impl<F> Fetch for F
where
    F: FnMut(&str) -> Result<Vec<u8>, TransportError>,
{
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, TransportError> {
        self(url)
    }
}

/// Reads URLs as paths relative to a root directory
#[derive(Clone, Debug)]
pub struct FileFetch {
    root: PathBuf,
}

impl FileFetch {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Fetch for FileFetch {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, TransportError> {
        let path = self.root.join(url.trim_start_matches('/'));
        std::fs::read(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => TransportError::Status(404),
            _ => TransportError::generic(format!("{}: {err}", path.display())),
        })
    }
}

/// LRU cache for document bytes
pub struct ByteCache {
    cache: LruCache<String, Arc<[u8]>>,
}

impl ByteCache {
    /// Create a new cache with the given capacity
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }

    /// Get cached bytes, promoting them in the LRU order
    #[must_use]
    pub fn get(&mut self, url: &str) -> Option<Arc<[u8]>> {
        self.cache.get(url).cloned()
    }

    /// Check if a URL is cached without promoting it
    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.cache.contains(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, bytes: Vec<u8>) -> Arc<[u8]> {
        let bytes: Arc<[u8]> = bytes.into();
        self.cache.put(url.into(), bytes.clone());
        bytes
    }

    pub fn invalidate(&mut self, url: &str) -> bool {
        self.cache.pop(url).is_some()
    }

    pub fn invalidate_all(&mut self) {
        self.cache.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}

/// Fetches each URL once and serves repeats from memory
pub struct CachingDataSource<F> {
    fetch: F,
    cache: ByteCache,
}

impl<F: Fetch> CachingDataSource<F> {
    pub fn new(fetch: F, capacity: usize) -> Self {
        Self {
            fetch,
            cache: ByteCache::new(capacity),
        }
    }

    pub fn cache(&self) -> &ByteCache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut ByteCache {
        &mut self.cache
    }
}

impl<F: Fetch> DataSource for CachingDataSource<F> {
    fn load(&mut self, url: &str) -> Result<DocumentData, TransportError> {
        if let Some(bytes) = self.cache.get(url) {
            debug!("Serving {url} from cache");
            return Ok(DocumentData::Bytes(bytes));
        }
        let bytes = self.fetch.fetch(url)?;
        debug!("Fetched {url} ({} bytes)", bytes.len());
        Ok(DocumentData::Bytes(self.cache.insert(url, bytes)))
    }
}
