//! Storage collaborators for source images and derived variants.
//!
//! The variant cache never touches the filesystem directly. It talks to a
//! [`Storage`], the same small surface a web framework's file storage
//! exposes (existence check, open, save, delete, public URL). Names are
//! storage-relative and `/`-separated (`blog/featured/2024/05/cover.jpg`).
//!
//! ## Path introspection is a capability
//!
//! Some backends can hand out real filesystem paths; remote object stores
//! cannot. Rather than forcing every backend to fake it, [`Storage::local_paths`]
//! returns `Option<&dyn LocalPaths>`. The resolver checks it at runtime and
//! only compares modification times when it is present.
//!
//! | Backend | Local paths | Use |
//! |---|---|---|
//! | [`FileSystemStorage`] | yes | media directory on disk |
//! | [`MemoryStorage`] | no | in-process object store, tests |

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid storage name: {0:?}")]
    InvalidName(String),
}

/// Minimal file storage surface used by the variant cache.
pub trait Storage: Sync {
    /// Whether a file is stored under `name`.
    fn exists(&self, name: &str) -> bool;

    /// Open a stored file for reading.
    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>, StorageError>;

    /// Store `bytes` under `name`, replacing anything already there.
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    /// Remove the file stored under `name`.
    fn delete(&self, name: &str) -> Result<(), StorageError>;

    /// Public URL for `name`, suitable for embedding in markup.
    fn url(&self, name: &str) -> String;

    /// Real filesystem paths, when the backend has them.
    fn local_paths(&self) -> Option<&dyn LocalPaths> {
        None
    }
}

/// Optional capability: map storage names to real filesystem paths.
pub trait LocalPaths {
    fn path(&self, name: &str) -> Result<PathBuf, StorageError>;
}

/// Join a base URL and a storage name with exactly one `/` between them.
fn join_url(base_url: &str, name: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        name.trim_start_matches('/')
    )
}

// ============================================================================
// Filesystem
// ============================================================================

/// Media directory on local disk, served under `base_url`.
#[derive(Debug, Clone)]
pub struct FileSystemStorage {
    root: PathBuf,
    base_url: String,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage name below the root, rejecting anything that could
    /// escape it (absolute paths, `..`).
    fn resolve(&self, name: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(name);
        let mut path = self.root.clone();
        let mut any = false;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    path.push(part);
                    any = true;
                }
                Component::CurDir => {}
                _ => return Err(StorageError::InvalidName(name.to_string())),
            }
        }
        if !any {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(path)
    }
}

impl Storage for FileSystemStorage {
    fn exists(&self, name: &str) -> bool {
        self.resolve(name).is_ok_and(|p| p.is_file())
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>, StorageError> {
        let path = self.resolve(name)?;
        match fs::File::open(&path) {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::Io(e)),
        }
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }

    fn local_paths(&self) -> Option<&dyn LocalPaths> {
        Some(self)
    }
}

impl LocalPaths for FileSystemStorage {
    fn path(&self, name: &str) -> Result<PathBuf, StorageError> {
        self.resolve(name)
    }
}

// ============================================================================
// In-memory object store
// ============================================================================

/// In-process object store with no path introspection.
///
/// Behaves like a remote bucket from the resolver's point of view: existence
/// is the only freshness signal. Counts mutating calls so tests can assert
/// that a cache hit wrote nothing.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    base_url: String,
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    writes: AtomicUsize,
    deletes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Copy of the bytes stored under `name`.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.lock().get(name).cloned()
    }

    /// All stored names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn delete_count(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A panicked writer leaves the map itself intact
        self.files
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn exists(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    fn open(&self, name: &str) -> Result<Box<dyn Read + '_>, StorageError> {
        self.get(name)
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read>)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))
    }

    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        self.lock().insert(name.to_string(), bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StorageError> {
        self.lock()
            .remove(name)
            .ok_or_else(|| StorageError::NotFound(name.to_string()))?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn url(&self, name: &str) -> String {
        join_url(&self.base_url, name)
    }
}
