//! Read-only access to a sysfs-like attribute tree
//!
//! Discovery and sampling only ever go through [`SysfsReader`], so the same
//! code runs against the real `/sys` ([`RealSysfs`]) or an in-memory tree
//! ([`MemorySysfs`]) in tests and benchmarks.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Directory listing and attribute reading
pub trait SysfsReader: Send + Sync {
    /// Full paths of the entries directly inside `dir`, in no particular order
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whole content of an attribute file
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Whether a file or directory exists at `path`
    fn exists(&self, path: &Path) -> bool;
}

/// The real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct RealSysfs;

impl SysfsReader for RealSysfs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            // An entry vanishing mid-listing only loses that entry
            match entry {
                Ok(entry) => entries.push(entry.path()),
                Err(e) => log::debug!("Skipping unreadable entry in {}: {}", dir.display(), e),
            }
        }
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// State of a file in a [`MemorySysfs`]
#[derive(Debug, Clone)]
enum MemoryFile {
    Content(String),
    Unreadable,
}

#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<PathBuf, MemoryFile>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryTree {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
            || self
                .files
                .keys()
                .chain(self.dirs.iter())
                .any(|p| p != path && p.starts_with(path))
    }
}

/// In-memory attribute tree.
///
/// Directories exist implicitly as ancestors of files, or explicitly via
/// [`MemorySysfs::with_dir`]. Files can be changed, removed or made
/// unreadable while a sampler is running against the tree.
#[derive(Debug, Default)]
pub struct MemorySysfs {
    tree: RwLock<MemoryTree>,
    reversed_listing: bool,
}

impl MemorySysfs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add a file with the given content
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.set_file(path, content);
        self
    }

    /// Builder: add an (empty) directory
    pub fn with_dir(self, path: impl Into<PathBuf>) -> Self {
        self.write_tree().dirs.insert(path.into());
        self
    }

    /// Builder: list directory entries in reverse order
    pub fn with_reversed_listing(mut self) -> Self {
        self.reversed_listing = true;
        self
    }

    /// Create or overwrite a file
    pub fn set_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.write_tree()
            .files
            .insert(path.into(), MemoryFile::Content(content.into()));
    }

    /// Keep the file listed but fail every read with `PermissionDenied`
    pub fn set_unreadable(&self, path: impl Into<PathBuf>) {
        self.write_tree()
            .files
            .insert(path.into(), MemoryFile::Unreadable);
    }

    /// Remove a file or an entire directory subtree
    pub fn remove(&self, path: &Path) {
        let mut tree = self.write_tree();
        tree.files.retain(|p, _| !p.starts_with(path));
        tree.dirs.retain(|p| !p.starts_with(path));
    }

    fn write_tree(&self) -> std::sync::RwLockWriteGuard<'_, MemoryTree> {
        self.tree.write().unwrap_or_else(|poisoned| {
            log::warn!("Memory sysfs lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_tree(&self) -> std::sync::RwLockReadGuard<'_, MemoryTree> {
        self.tree.read().unwrap_or_else(|poisoned| {
            log::warn!("Memory sysfs lock was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl SysfsReader for MemorySysfs {
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.read_tree();
        if !tree.is_dir(dir) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", dir.display()),
            ));
        }

        let children: BTreeSet<PathBuf> = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter_map(|p| {
                let rest = p.strip_prefix(dir).ok()?;
                let first = rest.components().next()?;
                Some(dir.join(first))
            })
            .collect();

        let mut entries: Vec<PathBuf> = children.into_iter().collect();
        if self.reversed_listing {
            entries.reverse();
        }
        Ok(entries)
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        match self.read_tree().files.get(path) {
            Some(MemoryFile::Content(content)) => Ok(content.clone()),
            Some(MemoryFile::Unreadable) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            )),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.read_tree();
        tree.files.contains_key(path) || tree.is_dir(path)
    }
}
