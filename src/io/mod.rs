//! File-system access used by zipping, unzipping and project scanning
//!
//! Everything that touches a project's files goes through the [`FileIo`] trait so
//! the archive code can be pointed at any storage. [`LocalFileIo`] is the
//! `std::fs` implementation used in production.

mod scanner;

pub use scanner::ProjectScanner;

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Minimal file-system interface consumed by the archive code
pub trait FileIo: Send + Sync {
    /// Whether `path` exists (file or directory)
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is an existing directory
    fn is_dir(&self, path: &Path) -> bool;

    /// Read the whole file at `path`
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Write `data` to `path`, creating parent directories as needed
    fn write(&self, path: &Path, data: &[u8]) -> Result<()>;

    /// Direct children of the directory at `path`, sorted
    fn children(&self, path: &Path) -> Result<Vec<PathBuf>>;

    /// Create `path` and any missing parents
    fn create_dir_all(&self, path: &Path) -> Result<()>;
}

/// [`FileIo`] backed by the local file system
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalFileIo;

impl FileIo for LocalFileIo {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(std::fs::read(path)?)
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, data)?;
        Ok(())
    }

    fn children(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut children = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        children.sort();
        Ok(children)
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }
}

/// Every file and directory below `root` (excluding `root`), depth-first, sorted
pub fn walk(io: &dyn FileIo, root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for child in io.children(&dir)? {
            if io.is_dir(&child) {
                pending.push(child.clone());
            }
            found.push(child);
        }
    }

    found.sort();
    Ok(found)
}
