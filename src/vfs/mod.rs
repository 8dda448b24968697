//! Virtual filesystem abstraction
//!
//! The extraction pipeline is written against these traits rather than a
//! concrete local disk, so the same directory copier serves both
//! container-to-disk and disk-to-disk copies. Three implementations ship
//! with the crate:
//!
//! - [`memory::MemoryFileSystem`] - in-memory tree, used for section views
//!   and tests
//! - [`host::HostFileSystem`] - `std::fs` backed, rooted at a directory
//! - [`overlay::OverlayFileSystem`] - read-only upper-over-lower union

pub mod host;
pub mod memory;
pub mod overlay;

use crate::error::{GamepakError, Result};
use std::sync::Arc;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry in a directory listing.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Declared size in bytes; zero for directories.
    pub size: u64,
}

/// A file handle supporting positional I/O.
///
/// Handles are shared via `Arc` and must be usable from `&self`;
/// implementations provide interior mutability where the backing store
/// needs it.
pub trait VfsFile: Send + Sync {
    /// Read up to `buf.len()` bytes at `offset`, returning the count read.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Write up to `buf.len()` bytes at `offset`, returning the count
    /// written. Writes past the current end extend the file.
    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize>;

    /// Current size of the file in bytes.
    fn size(&self) -> Result<u64>;

    /// Make previously written bytes durable.
    fn flush(&self) -> Result<()>;
}

/// A mountable namespace of files and directories.
///
/// Paths are `/`-separated; empty segments and `.` are ignored, `..` is
/// rejected. `read_dir` returns entries sorted by name so traversal order
/// is deterministic regardless of the backing store.
pub trait FileSystem: Send + Sync {
    /// Enumerate the immediate entries of a directory, sorted by name.
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Open an existing file for reading.
    fn open_file(&self, path: &str) -> Result<Arc<dyn VfsFile>>;

    /// Create a file sized to `size` bytes (zero-filled), overwriting any
    /// existing file at `path`. Parent directories must already exist.
    fn create_file(&self, path: &str, size: u64) -> Result<Arc<dyn VfsFile>>;

    /// Ensure a directory exists, creating it and any missing parents.
    /// Idempotent.
    fn create_dir(&self, path: &str) -> Result<()>;

    /// Whether a file or directory exists at `path`.
    fn exists(&self, path: &str) -> bool;
}

/// Split a virtual path into normalized segments.
///
/// Empty segments and `.` are dropped; `..` is rejected outright since no
/// filesystem here exposes a parent of its own root.
pub fn split_path(path: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(GamepakError::InvalidPath(path.to_string())),
            other => segments.push(other),
        }
    }
    Ok(segments)
}

/// Join a virtual directory path and an entry name.
pub fn join_path(base: &str, name: &str) -> String {
    if base.is_empty() || base == "/" {
        format!("/{name}")
    } else {
        format!("{}/{name}", base.trim_end_matches('/'))
    }
}
