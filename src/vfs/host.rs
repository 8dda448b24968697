//! Host-disk filesystem
//!
//! Maps virtual `/` paths onto a root directory of the local disk. File
//! handles wrap `std::fs::File` behind a mutex so positional reads and
//! writes can be served from `&self`.

use super::{split_path, DirEntry, EntryKind, FileSystem, VfsFile};
use crate::error::{GamepakError, Result};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A host file served through the virtual filesystem interface.
pub struct HostFile {
    file: Mutex<File>,
}

impl VfsFile for HostFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        let mut total = 0;
        // plain read() may return short; loop until EOF or full
        while total < buf.len() {
            let n = file.read(&mut buf[total..])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(buf)?;
        Ok(buf.len())
    }

    fn size(&self) -> Result<u64> {
        let file = self.file.lock();
        Ok(file.metadata()?.len())
    }

    fn flush(&self) -> Result<()> {
        let mut file = self.file.lock();
        file.flush()?;
        file.sync_all()?;
        Ok(())
    }
}

/// Filesystem rooted at a directory of the local disk.
pub struct HostFileSystem {
    root: PathBuf,
}

impl HostFileSystem {
    /// Mount `root` as the filesystem's `/`. The directory must exist.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(GamepakError::NotADirectory(root.display().to_string()));
        }
        Ok(HostFileSystem { root })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        // split_path already rejects "..", so joining cannot escape root
        let mut resolved = self.root.clone();
        for segment in split_path(path)? {
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

impl FileSystem for HostFileSystem {
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = self.resolve(path)?;
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let metadata = entry.metadata()?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if metadata.is_dir() {
                entries.push(DirEntry {
                    name,
                    kind: EntryKind::Directory,
                    size: 0,
                });
            } else {
                entries.push(DirEntry {
                    name,
                    kind: EntryKind::File,
                    size: metadata.len(),
                });
            }
        }
        // host scan order is filesystem-dependent; sort for determinism
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open_file(&self, path: &str) -> Result<Arc<dyn VfsFile>> {
        let resolved = self.resolve(path)?;
        let file = OpenOptions::new().read(true).open(&resolved)?;
        Ok(Arc::new(HostFile {
            file: Mutex::new(file),
        }))
    }

    fn create_file(&self, path: &str, size: u64) -> Result<Arc<dyn VfsFile>> {
        let resolved = self.resolve(path)?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&resolved)?;
        file.set_len(size)?;
        Ok(Arc::new(HostFile {
            file: Mutex::new(file),
        }))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        let resolved = self.resolve(path)?;
        std::fs::create_dir_all(&resolved)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        match self.resolve(path) {
            Ok(resolved) => resolved.exists(),
            Err(_) => false,
        }
    }
}
