//! In-memory filesystem
//!
//! Backs resolved section views and test fixtures. The tree lives behind a
//! single `RwLock`; file contents are individually locked so open handles
//! stay valid across tree mutations.

use super::{split_path, DirEntry, EntryKind, FileSystem, VfsFile};
use crate::error::{GamepakError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A single in-memory file.
pub struct MemoryFile {
    data: RwLock<Vec<u8>>,
}

impl MemoryFile {
    pub fn new(data: Vec<u8>) -> Arc<Self> {
        Arc::new(MemoryFile {
            data: RwLock::new(data),
        })
    }

    fn len(&self) -> u64 {
        self.data.read().len() as u64
    }
}

impl VfsFile for MemoryFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let data = self.data.read();
        let offset = offset as usize;
        if offset >= data.len() {
            return Ok(0);
        }
        let available = data.len() - offset;
        let count = buf.len().min(available);
        buf[..count].copy_from_slice(&data[offset..offset + count]);
        Ok(count)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        let mut data = self.data.write();
        let end = offset as usize + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[offset as usize..end].copy_from_slice(buf);
        Ok(buf.len())
    }

    fn size(&self) -> Result<u64> {
        Ok(self.len())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

enum Node {
    File(Arc<MemoryFile>),
    Directory(BTreeMap<String, Node>),
}

/// In-memory filesystem rooted at `/`.
#[derive(Clone)]
pub struct MemoryFileSystem {
    root: Arc<RwLock<BTreeMap<String, Node>>>,
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        MemoryFileSystem {
            root: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Convenience for fixtures: create parent directories and write a file
    /// holding `data`.
    pub fn put(&self, path: &str, data: &[u8]) -> Result<()> {
        let segments = split_path(path)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| GamepakError::InvalidPath(path.to_string()))?;

        let mut root = self.root.write();
        let dir = descend_create(&mut root, parents, path)?;
        dir.insert(name.to_string(), Node::File(MemoryFile::new(data.to_vec())));
        Ok(())
    }
}

fn descend_create<'a>(
    root: &'a mut BTreeMap<String, Node>,
    parents: &[&str],
    path: &str,
) -> Result<&'a mut BTreeMap<String, Node>> {
    let mut dir = root;
    for segment in parents {
        let node = dir
            .entry(segment.to_string())
            .or_insert_with(|| Node::Directory(BTreeMap::new()));
        match node {
            Node::Directory(children) => dir = children,
            Node::File(_) => return Err(GamepakError::NotADirectory(path.to_string())),
        }
    }
    Ok(dir)
}

fn descend<'a>(
    root: &'a BTreeMap<String, Node>,
    segments: &[&str],
    path: &str,
) -> Result<&'a BTreeMap<String, Node>> {
    let mut dir = root;
    for segment in segments {
        match dir.get(*segment) {
            Some(Node::Directory(children)) => dir = children,
            Some(Node::File(_)) => return Err(GamepakError::NotADirectory(path.to_string())),
            None => return Err(GamepakError::NotFound(path.to_string())),
        }
    }
    Ok(dir)
}

impl FileSystem for MemoryFileSystem {
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        let segments = split_path(path)?;
        let root = self.root.read();
        let dir = descend(&root, &segments, path)?;

        // BTreeMap iteration is already name-ordered
        Ok(dir
            .iter()
            .map(|(name, node)| match node {
                Node::File(file) => DirEntry {
                    name: name.clone(),
                    kind: EntryKind::File,
                    size: file.len(),
                },
                Node::Directory(_) => DirEntry {
                    name: name.clone(),
                    kind: EntryKind::Directory,
                    size: 0,
                },
            })
            .collect())
    }

    fn open_file(&self, path: &str) -> Result<Arc<dyn VfsFile>> {
        let segments = split_path(path)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| GamepakError::NotAFile(path.to_string()))?;

        let root = self.root.read();
        let dir = descend(&root, parents, path)?;
        match dir.get(*name) {
            Some(Node::File(file)) => Ok(file.clone() as Arc<dyn VfsFile>),
            Some(Node::Directory(_)) => Err(GamepakError::NotAFile(path.to_string())),
            None => Err(GamepakError::NotFound(path.to_string())),
        }
    }

    fn create_file(&self, path: &str, size: u64) -> Result<Arc<dyn VfsFile>> {
        let segments = split_path(path)?;
        let (name, parents) = segments
            .split_last()
            .ok_or_else(|| GamepakError::InvalidPath(path.to_string()))?;

        let mut root = self.root.write();
        let dir = {
            // create_file only requires existing parents; resolve without creating
            let mut current = &mut *root;
            for segment in parents {
                match current.get_mut(*segment) {
                    Some(Node::Directory(children)) => current = children,
                    Some(Node::File(_)) => {
                        return Err(GamepakError::NotADirectory(path.to_string()))
                    }
                    None => return Err(GamepakError::NotFound(path.to_string())),
                }
            }
            current
        };

        let file = MemoryFile::new(vec![0u8; size as usize]);
        dir.insert(name.to_string(), Node::File(file.clone()));
        Ok(file as Arc<dyn VfsFile>)
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        let segments = split_path(path)?;
        let mut root = self.root.write();
        descend_create(&mut root, &segments, path)?;
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let Ok(segments) = split_path(path) else {
            return false;
        };
        let Some((name, parents)) = segments.split_last() else {
            // the root itself
            return true;
        };
        let root = self.root.read();
        match descend(&root, parents, path) {
            Ok(dir) => dir.contains_key(*name),
            Err(_) => false,
        }
    }
}
