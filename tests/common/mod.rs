//! Shared test doubles for the external container library
//!
//! `FakeContainer`/`FakeOpener` stand in for the binary container format:
//! packages and archive entries hold a short tag string as their contents,
//! and the opener maps tags back to registered fakes. Patched views are
//! composed with the overlay filesystem, patch over base.

#![allow(dead_code)]

use gamepak::container::{Container, ContainerOpener, ContentType, IntegrityLevel};
use gamepak::error::{GamepakError, Result};
use gamepak::vfs::memory::MemoryFileSystem;
use gamepak::vfs::overlay::OverlayFileSystem;
use gamepak::vfs::{FileSystem, VfsFile};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

pub struct FakeContainer {
    content_type: ContentType,
    sections: HashMap<usize, MemoryFileSystem>,
    patch_flags: HashSet<usize>,
    update: Option<Arc<FakeContainer>>,
    corrupt: bool,
}

impl FakeContainer {
    pub fn new(content_type: ContentType) -> Self {
        FakeContainer {
            content_type,
            sections: HashMap::new(),
            patch_flags: HashSet::new(),
            update: None,
            corrupt: false,
        }
    }

    pub fn with_section(mut self, index: usize, fs: MemoryFileSystem) -> Self {
        self.sections.insert(index, fs);
        self
    }

    pub fn with_patch_section(mut self, index: usize, fs: MemoryFileSystem) -> Self {
        self.sections.insert(index, fs);
        self.patch_flags.insert(index);
        self
    }

    pub fn with_update(mut self, update: Arc<FakeContainer>) -> Self {
        self.update = Some(update);
        self
    }

    /// Simulate hash-tree damage: decoding at `ErrorOnInvalid` fails.
    pub fn corrupt(mut self) -> Self {
        self.corrupt = true;
        self
    }
}

impl Container for FakeContainer {
    fn content_type(&self) -> ContentType {
        self.content_type
    }

    fn section_exists(&self, index: usize) -> bool {
        self.sections.contains_key(&index)
    }

    fn is_patch_section(&self, index: usize) -> bool {
        self.patch_flags.contains(&index)
    }

    fn open_section(
        &self,
        index: usize,
        integrity: IntegrityLevel,
    ) -> Result<Arc<dyn FileSystem>> {
        if self.corrupt && integrity == IntegrityLevel::ErrorOnInvalid {
            return Err(GamepakError::ContainerFormat {
                code: 0x4202,
                context: "hash tree mismatch".to_string(),
            });
        }
        self.sections
            .get(&index)
            .map(|fs| Arc::new(fs.clone()) as Arc<dyn FileSystem>)
            .ok_or(GamepakError::ContainerFormat {
                code: 0x0002,
                context: format!("no section at index {index}"),
            })
    }

    fn open_section_with_patch(
        &self,
        patch: Arc<dyn Container>,
        index: usize,
        integrity: IntegrityLevel,
    ) -> Result<Arc<dyn FileSystem>> {
        let upper = patch.open_section(index, integrity)?;
        let lower = if self.section_exists(index) {
            Some(self.open_section(index, integrity)?)
        } else {
            None
        };
        Ok(Arc::new(OverlayFileSystem::new(upper, lower)))
    }

    fn resolve_update(
        &self,
        _program_index: u8,
        _integrity: IntegrityLevel,
    ) -> Result<Option<Arc<dyn Container>>> {
        Ok(self
            .update
            .clone()
            .map(|update| update as Arc<dyn Container>))
    }
}

/// Opener resolving tag strings stored as file contents.
#[derive(Default)]
pub struct FakeOpener {
    containers: HashMap<String, Arc<FakeContainer>>,
    archives: HashMap<String, MemoryFileSystem>,
}

impl FakeOpener {
    pub fn new() -> Self {
        FakeOpener::default()
    }

    pub fn register_container(&mut self, tag: &str, container: FakeContainer) {
        self.containers.insert(tag.to_string(), Arc::new(container));
    }

    /// Register an archive whose entries are `(name, container tag)`
    /// pairs.
    pub fn register_archive(&mut self, tag: &str, entries: &[(&str, &str)]) {
        let fs = MemoryFileSystem::new();
        for (name, container_tag) in entries {
            fs.put(&format!("/{name}"), container_tag.as_bytes())
                .expect("archive fixture");
        }
        self.archives.insert(tag.to_string(), fs);
    }
}

fn read_tag(file: &dyn VfsFile) -> Result<String> {
    let mut buf = vec![0u8; file.size()? as usize];
    file.read_at(0, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

impl ContainerOpener for FakeOpener {
    fn open_container(&self, file: Arc<dyn VfsFile>) -> Result<Arc<dyn Container>> {
        let tag = read_tag(file.as_ref())?;
        self.containers
            .get(&tag)
            .cloned()
            .map(|container| container as Arc<dyn Container>)
            .ok_or(GamepakError::ContainerFormat {
                code: 0x0001,
                context: format!("unknown container {tag:?}"),
            })
    }

    fn open_archive(&self, file: Arc<dyn VfsFile>) -> Result<Arc<dyn FileSystem>> {
        let tag = read_tag(file.as_ref())?;
        self.archives
            .get(&tag)
            .cloned()
            .map(|fs| Arc::new(fs) as Arc<dyn FileSystem>)
            .ok_or(GamepakError::ContainerFormat {
                code: 0x0003,
                context: format!("unknown archive {tag:?}"),
            })
    }
}

/// Build a section filesystem out of `(path, contents)` pairs.
pub fn section_fs(files: &[(&str, &[u8])]) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    for (path, contents) in files {
        fs.put(path, contents).expect("section fixture");
    }
    fs
}

/// Read a whole file out of a filesystem.
pub fn read_all(fs: &dyn FileSystem, path: &str) -> Vec<u8> {
    let file = fs.open_file(path).expect("open");
    let mut buf = vec![0u8; file.size().expect("size") as usize];
    file.read_at(0, &mut buf).expect("read");
    buf
}
