//! Container model
//!
//! The binary container format itself (header layout, key derivation,
//! hash-tree verification) lives behind the [`Container`] and
//! [`ContainerOpener`] traits; this crate only builds resolution logic on
//! top of them. Decode and integrity failures surface as
//! [`GamepakError::ContainerFormat`] with the library's code embedded.

use crate::error::Result;
use crate::vfs::{FileSystem, VfsFile};
use std::sync::Arc;

/// Content type tag carried in a container's header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Program,
    Control,
    Data,
    Manual,
}

/// Section kinds a caller may request from a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Code,
    Data,
    Logo,
}

/// Whether hash-tree mismatches during section decode are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityLevel {
    /// Decode without verification.
    None,
    /// Fail fast on the first integrity mismatch.
    ErrorOnInvalid,
}

/// Package classification derived from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    SingleContainer,
    MultiContainerArchive,
}

/// Extension carried by container entries inside an archive.
pub const CONTAINER_EXTENSION: &str = "nca";

impl PackageKind {
    /// Classify a package path by extension, case insensitive.
    pub fn from_path(path: &str) -> Option<PackageKind> {
        let extension = path.rsplit('.').next()?.to_ascii_lowercase();
        match extension.as_str() {
            "nsp" => Some(PackageKind::MultiContainerArchive),
            "nca" => Some(PackageKind::SingleContainer),
            _ => None,
        }
    }
}

/// Map a requested section kind to its slot in a container's section
/// table. The mapping depends on the container's content type: Program
/// containers carry code, data and logo sections; every other type
/// exposes a single data section.
pub fn section_table_index(kind: SectionKind, content_type: ContentType) -> Option<usize> {
    match content_type {
        ContentType::Program => Some(match kind {
            SectionKind::Code => 0,
            SectionKind::Data => 1,
            SectionKind::Logo => 2,
        }),
        _ => match kind {
            SectionKind::Data => Some(0),
            _ => None,
        },
    }
}

/// A sealed, content-addressed container holding typed sections.
pub trait Container: Send + Sync {
    fn content_type(&self) -> ContentType;

    /// Whether the section table has an entry at `index`.
    fn section_exists(&self, index: usize) -> bool;

    /// Whether the entry at `index` is a patch, a diff meant to be
    /// composed over a base container's same-kind section.
    fn is_patch_section(&self, index: usize) -> bool;

    /// Open a read-only filesystem view of one section.
    fn open_section(&self, index: usize, integrity: IntegrityLevel)
        -> Result<Arc<dyn FileSystem>>;

    /// Open the composed view of this container's section overlaid by
    /// `patch`'s same-index section.
    fn open_section_with_patch(
        &self,
        patch: Arc<dyn Container>,
        index: usize,
        integrity: IntegrityLevel,
    ) -> Result<Arc<dyn FileSystem>>;

    /// Resolve an externally tracked update container for this title,
    /// keyed by `program_index`. `Ok(None)` when no update is installed.
    fn resolve_update(
        &self,
        program_index: u8,
        integrity: IntegrityLevel,
    ) -> Result<Option<Arc<dyn Container>>>;
}

/// Entry point into the external container library.
pub trait ContainerOpener: Send + Sync {
    /// Decode a single sealed container.
    fn open_container(&self, file: Arc<dyn VfsFile>) -> Result<Arc<dyn Container>>;

    /// Open a multi-container archive as a filesystem of container entries.
    fn open_archive(&self, file: Arc<dyn VfsFile>) -> Result<Arc<dyn FileSystem>>;
}
