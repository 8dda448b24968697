//! Section resolution
//!
//! Turns a package path plus a requested section kind into a read-only
//! filesystem view, composing a patch container over the base when one is
//! available. Patches come from an ordered, short-circuiting chain: a
//! patch embedded in the archive itself wins over one resolved through
//! the title's update sidecar.

use crate::container::{
    section_table_index, Container, ContainerOpener, ContentType, IntegrityLevel, PackageKind,
    SectionKind, CONTAINER_EXTENSION,
};
use crate::error::{GamepakError, Result};
use crate::vfs::{join_path, EntryKind, FileSystem};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves section views out of packages stored on a filesystem.
pub struct SectionResolver {
    packages: Arc<dyn FileSystem>,
    opener: Arc<dyn ContainerOpener>,
}

impl SectionResolver {
    pub fn new(packages: Arc<dyn FileSystem>, opener: Arc<dyn ContainerOpener>) -> Self {
        SectionResolver { packages, opener }
    }

    /// Resolve the filesystem view of `kind` inside the package at
    /// `package_path`.
    ///
    /// Fails before any destination I/O when the package has no main
    /// container or when the requested section exists in neither the base
    /// nor the patch.
    pub fn resolve(
        &self,
        package_path: &str,
        kind: SectionKind,
        integrity: IntegrityLevel,
        program_index: u8,
    ) -> Result<Arc<dyn FileSystem>> {
        let package_kind = PackageKind::from_path(package_path)
            .ok_or_else(|| GamepakError::UnknownPackageKind(package_path.to_string()))?;
        debug!(path = package_path, ?package_kind, "resolving section {kind:?}");

        let (base, archive_patch) = match package_kind {
            PackageKind::MultiContainerArchive => self.scan_archive(package_path)?,
            PackageKind::SingleContainer => {
                let file = self.packages.open_file(package_path)?;
                (self.opener.open_container(file)?, None)
            }
        };

        // archive-embedded patch takes precedence over the update sidecar
        let patch = match archive_patch {
            Some(patch) => Some(patch),
            None => base.resolve_update(program_index, integrity)?,
        };

        let index = section_table_index(kind, base.content_type())
            .ok_or(GamepakError::SectionMissing(kind))?;

        if let Some(patch) = patch {
            if patch.section_exists(index) {
                debug!(index, "opening patched section view");
                return base.open_section_with_patch(patch, index, integrity);
            }
        }
        if base.section_exists(index) {
            debug!(index, "opening base section view");
            return base.open_section(index, integrity);
        }
        Err(GamepakError::SectionMissing(kind))
    }

    /// Scan an archive for its base container and an optional embedded
    /// patch container.
    ///
    /// Only Program containers participate: the first one whose data-table
    /// slot is flagged as a patch is the patch container, the first plain
    /// one is the base. Extras of either role are logged and skipped. A
    /// missing base is fatal.
    fn scan_archive(
        &self,
        package_path: &str,
    ) -> Result<(Arc<dyn Container>, Option<Arc<dyn Container>>)> {
        let archive_file = self.packages.open_file(package_path)?;
        let archive = self.opener.open_archive(archive_file)?;

        let mut base: Option<Arc<dyn Container>> = None;
        let mut patch: Option<Arc<dyn Container>> = None;

        for entry in archive.read_dir("/")? {
            if entry.kind != EntryKind::File || !has_container_extension(&entry.name) {
                continue;
            }
            let container = self
                .opener
                .open_container(archive.open_file(&join_path("/", &entry.name))?)?;
            if container.content_type() != ContentType::Program {
                continue;
            }

            let data_index = match section_table_index(SectionKind::Data, ContentType::Program) {
                Some(index) => index,
                None => continue,
            };
            if container.is_patch_section(data_index) {
                if patch.is_none() {
                    patch = Some(container);
                } else {
                    warn!(entry = %entry.name, "ignoring extra patch container in archive");
                }
            } else if base.is_none() {
                base = Some(container);
            } else {
                warn!(entry = %entry.name, "ignoring extra base container in archive");
            }
        }

        let base = base.ok_or(GamepakError::MainContainerMissing)?;
        Ok((base, patch))
    }
}

fn has_container_extension(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, extension)| extension.eq_ignore_ascii_case(CONTAINER_EXTENSION))
        .unwrap_or(false)
}
