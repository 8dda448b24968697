//! Extraction pipeline entry point
//!
//! Glues the section resolver to the directory copier: resolve the
//! requested section of a package into a read-only view, then mirror it
//! into the destination. Resolution failures abort before any
//! destination I/O.

use crate::cancel::CancelFlag;
use crate::container::{IntegrityLevel, SectionKind};
use crate::copier::{copy_directory, CopyStatus};
use crate::error::Result;
use crate::resolver::SectionResolver;
use crate::vfs::FileSystem;
use tracing::info;

/// What to pull out of a package.
#[derive(Debug, Clone, Copy)]
pub struct ExtractRequest {
    pub section: SectionKind,
    pub integrity: IntegrityLevel,
    /// Program index used to key the title's update sidecar lookup.
    pub program_index: u8,
}

impl Default for ExtractRequest {
    fn default() -> Self {
        ExtractRequest {
            section: SectionKind::Data,
            integrity: IntegrityLevel::ErrorOnInvalid,
            program_index: 0,
        }
    }
}

/// Extract one section of the package at `package_path` into
/// `dest_root` on `dest_fs`.
///
/// Cancellation is surfaced as `Ok(CopyStatus::Cancelled)`, never as an
/// error; partially copied data is left in place.
pub fn extract_section(
    resolver: &SectionResolver,
    package_path: &str,
    request: &ExtractRequest,
    dest_fs: &dyn FileSystem,
    dest_root: &str,
    cancel: &CancelFlag,
) -> Result<CopyStatus> {
    info!(
        package = package_path,
        section = ?request.section,
        dst = dest_root,
        "extracting section"
    );
    let view = resolver.resolve(
        package_path,
        request.section,
        request.integrity,
        request.program_index,
    )?;
    copy_directory(view.as_ref(), "/", dest_fs, dest_root, cancel)
}
