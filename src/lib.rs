//! Game package section extraction and save-data provisioning
//!
//! Two subsystems built on a small virtual-filesystem abstraction:
//!
//! - **Extraction**: resolve a named section out of a game package (a
//!   single sealed container, a multi-container archive, or a split
//!   base+patch pair) and mirror it into an ordinary directory tree, with
//!   cooperative cancellation.
//! - **Save-data location**: find (or provision) the on-disk directory
//!   backing a title's persistent save data, following a two-phase commit
//!   layout where the committed revision wins over the working one.
//!
//! The binary container format itself lives behind the
//! [`container::Container`] / [`container::ContainerOpener`] traits; this
//! crate specifies only the resolution, copying and directory-selection
//! policy built on top.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gamepak::{extract_section, CancelFlag, ExtractRequest, SectionResolver};
//! use gamepak::vfs::host::HostFileSystem;
//! use std::sync::Arc;
//!
//! # fn demo(opener: Arc<dyn gamepak::container::ContainerOpener>) -> gamepak::Result<()> {
//! let packages = Arc::new(HostFileSystem::new("/games")?);
//! let resolver = SectionResolver::new(packages, opener);
//!
//! let dest = HostFileSystem::new("/tmp/extracted")?;
//! let cancel = CancelFlag::new();
//! let status = extract_section(
//!     &resolver,
//!     "/title.nsp",
//!     &ExtractRequest::default(),
//!     &dest,
//!     "/",
//!     &cancel,
//! )?;
//! if status.cancelled() {
//!     // partially copied data is left in place
//! }
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod container;
pub mod copier;
pub mod error;
pub mod extract;
pub mod resolver;
pub mod savedata;
pub mod vfs;

// Re-export commonly used types
pub use cancel::CancelFlag;
pub use container::{ContentType, IntegrityLevel, PackageKind, SectionKind};
pub use copier::{copy_directory, copy_file, BufferPool, CopyStatus, COPY_CHUNK_SIZE};
pub use error::{GamepakError, Result};
pub use extract::{extract_section, ExtractRequest};
pub use resolver::SectionResolver;
pub use savedata::{
    ControlMetadata, JsonSaveDataIndex, SaveDataFilter, SaveDataIndex, SaveDataLocator,
    SaveDataRecord, SaveDataType,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
