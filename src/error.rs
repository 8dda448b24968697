use thiserror::Error;

#[derive(Error, Debug)]
pub enum GamepakError {
    #[error("Unknown package kind for path: {0}")]
    UnknownPackageKind(String),

    #[error("Main container not present in package")]
    MainContainerMissing,

    #[error("Section {0:?} not present in base or patch container")]
    SectionMissing(crate::container::SectionKind),

    #[error("Container format error {code:#x}: {context}")]
    ContainerFormat { code: u32, context: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Not a file: {0}")]
    NotAFile(String),

    #[error("Filesystem is read-only")]
    ReadOnly,

    #[error("Save-data provisioning failed with code {code:#x}")]
    ProvisionFailed { code: u32 },

    #[error("Save data not found after successful provisioning")]
    SaveDataMissingAfterProvision,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GamepakError>;
