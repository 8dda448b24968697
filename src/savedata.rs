//! Save-data location and provisioning
//!
//! Finds the on-disk directory backing a title's persistent save data,
//! provisioning a fresh record when none exists. The on-disk layout is a
//! two-phase commit: under each save's revision root, subdirectory `0`
//! holds the last committed state and `1` the in-progress working state.
//! At mount time committed wins over working; this module only ever
//! creates directories, it never deletes either revision.

use crate::error::{GamepakError, Result};
use parking_lot::Mutex;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Committed revision subdirectory name.
const COMMITTED_DIR: &str = "0";
/// Working revision subdirectory name.
const WORKING_DIR: &str = "1";

/// Sentinel save size substituted when a title ships no control data.
/// The directory-based layout never preallocates, so any nonzero value
/// satisfies the provisioning precondition; the magnitude is an external
/// convention of the backing index.
const PLACEHOLDER_SAVE_SIZE: u64 = 16 * 1024 * 1024;

const INDEX_FILE: &str = "index.json";

/// Save-data categories a filter can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SaveDataType {
    User,
    Device,
    Bcat,
}

/// Lookup key identifying at most one save-data record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveDataFilter {
    pub title_id: u64,
    pub save_type: SaveDataType,
    pub user_id: Option<u128>,
    /// Explicit save-data id; when set it overrides the other fields.
    pub save_id: Option<u64>,
}

impl SaveDataFilter {
    pub fn new(title_id: u64, save_type: SaveDataType, user_id: Option<u128>) -> Self {
        SaveDataFilter {
            title_id,
            save_type,
            user_id,
            save_id: None,
        }
    }
}

/// One provisioned save in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDataRecord {
    pub save_id: u64,
    pub title_id: u64,
    pub save_type: SaveDataType,
    pub user_id: Option<u128>,
}

impl SaveDataRecord {
    fn matches(&self, filter: &SaveDataFilter) -> bool {
        if let Some(save_id) = filter.save_id {
            return self.save_id == save_id;
        }
        self.title_id == filter.title_id
            && self.save_type == filter.save_type
            && self.user_id == filter.user_id
    }
}

/// Declared save sizes from a title's control data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlMetadata {
    pub user_save_size: u64,
    pub device_save_size: u64,
    pub bcat_save_size: u64,
}

impl ControlMetadata {
    /// True when no control data was available for the title.
    pub fn is_empty(&self) -> bool {
        self.user_save_size == 0 && self.device_save_size == 0 && self.bcat_save_size == 0
    }

    /// Dummy record used in place of missing control data.
    pub fn placeholder() -> Self {
        ControlMetadata {
            user_save_size: PLACEHOLDER_SAVE_SIZE,
            device_save_size: PLACEHOLDER_SAVE_SIZE,
            bcat_save_size: PLACEHOLDER_SAVE_SIZE,
        }
    }
}

/// The external save-data index: lookup and provisioning.
///
/// `provision` receives the full filter rather than just the title id so
/// the record it creates carries the save type and user the caller will
/// look it up by.
pub trait SaveDataIndex: Send + Sync {
    fn find(&self, filter: &SaveDataFilter) -> Result<Option<SaveDataRecord>>;

    fn provision(
        &self,
        filter: &SaveDataFilter,
        control: &ControlMetadata,
    ) -> Result<SaveDataRecord>;
}

/// Index persisted as a JSON record list under the save root.
pub struct JsonSaveDataIndex {
    root: PathBuf,
    records: Mutex<Vec<SaveDataRecord>>,
}

impl JsonSaveDataIndex {
    /// Load the index at `<root>/index.json`, starting empty when the
    /// file does not exist yet.
    pub fn load<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let index_path = root.join(INDEX_FILE);
        let records = if index_path.exists() {
            let contents = std::fs::read_to_string(&index_path)?;
            serde_json::from_str(&contents)?
        } else {
            Vec::new()
        };
        Ok(JsonSaveDataIndex {
            root,
            records: Mutex::new(records),
        })
    }

    fn persist(&self, records: &[SaveDataRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let contents = serde_json::to_string_pretty(records)?;
        std::fs::write(self.root.join(INDEX_FILE), contents)?;
        Ok(())
    }
}

impl SaveDataIndex for JsonSaveDataIndex {
    fn find(&self, filter: &SaveDataFilter) -> Result<Option<SaveDataRecord>> {
        let records = self.records.lock();
        Ok(records.iter().find(|r| r.matches(filter)).copied())
    }

    fn provision(
        &self,
        filter: &SaveDataFilter,
        _control: &ControlMetadata,
    ) -> Result<SaveDataRecord> {
        let mut records = self.records.lock();
        let mut rng = rand::thread_rng();
        let save_id = loop {
            let candidate: u64 = rng.gen();
            if candidate != 0 && !records.iter().any(|r| r.save_id == candidate) {
                break candidate;
            }
        };
        let record = SaveDataRecord {
            save_id,
            title_id: filter.title_id,
            save_type: filter.save_type,
            user_id: filter.user_id,
        };
        records.push(record);
        self.persist(records.as_slice())?;
        let save_id_hex = format!("{save_id:016x}");
        debug!(save_id = %save_id_hex, "provisioned save data");
        Ok(record)
    }
}

/// Locates (and provisions, when absent) the directory backing a title's
/// save data.
pub struct SaveDataLocator<I: SaveDataIndex> {
    index: I,
    save_root: PathBuf,
}

impl<I: SaveDataIndex> SaveDataLocator<I> {
    pub fn new<P: AsRef<Path>>(index: I, save_root: P) -> Self {
        SaveDataLocator {
            index,
            save_root: save_root.as_ref().to_path_buf(),
        }
    }

    pub fn index(&self) -> &I {
        &self.index
    }

    /// Return the authoritative revision directory for the save matched
    /// by `filter`, provisioning the save first when none exists.
    ///
    /// The committed (`0`) directory wins when present; otherwise the
    /// working (`1`) directory is returned, created for a fresh save.
    pub fn open_or_create(
        &self,
        title_id: u64,
        title_name: &str,
        control: &ControlMetadata,
        filter: &SaveDataFilter,
    ) -> Result<PathBuf> {
        let record = match self.index.find(filter)? {
            Some(record) => record,
            None => {
                let effective = if control.is_empty() {
                    debug!(title = title_name, "no control data, using placeholder sizes");
                    ControlMetadata::placeholder()
                } else {
                    *control
                };
                let title_id_hex = format!("{title_id:016x}");
                info!(
                    title = title_name,
                    title_id = %title_id_hex,
                    "provisioning new save data"
                );
                self.index.provision(filter, &effective)?;
                self.index
                    .find(filter)?
                    .ok_or(GamepakError::SaveDataMissingAfterProvision)?
            }
        };

        let revision_root = self.save_root.join(format!("{:016x}", record.save_id));
        if !revision_root.is_dir() {
            // an index entry can outlive its backing directory after a
            // botched recovery; recreate rather than fail
            warn!(path = %revision_root.display(), "save directory missing, recreating");
            std::fs::create_dir_all(&revision_root)?;
        }

        let committed = revision_root.join(COMMITTED_DIR);
        if committed.is_dir() {
            return Ok(committed);
        }
        let working = revision_root.join(WORKING_DIR);
        if !working.is_dir() {
            std::fs::create_dir_all(&working)?;
        }
        Ok(working)
    }
}
