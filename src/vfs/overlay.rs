//! Read-only overlay filesystem
//!
//! Composes an upper filesystem over a lower one: lookups try the upper
//! first, directory listings merge both with the upper winning on name
//! collisions. This is the shape of a patched section view, where the
//! patch supplies replacement files over the base container's contents.

use super::{DirEntry, FileSystem, VfsFile};
use crate::error::{GamepakError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Union of two filesystems, upper over lower. Read-only.
pub struct OverlayFileSystem {
    upper: Arc<dyn FileSystem>,
    lower: Option<Arc<dyn FileSystem>>,
}

impl OverlayFileSystem {
    pub fn new(upper: Arc<dyn FileSystem>, lower: Option<Arc<dyn FileSystem>>) -> Self {
        OverlayFileSystem { upper, lower }
    }
}

impl FileSystem for OverlayFileSystem {
    fn read_dir(&self, path: &str) -> Result<Vec<DirEntry>> {
        if !self.exists(path) {
            return Err(GamepakError::NotFound(path.to_string()));
        }

        let mut merged: BTreeMap<String, DirEntry> = BTreeMap::new();
        if let Some(lower) = &self.lower {
            if lower.exists(path) {
                for entry in lower.read_dir(path)? {
                    merged.insert(entry.name.clone(), entry);
                }
            }
        }
        // upper shadows lower entries of the same name
        if self.upper.exists(path) {
            for entry in self.upper.read_dir(path)? {
                merged.insert(entry.name.clone(), entry);
            }
        }
        Ok(merged.into_values().collect())
    }

    fn open_file(&self, path: &str) -> Result<Arc<dyn VfsFile>> {
        match self.upper.open_file(path) {
            Ok(file) => Ok(file),
            Err(_) => match &self.lower {
                Some(lower) => lower.open_file(path),
                None => Err(GamepakError::NotFound(path.to_string())),
            },
        }
    }

    fn create_file(&self, _path: &str, _size: u64) -> Result<Arc<dyn VfsFile>> {
        Err(GamepakError::ReadOnly)
    }

    fn create_dir(&self, _path: &str) -> Result<()> {
        Err(GamepakError::ReadOnly)
    }

    fn exists(&self, path: &str) -> bool {
        self.upper.exists(path)
            || self
                .lower
                .as_ref()
                .map(|l| l.exists(path))
                .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::memory::MemoryFileSystem;

    fn overlay() -> OverlayFileSystem {
        let lower = MemoryFileSystem::new();
        lower.put("/shared.bin", b"lower").unwrap();
        lower.put("/base_only.bin", b"base").unwrap();
        lower.put("/dir/deep.bin", b"deep").unwrap();

        let upper = MemoryFileSystem::new();
        upper.put("/shared.bin", b"upper").unwrap();
        upper.put("/patch_only.bin", b"patch").unwrap();

        OverlayFileSystem::new(Arc::new(upper), Some(Arc::new(lower)))
    }

    fn read_all(fs: &dyn FileSystem, path: &str) -> Vec<u8> {
        let file = fs.open_file(path).unwrap();
        let mut buf = vec![0u8; file.size().unwrap() as usize];
        file.read_at(0, &mut buf).unwrap();
        buf
    }

    #[test]
    fn test_upper_wins_on_collision() {
        let fs = overlay();
        assert_eq!(read_all(&fs, "/shared.bin"), b"upper");
    }

    #[test]
    fn test_falls_back_to_lower() {
        let fs = overlay();
        assert_eq!(read_all(&fs, "/base_only.bin"), b"base");
        assert_eq!(read_all(&fs, "/dir/deep.bin"), b"deep");
    }

    #[test]
    fn test_merged_listing() {
        let fs = overlay();
        let entries = fs.read_dir("/").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["base_only.bin", "dir", "patch_only.bin", "shared.bin"]
        );

        // collided entry carries the upper's size
        let shared = entries.iter().find(|e| e.name == "shared.bin").unwrap();
        assert_eq!(shared.size, 5);
    }

    #[test]
    fn test_read_only() {
        let fs = overlay();
        assert!(matches!(fs.create_dir("/x"), Err(GamepakError::ReadOnly)));
        assert!(matches!(
            fs.create_file("/x", 0),
            Err(GamepakError::ReadOnly)
        ));
    }

    #[test]
    fn test_no_lower() {
        let upper = MemoryFileSystem::new();
        upper.put("/only.bin", b"x").unwrap();
        let fs = OverlayFileSystem::new(Arc::new(upper), None);

        assert_eq!(read_all(&fs, "/only.bin"), b"x");
        assert!(matches!(
            fs.open_file("/gone"),
            Err(GamepakError::NotFound(_))
        ));
    }
}
