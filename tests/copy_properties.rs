//! Property tests for the buffered stream copier: chunk sizing, exact
//! byte accounting, and the flush-on-completion guarantee.

use gamepak::vfs::{memory::MemoryFileSystem, FileSystem, VfsFile};
use gamepak::{copy_file, BufferPool, Result, COPY_CHUNK_SIZE};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

/// Destination wrapper recording every write and flush.
struct RecordingFile {
    inner: Arc<dyn VfsFile>,
    writes: Mutex<Vec<usize>>,
    flushes: Mutex<u32>,
}

impl RecordingFile {
    fn new(inner: Arc<dyn VfsFile>) -> Self {
        RecordingFile {
            inner,
            writes: Mutex::new(Vec::new()),
            flushes: Mutex::new(0),
        }
    }
}

impl VfsFile for RecordingFile {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        self.inner.read_at(offset, buf)
    }

    fn write_at(&self, offset: u64, buf: &[u8]) -> Result<usize> {
        self.writes.lock().push(buf.len());
        self.inner.write_at(offset, buf)
    }

    fn size(&self) -> Result<u64> {
        self.inner.size()
    }

    fn flush(&self) -> Result<()> {
        *self.flushes.lock() += 1;
        self.inner.flush()
    }
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 253) as u8).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn chunks_bounded_and_account_for_every_byte(total in 0usize..(3 * COPY_CHUNK_SIZE + 11)) {
        let fs = MemoryFileSystem::new();
        let payload = pattern(total);
        fs.put("/src", &payload).unwrap();

        let src = fs.open_file("/src").unwrap();
        let dst = RecordingFile::new(fs.create_file("/dst", total as u64).unwrap());

        let pool = BufferPool::new();
        copy_file(src.as_ref(), &dst, total as u64, &pool).unwrap();

        let writes = dst.writes.lock().clone();
        // no chunk exceeds the ceiling or the remaining bytes
        prop_assert!(writes.iter().all(|&w| w <= COPY_CHUNK_SIZE));
        prop_assert!(writes.iter().all(|&w| w > 0));
        // chunk lengths sum to the total exactly
        prop_assert_eq!(writes.iter().sum::<usize>(), total);
        // a zero-length copy transfers no chunks but still flushes
        if total == 0 {
            prop_assert!(writes.is_empty());
        }
        prop_assert_eq!(*dst.flushes.lock(), 1);

        let mut copied = vec![0u8; total];
        dst.read_at(0, &mut copied).unwrap();
        prop_assert_eq!(copied, payload);
    }

    #[test]
    fn only_final_chunk_is_short(total in 1usize..(3 * COPY_CHUNK_SIZE)) {
        let fs = MemoryFileSystem::new();
        fs.put("/src", &pattern(total)).unwrap();

        let src = fs.open_file("/src").unwrap();
        let dst = RecordingFile::new(fs.create_file("/dst", total as u64).unwrap());

        let pool = BufferPool::new();
        copy_file(src.as_ref(), &dst, total as u64, &pool).unwrap();

        let writes = dst.writes.lock().clone();
        if writes.len() > 1 {
            for &w in &writes[..writes.len() - 1] {
                prop_assert_eq!(w, COPY_CHUNK_SIZE);
            }
        }
    }
}
