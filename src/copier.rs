//! Buffered stream and directory tree copying
//!
//! [`copy_file`] moves one file's bytes in bounded chunks;
//! [`copy_directory`] mirrors a source subtree onto a destination,
//! polling a [`CancelFlag`] before every entry. Cancellation is an `Ok`
//! outcome, never an error: the first error or cancellation stops the
//! traversal and already-written data is left in place.

use crate::cancel::CancelFlag;
use crate::error::Result;
use crate::vfs::{join_path, EntryKind, FileSystem, VfsFile};
use parking_lot::Mutex;
use tracing::{debug, info};

/// Ceiling on a single transfer chunk.
pub const COPY_CHUNK_SIZE: usize = 1024 * 1024;

/// Terminal state of a copy operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyStatus {
    Completed,
    Cancelled,
}

impl CopyStatus {
    pub fn cancelled(&self) -> bool {
        matches!(self, CopyStatus::Cancelled)
    }
}

/// Free list of chunk buffers reused across the files of one copy
/// operation, bounding allocation under repeated large-file copies.
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

impl BufferPool {
    pub fn new() -> Self {
        BufferPool {
            buffers: Mutex::new(Vec::new()),
        }
    }

    /// Take a chunk-sized buffer, allocating when the pool is empty. The
    /// guard returns the buffer on drop.
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let buffer = self
            .buffers
            .lock()
            .pop()
            .unwrap_or_else(|| vec![0u8; COPY_CHUNK_SIZE]);
        PooledBuffer {
            pool: self,
            buffer: Some(buffer),
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.buffers.lock().len()
    }
}

/// Scoped lease on a pool buffer.
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Option<Vec<u8>>,
}

impl PooledBuffer<'_> {
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // invariant: buffer is Some until drop
        self.buffer
            .as_mut()
            .map(|b| b.as_mut_slice())
            .unwrap_or(&mut [])
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.buffers.lock().push(buffer);
        }
    }
}

/// Copy `total` bytes from `src` to `dst` in chunks of at most
/// [`COPY_CHUNK_SIZE`], then flush the destination. A short read or
/// short write aborts immediately.
pub fn copy_file(
    src: &dyn VfsFile,
    dst: &dyn VfsFile,
    total: u64,
    pool: &BufferPool,
) -> Result<()> {
    let mut lease = pool.acquire();
    let buffer = lease.as_mut_slice();

    let mut offset = 0u64;
    while offset < total {
        let chunk = (total - offset).min(COPY_CHUNK_SIZE as u64) as usize;
        let read = src.read_at(offset, &mut buffer[..chunk])?;
        if read != chunk {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("short read: wanted {chunk} bytes at offset {offset}, got {read}"),
            )
            .into());
        }
        let written = dst.write_at(offset, &buffer[..chunk])?;
        if written != chunk {
            return Err(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("short write: wanted {chunk} bytes at offset {offset}, wrote {written}"),
            )
            .into());
        }
        offset += chunk as u64;
    }
    // zero-length files transfer no chunks but are still flushed
    dst.flush()
}

/// Mirror the subtree at `src_root` onto `dst_root`, depth-first in
/// pre-order, checking `cancel` before every entry.
pub fn copy_directory(
    src_fs: &dyn FileSystem,
    src_root: &str,
    dst_fs: &dyn FileSystem,
    dst_root: &str,
    cancel: &CancelFlag,
) -> Result<CopyStatus> {
    // checked before the destination is touched at all, so a flag set
    // up-front leaves the destination unmodified
    if cancel.is_set() {
        info!(dst = dst_root, "copy cancelled before start");
        return Ok(CopyStatus::Cancelled);
    }
    let pool = BufferPool::new();
    let status = copy_tree(src_fs, src_root, dst_fs, dst_root, cancel, &pool)?;
    match status {
        CopyStatus::Completed => info!(dst = dst_root, "copy completed"),
        CopyStatus::Cancelled => info!(dst = dst_root, "copy cancelled"),
    }
    Ok(status)
}

fn copy_tree(
    src_fs: &dyn FileSystem,
    src_dir: &str,
    dst_fs: &dyn FileSystem,
    dst_dir: &str,
    cancel: &CancelFlag,
    pool: &BufferPool,
) -> Result<CopyStatus> {
    let entries = src_fs.read_dir(src_dir)?;
    dst_fs.create_dir(dst_dir)?;

    for entry in entries {
        if cancel.is_set() {
            return Ok(CopyStatus::Cancelled);
        }

        let src_path = join_path(src_dir, &entry.name);
        let dst_path = join_path(dst_dir, &entry.name);
        match entry.kind {
            EntryKind::Directory => {
                let status = copy_tree(src_fs, &src_path, dst_fs, &dst_path, cancel, pool)?;
                if status.cancelled() {
                    return Ok(status);
                }
            }
            EntryKind::File => {
                debug!(path = %src_path, size = entry.size, "copying file");
                let src = src_fs.open_file(&src_path)?;
                let dst = dst_fs.create_file(&dst_path, entry.size)?;
                copy_file(src.as_ref(), dst.as_ref(), entry.size, pool)?;
            }
        }
    }
    Ok(CopyStatus::Completed)
}
