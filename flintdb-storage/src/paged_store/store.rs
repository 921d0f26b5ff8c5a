//! [`PagedStore`]: the block-structured record file.

use std::fs::{File, OpenOptions};
use std::ops::{Deref, DerefMut};
use std::os::unix::fs::FileExt;
#[cfg(target_os = "linux")]
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;

use flintdb_core::{Error, IoType, OpenMode, Result};

use crate::format::FileHeader as FileHeaderTrait;
use crate::traits::Storage;

use super::aligned_buf::{AlignedBuf, DEFAULT_ALIGNMENT};
use super::block::{BlockHeader, BLOCK_HEADER_SIZE};
use super::header::{PagedStoreHeader, FIXED_HEADER_SIZE};
use super::PagedStoreOptions;

/// Either a plain heap buffer or a [`AlignedBuf`], chosen by whether the
/// owning store needs `O_DIRECT`-safe I/O. Lets the read/write call sites
/// below stay oblivious to which one backs a given operation.
enum BlockBuf {
    Plain(Vec<u8>),
    Aligned(AlignedBuf),
}

impl BlockBuf {
    fn new(alignment: u64, len: usize) -> Self {
        if alignment > 1 {
            BlockBuf::Aligned(AlignedBuf::new(len, alignment as usize))
        } else {
            BlockBuf::Plain(vec![0u8; len])
        }
    }
}

impl Deref for BlockBuf {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            BlockBuf::Plain(v) => v,
            BlockBuf::Aligned(a) => a,
        }
    }
}

impl DerefMut for BlockBuf {
    fn deref_mut(&mut self) -> &mut [u8] {
        match self {
            BlockBuf::Plain(v) => v,
            BlockBuf::Aligned(a) => a,
        }
    }
}

fn round_up(x: usize, alignment: usize) -> usize {
    (x + alignment - 1) / alignment * alignment
}

struct Inner {
    file: File,
    header: PagedStoreHeader,
    block_size: u64,
    data_start: u64,
    data_end: u64,
    allocated_file_size: u64,
    increment: u64,
    /// I/O alignment in bytes: 1 for buffered stores, `DEFAULT_ALIGNMENT`
    /// (or a device-specific multiple of it) for direct I/O stores. Every
    /// `pread`/`pwrite` against `file` goes through a buffer sized and
    /// aligned to this value.
    alignment: u64,
}

/// A block-structured record store over a single file.
///
/// Holds its mutable state (file handle, header, allocation cursors) behind
/// a [`parking_lot::Mutex`] so the [`Storage`] trait's methods can take
/// `&self`; callers above this layer are still expected to serialize their
/// own writes (see the crate's concurrency notes).
pub struct PagedStore {
    path: PathBuf,
    mode: OpenMode,
    io_type: IoType,
    inner: Mutex<Inner>,
    closed: AtomicBool,
}

impl PagedStore {
    /// Opens or creates a paged store file.
    pub fn open<P: AsRef<Path>>(path: P, options: PagedStoreOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if options.io_type == IoType::Direct && !cfg!(target_os = "linux") {
            return Err(Error::Unsupported(
                "direct I/O is only supported on linux".to_string(),
            ));
        }
        let alignment: u64 = if options.io_type == IoType::Direct {
            DEFAULT_ALIGNMENT as u64
        } else {
            1
        };

        let mut open_options = OpenOptions::new();
        open_options.read(true);
        match options.mode {
            OpenMode::ReadWrite => {
                open_options.write(true).create(true);
            }
            OpenMode::ReadOnly => {}
        }
        #[cfg(target_os = "linux")]
        if options.io_type == IoType::Direct {
            open_options.custom_flags(libc::O_DIRECT);
        }

        let file = open_options.open(&path)?;
        let file_len = file.metadata()?.len();

        let (header, data_start) = if file_len == 0 {
            if options.mode == OpenMode::ReadOnly {
                return Err(Error::ReadOnly);
            }
            if options.block_bytes == 0 {
                return Err(Error::InvalidHeader(
                    "block_bytes must be nonzero".to_string(),
                ));
            }
            let header = PagedStoreHeader::new(
                options.block_bytes,
                BLOCK_HEADER_SIZE as u32,
                vec![0u8; options.extra_header_bytes],
            );
            let block_size = header.block_size();
            if options.io_type == IoType::Direct && block_size % alignment != 0 {
                return Err(Error::Unsupported(format!(
                    "block size {block_size} is not a multiple of the direct I/O alignment \
                     ({alignment} bytes); choose a block_bytes value where block_bytes + {} \
                     is a multiple of {alignment}",
                    BLOCK_HEADER_SIZE
                )));
            }
            let encoded = header.encode();
            let mut block_buf = vec![0u8; block_size as usize];
            block_buf[..encoded.len()].copy_from_slice(&encoded);
            Self::write_block_to_file(&file, alignment, 0, &block_buf)?;
            (header, block_size)
        } else {
            let probe_size = round_up(FIXED_HEADER_SIZE, alignment as usize);
            let probe = Self::read_block_from_file(&file, alignment, probe_size, 0)?;
            let extra_len = u32::from_le_bytes(probe[40..44].try_into().unwrap()) as usize;
            let required = FIXED_HEADER_SIZE + extra_len;
            let full = if required <= probe_size {
                probe[..required].to_vec()
            } else {
                let full_size = round_up(required, alignment as usize);
                let mut buf = Self::read_block_from_file(&file, alignment, full_size, 0)?;
                buf.truncate(required);
                buf
            };
            let header = PagedStoreHeader::decode(&full)?;
            let block_size = header.block_size();
            if options.io_type == IoType::Direct && block_size % alignment != 0 {
                return Err(Error::Unsupported(format!(
                    "existing block size {block_size} is not a multiple of the direct I/O \
                     alignment ({alignment} bytes); reopen with Buffered I/O instead"
                )));
            }
            (header, block_size)
        };

        let allocated_file_size = file.metadata()?.len().max(data_start);
        let increment = options
            .increment
            .unwrap_or(64 * header.block_bytes as u64);

        let inner = Inner {
            file,
            header,
            block_size: data_start,
            data_start,
            data_end: allocated_file_size,
            allocated_file_size,
            increment,
            alignment,
        };

        log::debug!(
            "opened paged store {:?} (block_size={}, count={}, bytes={})",
            path,
            inner.block_size,
            inner.header.count,
            inner.header.bytes
        );

        Ok(Self {
            path,
            mode: options.mode,
            io_type: options.io_type,
            inner: Mutex::new(inner),
            closed: AtomicBool::new(false),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn require_writable(&self) -> Result<()> {
        if self.mode == OpenMode::ReadOnly {
            return Err(Error::ReadOnly);
        }
        Ok(())
    }

    fn validate_offset(inner: &Inner, offset: i64) -> Result<u64> {
        if offset <= 0 {
            return Err(Error::InvalidOffset(offset));
        }
        let off = offset as u64;
        if off < inner.data_start || off % inner.block_size != 0 || off >= inner.data_end {
            return Err(Error::InvalidOffset(offset));
        }
        Ok(off)
    }

    /// Reads `size` bytes at `offset` through an alignment-appropriate
    /// buffer. The single real `pread` call site for this module.
    fn read_block_from_file(file: &File, alignment: u64, size: usize, offset: u64) -> Result<Vec<u8>> {
        let mut buf = BlockBuf::new(alignment, size);
        file.read_at(&mut buf, offset)?;
        Ok(buf.to_vec())
    }

    /// Writes `data` at `offset` through an alignment-appropriate buffer.
    /// The single real `pwrite` call site for this module.
    fn write_block_to_file(file: &File, alignment: u64, offset: u64, data: &[u8]) -> Result<()> {
        let mut buf = BlockBuf::new(alignment, data.len());
        buf.copy_from_slice(data);
        file.write_at(&buf, offset)?;
        Ok(())
    }

    /// Reads one full block (header + payload region) at `offset`.
    fn read_block_raw(inner: &Inner, offset: u64) -> Result<Vec<u8>> {
        Self::read_block_from_file(&inner.file, inner.alignment, inner.block_size as usize, offset)
    }

    /// Writes one full block-sized buffer at `offset`.
    fn write_block_raw(inner: &Inner, offset: u64, data: &[u8]) -> Result<()> {
        Self::write_block_to_file(&inner.file, inner.alignment, offset, data)
    }

    fn read_block_header(inner: &Inner, offset: u64) -> Result<BlockHeader> {
        let raw = Self::read_block_raw(inner, offset)?;
        BlockHeader::decode(&raw[..BLOCK_HEADER_SIZE])
    }

    fn read_block_payload(inner: &Inner, offset: u64, used_bytes: u16) -> Result<Vec<u8>> {
        if used_bytes == 0 {
            return Ok(Vec::new());
        }
        let raw = Self::read_block_raw(inner, offset)?;
        Ok(raw[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + used_bytes as usize].to_vec())
    }

    /// Rewrites only the header prefix of the block at `offset`, preserving
    /// whatever payload bytes currently follow it (read-modify-write, so a
    /// direct I/O store never issues a sub-block unaligned write).
    fn rewrite_block_header(inner: &mut Inner, offset: u64, header: &BlockHeader) -> Result<()> {
        let mut raw = Self::read_block_raw(inner, offset)?;
        raw[..BLOCK_HEADER_SIZE].copy_from_slice(&header.encode());
        Self::write_block_raw(inner, offset, &raw)
    }

    /// Walks the chain at `offset`, returning the ordered list of (offset,
    /// header) pairs. Fails if `offset` is not a live record head.
    fn walk_chain(inner: &Inner, offset: u64) -> Result<Vec<(u64, BlockHeader)>> {
        let head = Self::read_block_header(inner, offset)?;
        if !head.occupied || head.is_overflow {
            return Err(Error::InvalidOffset(offset as i64));
        }
        let mut chain = vec![(offset, head)];
        loop {
            let (_, last) = chain.last().unwrap();
            if !last.has_overflow {
                break;
            }
            let next = last.next_offset;
            if next < 0 {
                return Err(Error::Corrupt(format!(
                    "block at offset {offset} claims has_overflow but next_offset is -1"
                )));
            }
            let next = next as u64;
            let next_header = Self::read_block_header(inner, next)?;
            if !next_header.occupied || !next_header.is_overflow {
                return Err(Error::Corrupt(format!(
                    "overflow chain from offset {offset} broken at {next}"
                )));
            }
            chain.push((next, next_header));
        }
        Ok(chain)
    }

    fn blocks_needed(block_bytes: u32, payload_len: usize) -> u64 {
        if payload_len == 0 {
            return 1;
        }
        (payload_len as u64).div_ceil(block_bytes as u64)
    }

    /// Pops up to `n` blocks off the free-list, extending the file for any
    /// shortfall. Returned offsets are not yet linked into any chain.
    fn alloc_blocks(inner: &mut Inner, n: u64) -> Result<Vec<u64>> {
        let mut offsets = Vec::with_capacity(n as usize);
        while (offsets.len() as u64) < n && inner.header.free_head >= 0 {
            let off = inner.header.free_head as u64;
            let header = Self::read_block_header(inner, off)?;
            inner.header.free_head = header.next_offset;
            offsets.push(off);
        }
        while (offsets.len() as u64) < n {
            if inner.data_end + inner.block_size > inner.allocated_file_size {
                let grow_by = inner.increment.max(inner.block_size);
                let new_size = inner.allocated_file_size + grow_by;
                inner.file.set_len(new_size)?;
                inner.allocated_file_size = new_size;
            }
            let off = inner.data_end;
            inner.data_end += inner.block_size;
            offsets.push(off);
        }
        Ok(offsets)
    }

    /// Writes `payload` across `blocks` (already allocated, in chain order),
    /// wiring up `next_offset`/`is_overflow`/`has_overflow` for each.
    fn write_chain(inner: &mut Inner, blocks: &[u64], payload: &[u8]) -> Result<()> {
        let block_bytes = inner.header.block_bytes as usize;
        for (i, &off) in blocks.iter().enumerate() {
            let start = i * block_bytes;
            let end = (start + block_bytes).min(payload.len());
            let chunk = if start < payload.len() {
                &payload[start..end]
            } else {
                &[][..]
            };
            let has_overflow = i + 1 < blocks.len();
            let header = BlockHeader {
                occupied: true,
                is_overflow: i > 0,
                has_overflow,
                used_bytes: chunk.len() as u16,
                next_offset: if has_overflow { blocks[i + 1] as i64 } else { -1 },
            };
            let mut block_buf = vec![0u8; inner.block_size as usize];
            block_buf[..BLOCK_HEADER_SIZE].copy_from_slice(&header.encode());
            block_buf[BLOCK_HEADER_SIZE..BLOCK_HEADER_SIZE + chunk.len()].copy_from_slice(chunk);
            Self::write_block_raw(inner, off, &block_buf)?;
        }
        Ok(())
    }

    /// Frees the tail `E - N` blocks of a chain whose first `N` blocks are
    /// being reused, pushing them onto the free-list LIFO-style.
    fn free_suffix(inner: &mut Inner, chain: &[(u64, BlockHeader)], keep: usize) -> Result<()> {
        if keep >= chain.len() {
            return Ok(());
        }
        let old_free_head = inner.header.free_head;
        let tail: Vec<(u64, i64)> = chain
            .iter()
            .enumerate()
            .skip(keep)
            .map(|(idx, (off, header))| {
                let is_tail = idx == chain.len() - 1;
                let next_offset = if is_tail { old_free_head } else { header.next_offset };
                (*off, next_offset)
            })
            .collect();
        for (off, next_offset) in tail {
            let freed = BlockHeader {
                occupied: false,
                is_overflow: false,
                has_overflow: next_offset >= 0,
                used_bytes: 0,
                next_offset,
            };
            Self::rewrite_block_header(inner, off, &freed)?;
        }
        inner.header.free_head = chain[keep].0 as i64;
        Ok(())
    }

    /// Splices `offset` out of the free-list. Returns an error if `offset`
    /// is not currently a free-list node.
    fn splice_from_free_list(inner: &mut Inner, offset: u64) -> Result<BlockHeader> {
        if inner.header.free_head == offset as i64 {
            let header = Self::read_block_header(inner, offset)?;
            inner.header.free_head = header.next_offset;
            return Ok(header);
        }
        let mut cursor = inner.header.free_head;
        while cursor >= 0 {
            let cursor_off = cursor as u64;
            let cursor_header = Self::read_block_header(inner, cursor_off)?;
            if cursor_header.next_offset == offset as i64 {
                let target_header = Self::read_block_header(inner, offset)?;
                let mut relinked = cursor_header;
                relinked.next_offset = target_header.next_offset;
                relinked.has_overflow = target_header.next_offset >= 0;
                Self::rewrite_block_header(inner, cursor_off, &relinked)?;
                return Ok(target_header);
            }
            cursor = cursor_header.next_offset;
        }
        Err(Error::InvalidOffset(offset as i64))
    }

    /// Re-materializes `payload` at exactly `offset`, which must currently
    /// be the head of a free-list node. Required for restoring a deleted
    /// record to its original offset during transaction rollback.
    pub fn write_at_new(&self, offset: i64, payload: &[u8]) -> Result<()> {
        self.require_writable()?;
        self.closed_guard()?;
        let mut inner = self.inner.lock();
        if offset <= 0 || offset as u64 % inner.block_size != 0 {
            return Err(Error::InvalidOffset(offset));
        }
        let off = offset as u64;
        Self::splice_from_free_list(&mut inner, off)?;

        let n = Self::blocks_needed(inner.header.block_bytes, payload.len());
        let mut rest = Self::alloc_blocks(&mut inner, n - 1)?;
        let mut blocks = Vec::with_capacity(n as usize);
        blocks.push(off);
        blocks.append(&mut rest);

        Self::write_chain(&mut inner, &blocks, payload)?;
        inner.header.count += 1;
        inner.header.bytes += payload.len() as i64;
        Ok(())
    }

    fn closed_guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Unsupported("store is closed".to_string()));
        }
        Ok(())
    }

    fn flush_header(inner: &mut Inner) -> Result<()> {
        let encoded = inner.header.encode();
        if encoded.len() as u64 > inner.block_size {
            return Err(Error::Corrupt(
                "encoded header exceeds block size".to_string(),
            ));
        }
        let mut block_buf = vec![0u8; inner.block_size as usize];
        block_buf[..encoded.len()].copy_from_slice(&encoded);
        Self::write_block_raw(inner, 0, &block_buf)?;
        Ok(())
    }
}

impl Storage for PagedStore {
    fn count(&self) -> i64 {
        self.inner.lock().header.count
    }

    fn bytes(&self) -> i64 {
        self.inner.lock().header.bytes
    }

    fn read(&self, offset: i64) -> Result<Bytes> {
        self.closed_guard()?;
        let inner = self.inner.lock();
        let off = Self::validate_offset(&inner, offset)?;
        let chain = Self::walk_chain(&inner, off)?;
        let mut out = Vec::new();
        for (block_off, header) in &chain {
            out.extend(Self::read_block_payload(&inner, *block_off, header.used_bytes)?);
        }
        Ok(Bytes::from(out))
    }

    fn write(&self, payload: &[u8]) -> Result<i64> {
        self.require_writable()?;
        self.closed_guard()?;
        let mut inner = self.inner.lock();
        let n = Self::blocks_needed(inner.header.block_bytes, payload.len());
        let blocks = Self::alloc_blocks(&mut inner, n)?;
        Self::write_chain(&mut inner, &blocks, payload)?;
        inner.header.count += 1;
        inner.header.bytes += payload.len() as i64;
        log::trace!("wrote {} bytes at offset {}", payload.len(), blocks[0]);
        Ok(blocks[0] as i64)
    }

    fn write_at(&self, offset: i64, payload: &[u8]) -> Result<()> {
        self.require_writable()?;
        self.closed_guard()?;
        let mut inner = self.inner.lock();
        let off = Self::validate_offset(&inner, offset)?;
        let chain = Self::walk_chain(&inner, off)?;

        let old_len: i64 = chain.iter().map(|(_, h)| h.used_bytes as i64).sum();
        let e = chain.len() as u64;
        let n = Self::blocks_needed(inner.header.block_bytes, payload.len());

        let blocks: Vec<u64> = if n <= e {
            let keep = n as usize;
            Self::free_suffix(&mut inner, &chain, keep)?;
            chain[..keep].iter().map(|(o, _)| *o).collect()
        } else {
            let extra = Self::alloc_blocks(&mut inner, n - e)?;
            chain
                .iter()
                .map(|(o, _)| *o)
                .chain(extra)
                .collect()
        };

        Self::write_chain(&mut inner, &blocks, payload)?;
        inner.header.bytes += payload.len() as i64 - old_len;
        Ok(())
    }

    fn delete(&self, offset: i64) -> Result<()> {
        self.require_writable()?;
        self.closed_guard()?;
        let mut inner = self.inner.lock();
        let off = Self::validate_offset(&inner, offset)?;
        let chain = Self::walk_chain(&inner, off)?;
        let removed_bytes: i64 = chain.iter().map(|(_, h)| h.used_bytes as i64).sum();

        Self::free_suffix(&mut inner, &chain, 0)?;
        inner.header.count -= 1;
        inner.header.bytes -= removed_bytes;
        Ok(())
    }

    fn set_transaction(&self, _tx_id: Option<i64>) {
        // A bare PagedStore has no transaction concept; only WalStorage
        // interprets this call.
    }

    fn mmap(&self, offset: i64, length: i32) -> Result<Bytes> {
        self.head(offset, length)
    }

    fn head(&self, offset: i64, length: i32) -> Result<Bytes> {
        self.closed_guard()?;
        if self.io_type == IoType::Direct {
            return Err(Error::Unsupported(
                "raw byte-span views are unavailable on a direct I/O store".to_string(),
            ));
        }
        let inner = self.inner.lock();
        if offset < 0 || length < 0 {
            return Err(Error::InvalidOffset(offset));
        }
        let mut buf = vec![0u8; length as usize];
        inner.file.read_at(&mut buf, offset as u64)?;
        Ok(Bytes::from(buf))
    }

    fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut inner = self.inner.lock();
        if self.mode == OpenMode::ReadWrite {
            Self::flush_header(&mut inner)?;
            inner.file.sync_data()?;
        }
        log::debug!("closed paged store {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged_store::DEFAULT_BLOCK_BYTES;

    fn open_tmp() -> (tempfile::TempDir, PagedStore) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let store = PagedStore::open(&path, PagedStoreOptions::default()).unwrap();
        (dir, store)
    }

    #[test]
    fn simple_write_read() {
        let (_dir, store) = open_tmp();
        let off = store.write(b"hello").unwrap();
        assert_eq!(off, 512);
        assert_eq!(&store.read(off).unwrap()[..], b"hello");
        assert_eq!(store.count(), 1);
        assert_eq!(store.bytes(), 5);
    }

    #[test]
    fn overflow_chain() {
        let (_dir, store) = open_tmp();
        let payload = vec![0u8; 2000];
        let off = store.write(&payload).unwrap();
        let read_back = store.read(off).unwrap();
        assert_eq!(read_back.len(), 2000);

        let inner = store.inner.lock();
        let chain = PagedStore::walk_chain(&inner, off as u64).unwrap();
        assert_eq!(chain.len(), (2000u64).div_ceil(DEFAULT_BLOCK_BYTES as u64) as usize);
        assert_eq!(chain[0].1.next_offset, off + 512);
        assert!(!chain.last().unwrap().1.has_overflow);
    }

    #[test]
    fn free_list_reuse_is_lifo() {
        let (_dir, store) = open_tmp();
        let a = store.write(b"A").unwrap();
        let _b = store.write(b"B").unwrap();
        store.delete(a).unwrap();
        let c = store.write(b"C").unwrap();
        assert_eq!(c, a);
        assert_eq!(store.count(), 2);
        assert_eq!(store.bytes(), 2);
    }

    #[test]
    fn write_at_grows_and_shrinks() {
        let (_dir, store) = open_tmp();
        let off = store.write(b"short").unwrap();
        store.write_at(off, &vec![7u8; 2000]).unwrap();
        assert_eq!(store.read(off).unwrap().len(), 2000);

        store.write_at(off, b"tiny").unwrap();
        assert_eq!(&store.read(off).unwrap()[..], b"tiny");
        assert_eq!(off, store.write_at(off, b"tiny").map(|_| off).unwrap());
    }

    #[test]
    fn delete_then_read_is_invalid_offset() {
        let (_dir, store) = open_tmp();
        let off = store.write(b"gone").unwrap();
        store.delete(off).unwrap();
        assert!(matches!(store.read(off), Err(Error::InvalidOffset(_))));
    }

    #[test]
    fn write_at_new_restores_deleted_offset() {
        let (_dir, store) = open_tmp();
        let off = store.write(b"original").unwrap();
        store.delete(off).unwrap();
        store.write_at_new(off, b"original").unwrap();
        assert_eq!(&store.read(off).unwrap()[..], b"original");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn reopen_preserves_header_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let off;
        {
            let store = PagedStore::open(&path, PagedStoreOptions::default()).unwrap();
            off = store.write(b"persisted").unwrap();
            store.close().unwrap();
        }
        let store = PagedStore::open(&path, PagedStoreOptions::default()).unwrap();
        assert_eq!(&store.read(off).unwrap()[..], b"persisted");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn direct_io_rejects_misaligned_block_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        let options = PagedStoreOptions {
            block_bytes: 500, // 500 + 16 = 516, not a multiple of 512
            io_type: IoType::Direct,
            ..PagedStoreOptions::default()
        };
        let result = PagedStore::open(&path, options);
        assert!(matches!(result, Err(Error::Unsupported(_))));
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn direct_io_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.db");
        // default block size (512) is already a multiple of DEFAULT_ALIGNMENT (512).
        let options = PagedStoreOptions {
            io_type: IoType::Direct,
            ..PagedStoreOptions::default()
        };
        let store = PagedStore::open(&path, options).unwrap();
        let off = store.write(b"o_direct payload").unwrap();
        assert_eq!(&store.read(off).unwrap()[..], b"o_direct payload");
        store.delete(off).unwrap();
        store.write_at_new(off, b"o_direct payload").unwrap();
        assert_eq!(&store.read(off).unwrap()[..], b"o_direct payload");
    }
}
