//! The [`Storage`] trait consumed by everything above this crate.

use bytes::Bytes;
use flintdb_core::Result;

/// Uniform storage surface implemented by both [`PagedStore`] and
/// [`WalStorage`](crate::wal::WalStorage), so higher layers (the B+Tree
/// index, the table layer) never need to know whether a WAL is in play.
///
/// [`PagedStore`]: crate::paged_store::PagedStore
pub trait Storage: Send + Sync {
    fn count(&self) -> i64;
    fn bytes(&self) -> i64;
    fn read(&self, offset: i64) -> Result<Bytes>;
    fn write(&self, payload: &[u8]) -> Result<i64>;
    fn write_at(&self, offset: i64, payload: &[u8]) -> Result<()>;
    fn delete(&self, offset: i64) -> Result<()>;
    fn set_transaction(&self, tx_id: Option<i64>);
    /// Zero-copy view of a raw byte span. Optional: `Unsupported` on a
    /// Direct-I/O store.
    fn mmap(&self, offset: i64, length: i32) -> Result<Bytes>;
    /// Same contract as [`mmap`](Storage::mmap); kept distinct because some
    /// backends serve it more cheaply than a full mapping.
    fn head(&self, offset: i64, length: i32) -> Result<Bytes>;
    fn close(&self) -> Result<()>;
}
