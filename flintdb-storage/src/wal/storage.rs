//! [`WalStorage`]: a per-file transactional wrapper around a [`PagedStore`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use flintdb_core::{Result, TxId};

use crate::paged_store::PagedStore;
use crate::traits::Storage;

use super::manager::ManagerShared;
use super::record::{Record, RecordOp};

/// Called after a restore/delete during rollback so callers holding their
/// own indexes over this storage's offsets can drop stale views.
pub type CacheInvalidateCallback = Box<dyn Fn(i64) + Send + Sync>;

#[derive(Default)]
struct TxState {
    tx_id: Option<TxId>,
    new_pages: HashSet<i64>,
    old_pages: HashMap<i64, Vec<u8>>,
    deleted_page_backups: HashMap<i64, Vec<u8>>,
}

/// Tracks new/overwritten/deleted pages within the active transaction and
/// emits metadata-only WAL records for each operation. Reads always go
/// straight to the underlying [`PagedStore`], since writes are immediate.
pub struct WalStorage {
    file_id: u32,
    store: PagedStore,
    shared: Arc<ManagerShared>,
    tx: Mutex<TxState>,
    cache_invalidate: Option<CacheInvalidateCallback>,
}

impl WalStorage {
    pub(crate) fn new(
        file_id: u32,
        store: PagedStore,
        shared: Arc<ManagerShared>,
        cache_invalidate: Option<CacheInvalidateCallback>,
    ) -> Self {
        Self {
            file_id,
            store,
            shared,
            tx: Mutex::new(TxState::default()),
            cache_invalidate,
        }
    }

    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    fn emit(&self, op: RecordOp, tx_id: TxId, offset: i64, payload: Option<Vec<u8>>) -> Result<()> {
        let record = Record {
            op,
            tx_id,
            file_id: self.file_id,
            page_offset: offset,
            payload,
        };
        let compressed = record
            .payload
            .as_ref()
            .is_some_and(|p| p.len() >= self.shared.config.compression_threshold);
        let encoded = record.encode(self.shared.config.compression_threshold);
        self.shared.append(encoded, compressed)
    }

    fn invalidate(&self, offset: i64) {
        if let Some(cb) = &self.cache_invalidate {
            cb(offset);
        }
    }

    /// Invoked by the [`WalManager`](crate::wal::WalManager) after it has
    /// appended the COMMIT record. A no-op if `tx_id` is not this storage's
    /// current transaction.
    pub(crate) fn commit(&self, tx_id: TxId) -> Result<()> {
        let mut tx = self.tx.lock();
        if tx.tx_id != Some(tx_id) {
            return Ok(());
        }
        tx.new_pages.clear();
        tx.old_pages.clear();
        tx.deleted_page_backups.clear();
        tx.tx_id = None;
        Ok(())
    }

    /// Invoked by the [`WalManager`](crate::wal::WalManager) before it
    /// appends the ROLLBACK record. A no-op if `tx_id` is not this
    /// storage's current transaction. Best-effort: an error restoring one
    /// entry is logged and the remaining entries are still attempted.
    pub(crate) fn rollback(&self, tx_id: TxId) -> Result<()> {
        let mut tx = self.tx.lock();
        if tx.tx_id != Some(tx_id) {
            return Ok(());
        }

        for off in tx.new_pages.drain() {
            if let Err(err) = self.store.delete(off) {
                log::warn!("rollback: failed to delete new page {off}: {err}");
            }
            self.invalidate(off);
        }
        for (off, bytes) in tx.old_pages.drain() {
            if let Err(err) = self.store.write_at(off, &bytes) {
                log::warn!("rollback: failed to restore page {off}: {err}");
            }
            self.invalidate(off);
        }
        for (off, bytes) in tx.deleted_page_backups.drain() {
            if let Err(err) = self.store.write_at_new(off, &bytes) {
                log::warn!("rollback: failed to re-materialize deleted page {off}: {err}");
            }
            self.invalidate(off);
        }

        tx.tx_id = None;
        Ok(())
    }
}

impl Storage for WalStorage {
    fn count(&self) -> i64 {
        self.store.count()
    }

    fn bytes(&self) -> i64 {
        self.store.bytes()
    }

    fn read(&self, offset: i64) -> Result<Bytes> {
        self.store.read(offset)
    }

    fn write(&self, payload: &[u8]) -> Result<i64> {
        let off = self.store.write(payload)?;
        let tx_id = {
            let mut tx = self.tx.lock();
            match tx.tx_id {
                Some(tx_id) => {
                    tx.new_pages.insert(off);
                    Some(tx_id)
                }
                None => None,
            }
        };
        if let Some(tx_id) = tx_id {
            self.emit(RecordOp::Write, tx_id, off, None)?;
        }
        Ok(off)
    }

    fn write_at(&self, offset: i64, payload: &[u8]) -> Result<()> {
        let tx_id = {
            let mut tx = self.tx.lock();
            match tx.tx_id {
                Some(tx_id) => {
                    if !tx.old_pages.contains_key(&offset) && !tx.new_pages.contains(&offset) {
                        let previous = self.store.read(offset)?;
                        tx.old_pages.insert(offset, previous.to_vec());
                    }
                    Some(tx_id)
                }
                None => None,
            }
        };

        self.store.write_at(offset, payload)?;

        if let Some(tx_id) = tx_id {
            let logged_payload = if self.shared.config.log_page_data {
                Some(payload.to_vec())
            } else {
                None
            };
            self.emit(RecordOp::Update, tx_id, offset, logged_payload)?;
        }
        Ok(())
    }

    fn delete(&self, offset: i64) -> Result<()> {
        let tx_id = {
            let mut tx = self.tx.lock();
            match tx.tx_id {
                Some(tx_id) => {
                    if tx.new_pages.remove(&offset) {
                        // allocated and freed within this transaction: no
                        // pre-transaction state to preserve.
                    } else {
                        let previous = self.store.read(offset)?;
                        tx.deleted_page_backups.insert(offset, previous.to_vec());
                        tx.old_pages.remove(&offset);
                    }
                    Some(tx_id)
                }
                None => None,
            }
        };

        self.store.delete(offset)?;

        if let Some(tx_id) = tx_id {
            self.emit(RecordOp::Delete, tx_id, offset, None)?;
        }
        Ok(())
    }

    fn set_transaction(&self, tx_id: Option<TxId>) {
        let mut tx = self.tx.lock();
        if tx.tx_id.is_some() && tx_id.is_some() {
            log::warn!("set_transaction called while a transaction is already active");
            return;
        }
        tx.tx_id = tx_id;
    }

    fn mmap(&self, offset: i64, length: i32) -> Result<Bytes> {
        self.store.mmap(offset, length)
    }

    fn head(&self, offset: i64, length: i32) -> Result<Bytes> {
        self.store.head(offset, length)
    }

    fn close(&self) -> Result<()> {
        self.store.close()
    }
}

impl std::fmt::Debug for WalStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalStorage")
            .field("file_id", &self.file_id)
            .field("path", &self.store.path())
            .finish()
    }
}
