//! [`WalManager`]: owns the WAL file, assigns transaction IDs, batches
//! records, and coordinates the [`WalStorage`] instances wrapped through it.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use flintdb_core::{Error, Result, SyncMode, TxId, WalMode};

use crate::format::FileHeader as FileHeaderTrait;
use crate::paged_store::{PagedStore, PagedStoreOptions};
use crate::traits::Storage;

use super::batch::Batch;
use super::config::WalConfig;
use super::header::{WalHeader, WAL_HEADER_SIZE};
use super::metrics::{TimedOperation, WalMetrics};
use super::record::{Record, RecordOp};
use super::storage::{CacheInvalidateCallback, WalStorage};

struct ManagerState {
    file: File,
    header: WalHeader,
    batch: Batch,
    append_position: u64,
    committed_since_checkpoint: u64,
    storages: Vec<Arc<WalStorage>>,
    storage_by_path: HashMap<PathBuf, usize>,
}

pub(crate) struct ManagerShared {
    pub(crate) config: WalConfig,
    pub(crate) metrics: WalMetrics,
    state: Mutex<ManagerState>,
}

impl ManagerShared {
    /// Appends one already-encoded record, flushing the batch first if
    /// it would overflow or the record is large enough to bypass it.
    pub(crate) fn append(&self, encoded: Vec<u8>, compressed: bool) -> Result<()> {
        let mut state = self.state.lock();
        if encoded.len() >= self.config.direct_write_threshold {
            self.flush_locked(&mut state, false)?;
            self.write_direct(&mut state, &encoded)?;
        } else {
            if state.batch.would_overflow(encoded.len())
                || state.batch.record_count() >= self.config.batch_size_limit
            {
                self.flush_locked(&mut state, false)?;
            }
            state.batch.push(&encoded);
            if state.batch.record_count() >= self.config.batch_size_limit {
                self.flush_locked(&mut state, false)?;
            }
        }
        self.metrics.record_append(encoded.len() as u64, compressed);
        Ok(())
    }

    fn write_direct(&self, state: &mut ManagerState, bytes: &[u8]) -> Result<()> {
        state.file.write_at(bytes, state.append_position)?;
        state.append_position += bytes.len() as u64;
        Ok(())
    }

    fn flush_locked(&self, state: &mut ManagerState, fsync: bool) -> Result<()> {
        if !state.batch.is_empty() {
            state.file.write_at(state.batch.as_slice(), state.append_position)?;
            state.append_position += state.batch.len() as u64;
            state.batch.clear();
            self.metrics.record_flush();
        }
        if fsync {
            self.sync(state)?;
        }
        Ok(())
    }

    fn sync(&self, state: &mut ManagerState) -> Result<()> {
        let timer = TimedOperation::start();
        match self.config.sync_mode.resolved() {
            SyncMode::Off => {}
            SyncMode::Normal => state.file.sync_data()?,
            SyncMode::Full | SyncMode::PlatformDefault => state.file.sync_all()?,
        }
        self.metrics.record_fsync(timer.complete());
        Ok(())
    }

    fn write_header(&self, state: &mut ManagerState) -> Result<()> {
        let encoded = state.header.encode();
        state.file.write_at(&encoded, 0)?;
        Ok(())
    }

    pub(crate) fn commit(&self, tx_id: TxId) -> Result<()> {
        let storages = self.state.lock().storages.clone();
        for storage in &storages {
            storage.commit(tx_id)?;
        }

        let record = Record::control(RecordOp::Commit, tx_id)
            .encode(self.config.compression_threshold);
        self.append(record, false)?;

        let mut state = self.state.lock();
        self.flush_locked(&mut state, true)?;
        state.header.committed_offset = state.append_position as i64;
        state.header.total_count += 1;
        state.committed_since_checkpoint += 1;
        self.write_header(&mut state)?;
        self.metrics.record_commit();

        let needs_checkpoint = state.committed_since_checkpoint >= self.config.checkpoint_interval;
        drop(state);
        if needs_checkpoint {
            self.checkpoint()?;
        }
        Ok(())
    }

    pub(crate) fn rollback(&self, tx_id: TxId) -> Result<()> {
        let storages = self.state.lock().storages.clone();
        for storage in &storages {
            storage.rollback(tx_id)?;
        }

        let record = Record::control(RecordOp::Rollback, tx_id)
            .encode(self.config.compression_threshold);
        self.append(record, false)?;

        let mut state = self.state.lock();
        self.flush_locked(&mut state, false)?;
        state.header.total_count += 1;
        self.write_header(&mut state)?;
        self.metrics.record_rollback();
        Ok(())
    }

    pub(crate) fn checkpoint(&self) -> Result<()> {
        let record = Record::control(RecordOp::Checkpoint, 0)
            .encode(self.config.compression_threshold);
        self.append(record, false)?;

        let mut state = self.state.lock();
        self.flush_locked(&mut state, true)?;
        state.header.checkpoint_offset = state.append_position as i64;
        state.committed_since_checkpoint = 0;
        self.write_header(&mut state)?;
        self.metrics.record_checkpoint();

        if self.config.wal_mode == WalMode::Truncate {
            let tail = state.append_position as i64;
            if (tail - state.header.checkpoint_offset).abs() <= 64 {
                state.file.set_len(WAL_HEADER_SIZE as u64)?;
                state.append_position = WAL_HEADER_SIZE as u64;
                state.header.checkpoint_offset = WAL_HEADER_SIZE as i64;
                state.header.committed_offset = WAL_HEADER_SIZE as i64;
                self.write_header(&mut state)?;
            }
        }
        Ok(())
    }
}

/// Coordinates a set of [`WalStorage`] instances against a single WAL file.
///
/// `WalManager::None` is the `WAL_NONE` sentinel from the original design:
/// every method becomes a no-op and `wrap` hands back the raw
/// [`PagedStore`] unwrapped, so callers stay uniform whether or not a WAL
/// is in play.
pub enum WalManager {
    None,
    Active(Arc<ManagerShared>),
}

impl WalManager {
    /// Opens or creates the WAL file at `path`.
    pub fn open<P: AsRef<Path>>(path: P, config: WalConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut open_options = OpenOptions::new();
        open_options.read(true).write(true).create(true);
        let file = open_options.open(&path)?;
        let file_len = file.metadata()?.len();

        let header = if file_len == 0 {
            let header = WalHeader::new();
            file.write_at(&header.encode(), 0)?;
            file.set_len(WAL_HEADER_SIZE as u64)?;
            header
        } else {
            let mut buf = vec![0u8; WAL_HEADER_SIZE];
            file.read_at(&mut buf, 0)?;
            WalHeader::decode(&buf)?
        };

        let append_position = file
            .metadata()?
            .len()
            .max(WAL_HEADER_SIZE as u64);
        let batch = Batch::new(config.batch_buffer_capacity);

        let manager = Self::Active(Arc::new(ManagerShared {
            config,
            metrics: WalMetrics::new(),
            state: Mutex::new(ManagerState {
                file,
                header,
                batch,
                append_position,
                committed_since_checkpoint: 0,
                storages: Vec::new(),
                storage_by_path: HashMap::new(),
            }),
        }));

        log::debug!("opened WAL manager at {path:?}");
        Ok(manager)
    }

    /// The `WAL_NONE` sentinel: every operation is a no-op.
    pub fn disabled() -> Self {
        Self::None
    }

    pub fn metrics(&self) -> Option<&WalMetrics> {
        match self {
            WalManager::None => None,
            WalManager::Active(shared) => Some(&shared.metrics),
        }
    }

    /// Opens (or returns the already-open) [`WalStorage`] for `path`. With
    /// `WalManager::None`, returns the raw [`PagedStore`] unwrapped.
    pub fn wrap<P: AsRef<Path>>(
        &self,
        path: P,
        store_options: PagedStoreOptions,
        cache_invalidate: Option<CacheInvalidateCallback>,
    ) -> Result<Arc<dyn Storage>> {
        match self {
            WalManager::None => Ok(Arc::new(PagedStore::open(path, store_options)?)),
            WalManager::Active(shared) => {
                let path = path.as_ref().to_path_buf();
                {
                    let state = shared.state.lock();
                    if let Some(&idx) = state.storage_by_path.get(&path) {
                        return Ok(state.storages[idx].clone() as Arc<dyn Storage>);
                    }
                }
                let store = PagedStore::open(&path, store_options)?;
                let mut state = shared.state.lock();
                if let Some(&idx) = state.storage_by_path.get(&path) {
                    return Ok(state.storages[idx].clone() as Arc<dyn Storage>);
                }
                let file_id = state.storages.len() as u32;
                let wal_storage = Arc::new(WalStorage::new(
                    file_id,
                    store,
                    shared.clone(),
                    cache_invalidate,
                ));
                state.storages.push(wal_storage.clone());
                state.storage_by_path.insert(path, file_id as usize);
                Ok(wal_storage as Arc<dyn Storage>)
            }
        }
    }

    /// Assigns and broadcasts a new transaction id. No-op (returning 0) for
    /// `WalManager::None`.
    pub fn begin(&self) -> TxId {
        match self {
            WalManager::None => 0,
            WalManager::Active(shared) => {
                let (tx_id, storages) = {
                    let mut state = shared.state.lock();
                    let tx_id = state.header.next_tx_id;
                    state.header.next_tx_id += 1;
                    (tx_id, state.storages.clone())
                };
                for storage in &storages {
                    storage.set_transaction(Some(tx_id));
                }
                tx_id
            }
        }
    }

    pub fn commit(&self, tx_id: TxId) -> Result<()> {
        match self {
            WalManager::None => Ok(()),
            WalManager::Active(shared) => shared.commit(tx_id),
        }
    }

    pub fn rollback(&self, tx_id: TxId) -> Result<()> {
        match self {
            WalManager::None => Ok(()),
            WalManager::Active(shared) => shared.rollback(tx_id),
        }
    }

    pub fn checkpoint(&self) -> Result<()> {
        match self {
            WalManager::None => Ok(()),
            WalManager::Active(shared) => shared.checkpoint(),
        }
    }

    /// Scans the WAL from `checkpoint_offset` to `committed_offset`,
    /// verifying that committed operations are reflected in their target
    /// files. Returns the number of operations counted as replayed.
    pub fn recover(&self) -> Result<u64> {
        match self {
            WalManager::None => Ok(0),
            WalManager::Active(shared) => {
                let (bytes, start, end, storages) = {
                    let state = shared.state.lock();
                    let start = state.header.checkpoint_offset as u64;
                    let end = state.header.committed_offset as u64;
                    if end <= start {
                        return Ok(0);
                    }
                    let mut buf = vec![0u8; (end - start) as usize];
                    state.file.read_at(&mut buf, start)?;
                    (buf, start, end, state.storages.clone())
                };

                let mut committed = std::collections::HashSet::new();
                let mut rolled_back = std::collections::HashSet::new();
                let mut offset = 0usize;
                while offset < bytes.len() {
                    let record = match Record::decode(&bytes[offset..]) {
                        Ok((record, consumed)) => {
                            offset += consumed;
                            record
                        }
                        Err(_) => break,
                    };
                    match record.op {
                        RecordOp::Commit => {
                            committed.insert(record.tx_id);
                        }
                        RecordOp::Rollback => {
                            rolled_back.insert(record.tx_id);
                        }
                        _ => {}
                    }
                }
                for tx_id in &rolled_back {
                    committed.remove(tx_id);
                }

                let mut replayed = 0u64;
                let mut transactions_seen = std::collections::HashSet::new();
                offset = 0;
                while offset < bytes.len() {
                    let record = match Record::decode(&bytes[offset..]) {
                        Ok((record, consumed)) => {
                            offset += consumed;
                            record
                        }
                        Err(_) => break,
                    };
                    if matches!(
                        record.op,
                        RecordOp::Write | RecordOp::Update | RecordOp::Delete
                    ) && committed.contains(&record.tx_id)
                    {
                        match storages.get(record.file_id as usize) {
                            Some(storage) => {
                                if record.op != RecordOp::Delete
                                    && storage.read(record.page_offset).is_err()
                                {
                                    log::warn!(
                                        "recovery: tx {} op on file_id {} offset {} not reflected on disk",
                                        record.tx_id,
                                        record.file_id,
                                        record.page_offset
                                    );
                                }
                            }
                            None => {
                                return Err(Error::Corrupt(format!(
                                    "WAL record references unknown file_id {}",
                                    record.file_id
                                )))
                            }
                        }
                        replayed += 1;
                        transactions_seen.insert(record.tx_id);
                    }
                }

                shared
                    .metrics
                    .record_recovery(transactions_seen.len() as u64, replayed);
                log::info!(
                    "WAL recovery scanned [{start}, {end}): {replayed} operations across {} transactions",
                    transactions_seen.len()
                );
                Ok(replayed)
            }
        }
    }

    pub fn close(&self) -> Result<()> {
        match self {
            WalManager::None => Ok(()),
            WalManager::Active(shared) => {
                let storages = shared.state.lock().storages.clone();
                for storage in &storages {
                    storage.close()?;
                }
                let mut state = shared.state.lock();
                shared.flush_locked(&mut state, true)?;
                shared.write_header(&mut state)?;
                log::debug!("closed WAL manager");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paged_store::PagedStoreOptions;

    fn open_wrapped(dir: &tempfile::TempDir) -> (WalManager, Arc<dyn Storage>) {
        let wal = WalManager::open(dir.path().join("wal.log"), WalConfig::default()).unwrap();
        let storage = wal
            .wrap(dir.path().join("t.db"), PagedStoreOptions::default(), None)
            .unwrap();
        (wal, storage)
    }

    #[test]
    fn commit_advances_committed_offset_past_header() {
        let dir = tempfile::tempdir().unwrap();
        let (wal, storage) = open_wrapped(&dir);

        let tx = wal.begin();
        storage.write(b"x").unwrap();
        wal.commit(tx).unwrap();

        let WalManager::Active(shared) = &wal else {
            panic!("expected an active manager");
        };
        let state = shared.state.lock();
        assert!(state.header.committed_offset > WAL_HEADER_SIZE as i64);
        assert_eq!(state.header.total_count, 1);
    }

    #[test]
    fn recover_reports_zero_once_committed_writes_are_reflected() {
        let dir = tempfile::tempdir().unwrap();
        let (wal, storage) = open_wrapped(&dir);

        let tx = wal.begin();
        let off = storage.write(b"payload").unwrap();
        wal.commit(tx).unwrap();

        let replayed = wal.recover().unwrap();
        assert_eq!(replayed, 0);
        assert_eq!(&storage.read(off).unwrap()[..], b"payload");
    }

    #[test]
    fn recover_errors_on_record_for_unregistered_file_id() {
        let dir = tempfile::tempdir().unwrap();
        let (wal, storage) = open_wrapped(&dir);

        let tx = wal.begin();
        storage.write(b"payload").unwrap();
        wal.commit(tx).unwrap();

        // A fresh manager over the same file hasn't `wrap`ped any storage
        // yet, so the committed write's file_id is unknown to it.
        let unregistered = WalManager::open(dir.path().join("wal.log"), WalConfig::default()).unwrap();
        assert!(matches!(unregistered.recover(), Err(Error::Corrupt(_))));
    }

    #[test]
    fn checkpoint_resets_checkpoint_offset_to_committed_offset() {
        let dir = tempfile::tempdir().unwrap();
        let (wal, storage) = open_wrapped(&dir);

        let tx = wal.begin();
        storage.write(b"x").unwrap();
        wal.commit(tx).unwrap();
        wal.checkpoint().unwrap();

        let WalManager::Active(shared) = &wal else {
            panic!("expected an active manager");
        };
        let state = shared.state.lock();
        assert_eq!(state.header.checkpoint_offset, state.header.committed_offset);
        assert_eq!(state.committed_since_checkpoint, 0);
    }
}
