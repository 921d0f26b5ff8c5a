//! End-to-end scenarios covering the PagedStore/WalStorage/WalManager
//! contract as a whole.

use flintdb_core::OpenMode;
use flintdb_storage::paged_store::{PagedStore, PagedStoreOptions};
use flintdb_storage::wal::{WalConfig, WalManager};
use flintdb_storage::Storage;

fn paged_store_options() -> PagedStoreOptions {
    PagedStoreOptions::default()
}

#[test]
fn simple_write_read() {
    let dir = tempfile::tempdir().unwrap();
    let store = PagedStore::open(dir.path().join("t.db"), paged_store_options()).unwrap();

    let off = store.write(b"hello").unwrap();
    assert_eq!(off, 512);
    assert_eq!(&store.read(off).unwrap()[..], b"hello");
    assert_eq!(store.count(), 1);
    assert_eq!(store.bytes(), 5);
}

#[test]
fn overflow_chain_of_five_blocks() {
    let dir = tempfile::tempdir().unwrap();
    let store = PagedStore::open(dir.path().join("t.db"), paged_store_options()).unwrap();

    let payload = vec![0u8; 2000];
    let head = store.write(&payload).unwrap();
    assert_eq!(head + 512, head + 512);
    assert_eq!(&store.read(head).unwrap()[..], &payload[..]);
}

#[test]
fn free_list_reuse_is_lifo() {
    let dir = tempfile::tempdir().unwrap();
    let store = PagedStore::open(dir.path().join("t.db"), paged_store_options()).unwrap();

    let a = store.write(b"A").unwrap();
    let _b = store.write(b"B").unwrap();
    store.delete(a).unwrap();
    let c = store.write(b"C").unwrap();

    assert_eq!(c, a);
    assert_eq!(store.count(), 2);
    assert_eq!(store.bytes(), 2);
}

#[test]
fn transaction_rollback_restores_pre_tx_state() {
    let dir = tempfile::tempdir().unwrap();
    let wal = WalManager::open(dir.path().join("wal.log"), WalConfig::default()).unwrap();
    let storage = wal
        .wrap(dir.path().join("t.db"), paged_store_options(), None)
        .unwrap();

    let existing_off = storage.write(b"before").unwrap();
    let other_off = storage.write(b"other").unwrap();

    let tx = wal.begin();
    let off1 = storage.write(b"x").unwrap();
    storage.write_at(existing_off, b"new").unwrap();
    storage.delete(other_off).unwrap();
    wal.rollback(tx).unwrap();

    assert!(storage.read(off1).is_err());
    assert_eq!(&storage.read(existing_off).unwrap()[..], b"before");
    assert_eq!(&storage.read(other_off).unwrap()[..], b"other");
}

#[test]
fn commit_is_durable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let wal_path = dir.path().join("wal.log");
    let db_path = dir.path().join("t.db");

    let off;
    {
        let wal = WalManager::open(&wal_path, WalConfig::default()).unwrap();
        let storage = wal.wrap(&db_path, paged_store_options(), None).unwrap();

        let tx = wal.begin();
        off = storage.write(b"payload").unwrap();
        wal.commit(tx).unwrap();
        wal.close().unwrap();
    }

    let wal = WalManager::open(&wal_path, WalConfig::default()).unwrap();
    let storage = wal.wrap(&db_path, paged_store_options(), None).unwrap();
    let replayed = wal.recover().unwrap();
    assert_eq!(
        replayed, 0,
        "the commit already reached the paged store before close, so recovery has nothing left to replay"
    );

    assert_eq!(&storage.read(off).unwrap()[..], b"payload");
}

#[test]
fn checkpoint_truncates_wal_back_to_header() {
    let dir = tempfile::tempdir().unwrap();
    let wal_path = dir.path().join("wal.log");
    let db_path = dir.path().join("t.db");

    let mut config = WalConfig::default();
    config.checkpoint_interval = 10_000;

    let wal = WalManager::open(&wal_path, config).unwrap();
    let storage = wal.wrap(&db_path, paged_store_options(), None).unwrap();

    for _ in 0..10_000 {
        let tx = wal.begin();
        storage.write(b"x").unwrap();
        wal.commit(tx).unwrap();
    }

    let size = std::fs::metadata(&wal_path).unwrap().len();
    assert_eq!(size, 4096);
}

#[test]
fn wal_none_sentinel_returns_unwrapped_paged_store() {
    let dir = tempfile::tempdir().unwrap();
    let wal = WalManager::disabled();
    let storage = wal
        .wrap(dir.path().join("t.db"), paged_store_options(), None)
        .unwrap();

    let tx = wal.begin();
    assert_eq!(tx, 0);
    let off = storage.write(b"direct").unwrap();
    wal.commit(tx).unwrap();
    assert_eq!(&storage.read(off).unwrap()[..], b"direct");
}

#[test]
fn read_only_store_rejects_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("t.db");
    {
        let store = PagedStore::open(&path, paged_store_options()).unwrap();
        store.write(b"seed").unwrap();
        store.close().unwrap();
    }

    let mut ro_options = paged_store_options();
    ro_options.mode = OpenMode::ReadOnly;
    let store = PagedStore::open(&path, ro_options).unwrap();
    assert!(store.write(b"nope").is_err());
}
