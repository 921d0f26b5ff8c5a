use criterion::{black_box, criterion_group, criterion_main, Criterion};

use flintdb_storage::paged_store::PagedStoreOptions;
use flintdb_storage::wal::{WalConfig, WalManager};
use flintdb_storage::Storage;

fn bench_commit(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WalConfig::default();
    config.checkpoint_interval = u64::MAX;
    let wal = WalManager::open(dir.path().join("bench.wal"), config).unwrap();
    let storage = wal
        .wrap(dir.path().join("bench.db"), PagedStoreOptions::default(), None)
        .unwrap();

    c.bench_function("wal_commit_single_write", |b| {
        b.iter(|| {
            let tx = wal.begin();
            let off = storage.write(b"benchmark-payload").unwrap();
            wal.commit(tx).unwrap();
            black_box(off);
        });
    });
}

fn bench_rollback(c: &mut Criterion) {
    let dir = tempfile::tempdir().unwrap();
    let mut config = WalConfig::default();
    config.checkpoint_interval = u64::MAX;
    let wal = WalManager::open(dir.path().join("bench.wal"), config).unwrap();
    let storage = wal
        .wrap(dir.path().join("bench.db"), PagedStoreOptions::default(), None)
        .unwrap();

    c.bench_function("wal_rollback_single_write", |b| {
        b.iter(|| {
            let tx = wal.begin();
            storage.write(b"benchmark-payload").unwrap();
            wal.rollback(tx).unwrap();
        });
    });
}

criterion_group!(benches, bench_commit, bench_rollback);
criterion_main!(benches);
