//! FlintDB: an embedded, single-process, table-oriented storage engine.
//!
//! This crate is a thin facade over the two crates that make up the
//! durable storage substrate:
//!
//! - [`flintdb_core`] — shared `Error`/`Result` and configuration types.
//! - [`flintdb_storage`] — the [`PagedStore`](flintdb_storage::paged_store::PagedStore)
//!   block-structured record store, the
//!   [`WalStorage`](flintdb_storage::wal::WalStorage) per-file transactional
//!   wrapper, and the [`WalManager`](flintdb_storage::wal::WalManager) that
//!   coordinates them.
//!
//! The B+Tree index, row/column data model, and query layers that consume
//! this substrate live outside this crate; they see only the
//! [`Storage`](flintdb_storage::Storage) trait.

pub use flintdb_core as core;
pub use flintdb_storage as storage;

pub use flintdb_storage::Storage;
