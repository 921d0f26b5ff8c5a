//! Write-ahead log: a metadata-only record of operations against the
//! wrapped [`PagedStore`](crate::paged_store::PagedStore) instances,
//! batched, optionally compressed, with checkpoints and crash recovery.
//!
//! Three pieces compose:
//!
//! - [`WalStorage`] — per-file transactional wrapper tracking
//!   new/overwritten/deleted pages within a transaction.
//! - [`WalManager`] — owns the WAL file, assigns transaction IDs, batches
//!   and flushes records, runs checkpoints and recovery.
//! - [`WalConfig`] — the configuration surface for a `WalManager`.
//!
//! Because every underlying write is immediate (the `PagedStore` never
//! buffers a write past its own call), the WAL's recovery pass is
//! observational rather than a replay: it verifies that committed
//! operations are reflected on disk instead of reapplying them.

mod batch;
mod config;
mod header;
mod manager;
mod metrics;
mod record;
mod storage;

pub use config::WalConfig;
pub use header::{WalHeader, WAL_HEADER_SIZE};
pub use manager::WalManager;
pub use metrics::{TimedOperation, WalMetrics};
pub use record::{Record, RecordOp, RECORD_HEADER_SIZE};
pub use storage::{CacheInvalidateCallback, WalStorage};
