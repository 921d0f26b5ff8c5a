//! Configuration surface for [`WalManager`](crate::wal::WalManager).
//!
//! Every numeric default is overridable via an environment variable;
//! precedence is explicit config > environment > built-in default.

use flintdb_core::{SyncMode, WalMode};
use std::env;
use std::str::FromStr;

const DEFAULT_CHECKPOINT_INTERVAL: u64 = 10_000;
const DEFAULT_BATCH_SIZE_LIMIT: usize = 10_000;
const DEFAULT_BATCH_BUFFER_CAPACITY: usize = 4 * 1024 * 1024;
const MIN_BATCH_BUFFER_CAPACITY: usize = 256 * 1024;
const DEFAULT_COMPRESSION_THRESHOLD: usize = 8 * 1024;
const DEFAULT_DIRECT_WRITE_THRESHOLD: usize = 64 * 1024;

/// Configuration for opening a [`WalManager`](crate::wal::WalManager).
#[derive(Debug, Clone)]
pub struct WalConfig {
    pub wal_mode: WalMode,
    pub checkpoint_interval: u64,
    pub batch_size_limit: usize,
    pub batch_buffer_capacity: usize,
    pub compression_threshold: usize,
    pub direct_write_threshold: usize,
    pub sync_mode: SyncMode,
    pub log_page_data: bool,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            wal_mode: WalMode::Truncate,
            checkpoint_interval: env_or(
                "FLINTDB_WAL_CHECKPOINT_INTERVAL",
                DEFAULT_CHECKPOINT_INTERVAL,
            ),
            batch_size_limit: env_or("FLINTDB_WAL_BATCH_SIZE", DEFAULT_BATCH_SIZE_LIMIT),
            batch_buffer_capacity: env_or(
                "FLINTDB_WAL_BATCH_BUFFER_CAPACITY",
                DEFAULT_BATCH_BUFFER_CAPACITY,
            )
            .max(MIN_BATCH_BUFFER_CAPACITY),
            compression_threshold: env_or(
                "FLINTDB_WAL_COMPRESSION_THRESHOLD",
                DEFAULT_COMPRESSION_THRESHOLD,
            ),
            direct_write_threshold: env_or(
                "FLINTDB_WAL_DIRECT_WRITE_THRESHOLD",
                DEFAULT_DIRECT_WRITE_THRESHOLD,
            ),
            sync_mode: SyncMode::PlatformDefault,
            log_page_data: false,
        }
    }
}

fn env_or<T: FromStr>(var: &str, default: T) -> T {
    env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
