/// Whether a paged store was opened for reading only or for reading and
/// writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// How a paged store talks to the filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoType {
    /// Reads and writes go through the OS page cache.
    Buffered,
    /// Reads and writes bypass the page cache; buffers must be aligned to
    /// the device's logical sector size.
    Direct,
}

/// Durability level for a flush.
///
/// `PlatformDefault` resolves to `Normal` on platforms where a data-only
/// sync is sufficient for durability and to `Full` where it isn't.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Never fsync. For benchmarking only; loses durability.
    Off,
    /// Data-only sync (e.g. `fdatasync`).
    Normal,
    /// Full sync including metadata (`fsync`/`F_FULLFSYNC`).
    Full,
    /// `Normal` on Linux-like platforms, `Full` where that's required for
    /// true durability.
    PlatformDefault,
}

impl SyncMode {
    /// Resolves `PlatformDefault` to a concrete mode for the current
    /// target. Other variants are returned unchanged.
    pub fn resolved(self) -> Self {
        match self {
            SyncMode::PlatformDefault => {
                if cfg!(target_os = "macos") {
                    SyncMode::Full
                } else {
                    SyncMode::Normal
                }
            }
            other => other,
        }
    }
}

/// Whether a WAL file is truncated back to its header after a checkpoint
/// catches up to the tail, or left to grow until an operator-initiated
/// checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalMode {
    Truncate,
    Log,
}
