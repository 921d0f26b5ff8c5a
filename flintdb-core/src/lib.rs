//! Shared types for the FlintDB storage substrate.
//!
//! This crate has no I/O of its own. It exists so that `flintdb-storage`'s
//! paged store, transactional wrapper, and write-ahead log can all speak the
//! same `Error`/`Result` vocabulary and the same small set of configuration
//! enums, without any of them depending on the others' internals.

mod config;
mod error;
pub mod magic;

pub use config::{IoType, OpenMode, SyncMode, WalMode};
pub use error::{Error, Result};

/// File offset of a record's head block, or of a WAL append position.
///
/// Always a non-negative multiple of the relevant block size once it
/// identifies a live record; `-1` is used on the wire to mean "none".
pub type Offset = i64;

/// Monotonically increasing transaction identifier assigned by the WAL
/// manager at `begin()`.
pub type TxId = i64;
