use std::io;

/// The closed set of errors the storage substrate can return.
///
/// Every variant carries enough context to identify the failing component
/// and, where relevant, the offset involved. Propagation is the only
/// policy: callers decide whether to retry, surface to the user, or abort.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Raw filesystem failure. The caller decides whether to retry.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// `offset` does not point to a live record head.
    #[error("invalid offset: {0}")]
    InvalidOffset(i64),

    /// A file header's magic, version, or size did not match expectations.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// An allocation failed.
    #[error("out of memory")]
    OutOfMemory,

    /// An internal invariant was violated while traversing an on-disk
    /// structure (a broken block chain, an impossible flag combination).
    #[error("corrupt: {0}")]
    Corrupt(String),

    /// An operation was issued against a closed or unknown transaction.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(i64),

    /// The requested feature isn't available for this store (e.g. mmap on
    /// a Direct-I/O store).
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// A write was attempted against a store opened read-only.
    #[error("store is read-only")]
    ReadOnly,
}

pub type Result<T> = std::result::Result<T, Error>;
