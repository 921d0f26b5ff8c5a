//! Magic numbers identifying FlintDB's on-disk file formats.
//!
//! Unlike a content hash, a magic number's only job is to fail fast when a
//! file is opened as the wrong format. Both formats below use a 4-byte
//! ASCII tag rather than an 8-byte one, because the tag sits directly at
//! the front of a fixed-layout header (see `paged_store::header` and
//! `wal::header`).

/// Paged store file header magic: `"FLNT"`.
pub const PAGED_STORE_MAGIC: &[u8; 4] = b"FLNT";

/// WAL file header magic: `"WAL!"`.
pub const WAL_MAGIC: &[u8; 4] = b"WAL!";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn magics_are_distinct() {
        assert_ne!(PAGED_STORE_MAGIC, WAL_MAGIC);
    }
}
