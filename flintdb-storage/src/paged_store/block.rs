//! The fixed 16-byte header that precedes every block's payload.

use flintdb_core::{Error, Result};

/// Size of a block header in bytes.
pub const BLOCK_HEADER_SIZE: usize = 16;

const FLAG_OCCUPIED: u8 = 1 << 0;
const FLAG_IS_OVERFLOW: u8 = 1 << 1;
const FLAG_HAS_OVERFLOW: u8 = 1 << 2;

/// Per-block metadata: whether the block is live, whether it's a
/// continuation of an earlier block, and where the chain goes next.
///
/// ## Binary layout (16 bytes, little-endian)
///
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     flags
/// 1       1     reserved
/// 2       2     used_bytes
/// 4       8     next_offset
/// 12      4     reserved2
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockHeader {
    pub occupied: bool,
    pub is_overflow: bool,
    pub has_overflow: bool,
    pub used_bytes: u16,
    pub next_offset: i64,
}

impl BlockHeader {
    pub fn encode(&self) -> [u8; BLOCK_HEADER_SIZE] {
        let mut buf = [0u8; BLOCK_HEADER_SIZE];
        let mut flags = 0u8;
        if self.occupied {
            flags |= FLAG_OCCUPIED;
        }
        if self.is_overflow {
            flags |= FLAG_IS_OVERFLOW;
        }
        if self.has_overflow {
            flags |= FLAG_HAS_OVERFLOW;
        }
        buf[0] = flags;
        buf[1] = 0;
        buf[2..4].copy_from_slice(&self.used_bytes.to_le_bytes());
        buf[4..12].copy_from_slice(&self.next_offset.to_le_bytes());
        buf[12..16].copy_from_slice(&0i32.to_le_bytes());
        buf
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < BLOCK_HEADER_SIZE {
            return Err(Error::Corrupt(format!(
                "block header too small: {} bytes (expected {})",
                data.len(),
                BLOCK_HEADER_SIZE
            )));
        }
        let flags = data[0];
        let used_bytes = u16::from_le_bytes([data[2], data[3]]);
        let next_offset = i64::from_le_bytes(data[4..12].try_into().unwrap());
        Ok(Self {
            occupied: flags & FLAG_OCCUPIED != 0,
            is_overflow: flags & FLAG_IS_OVERFLOW != 0,
            has_overflow: flags & FLAG_HAS_OVERFLOW != 0,
            used_bytes,
            next_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let header = BlockHeader {
            occupied: true,
            is_overflow: true,
            has_overflow: false,
            used_bytes: 42,
            next_offset: -1,
        };
        let encoded = header.encode();
        let decoded = BlockHeader::decode(&encoded).unwrap();
        assert_eq!(header, decoded);
    }

    #[test]
    fn decode_rejects_short_buffer() {
        let buf = [0u8; 4];
        assert!(BlockHeader::decode(&buf).is_err());
    }

    #[test]
    fn default_header_is_unoccupied_with_no_continuation() {
        let header = BlockHeader::default();
        assert!(!header.occupied);
        assert!(!header.is_overflow);
        assert!(!header.has_overflow);
        assert_eq!(header.next_offset, 0);
    }
}
