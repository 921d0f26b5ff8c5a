//! WAL record encoding: a fixed 28-byte header, optionally followed by a
//! compressed or raw payload.

use flintdb_core::{Error, Result, TxId};
use std::io::{Read, Write};

use flate2::write::DeflateEncoder;
use flate2::read::DeflateDecoder;
use flate2::Compression;

/// Size of a WAL record's fixed header, in bytes.
pub const RECORD_HEADER_SIZE: usize = 28;

const FLAG_COMPRESSED: u8 = 1 << 0;
const FLAG_METADATA_ONLY: u8 = 1 << 1;

/// The kind of operation a WAL record describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOp {
    Write = 1,
    Update = 2,
    Delete = 3,
    Commit = 4,
    Rollback = 5,
    Checkpoint = 6,
}

impl RecordOp {
    fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            1 => RecordOp::Write,
            2 => RecordOp::Update,
            3 => RecordOp::Delete,
            4 => RecordOp::Commit,
            5 => RecordOp::Rollback,
            6 => RecordOp::Checkpoint,
            other => {
                return Err(Error::Corrupt(format!(
                    "unknown WAL record op byte {other}"
                )))
            }
        })
    }
}

/// One WAL record: the fixed header plus an optional payload.
///
/// `checksum` is part of the on-disk layout but is currently always
/// written and read as 0; FlintDB relies on the PagedStore layer and
/// filesystem for data integrity rather than per-record checksums.
#[derive(Debug, Clone)]
pub struct Record {
    pub op: RecordOp,
    pub tx_id: TxId,
    pub file_id: u32,
    pub page_offset: i64,
    pub payload: Option<Vec<u8>>,
}

impl Record {
    pub fn control(op: RecordOp, tx_id: TxId) -> Self {
        Self {
            op,
            tx_id,
            file_id: 0,
            page_offset: 0,
            payload: None,
        }
    }

    /// Encodes this record, compressing the payload with raw deflate when
    /// it is at least `compression_threshold` bytes.
    pub fn encode(&self, compression_threshold: usize) -> Vec<u8> {
        let mut flags = 0u8;
        let (original_size, body): (u32, Vec<u8>) = match &self.payload {
            None => {
                flags |= FLAG_METADATA_ONLY;
                (0, Vec::new())
            }
            Some(bytes) if bytes.len() >= compression_threshold => {
                flags |= FLAG_COMPRESSED;
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
                encoder.write_all(bytes).expect("in-memory compression cannot fail");
                let compressed = encoder.finish().expect("in-memory compression cannot fail");
                (bytes.len() as u32, compressed)
            }
            Some(bytes) => (bytes.len() as u32, bytes.clone()),
        };

        let mut buf = Vec::with_capacity(RECORD_HEADER_SIZE + 4 + body.len());
        buf.push(self.op as u8);
        buf.extend_from_slice(&self.tx_id.to_le_bytes());
        buf.extend_from_slice(&0u16.to_le_bytes()); // checksum, reserved
        buf.extend_from_slice(&self.file_id.to_le_bytes());
        buf.extend_from_slice(&self.page_offset.to_le_bytes());
        buf.push(flags);
        buf.extend_from_slice(&original_size.to_le_bytes());

        if flags & FLAG_METADATA_ONLY == 0 {
            if flags & FLAG_COMPRESSED != 0 {
                buf.extend_from_slice(&(body.len() as u32).to_le_bytes());
            }
            buf.extend_from_slice(&body);
        }
        buf
    }

    /// Decodes one record from the front of `data`, returning it and the
    /// number of bytes consumed.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::Corrupt("truncated WAL record header".to_string()));
        }
        let op = RecordOp::from_u8(data[0])?;
        let tx_id = i64::from_le_bytes(data[1..9].try_into().unwrap());
        let file_id = u32::from_le_bytes(data[11..15].try_into().unwrap());
        let page_offset = i64::from_le_bytes(data[15..23].try_into().unwrap());
        let flags = data[23];
        let original_size = u32::from_le_bytes(data[24..28].try_into().unwrap()) as usize;

        let mut consumed = RECORD_HEADER_SIZE;
        let payload = if flags & FLAG_METADATA_ONLY != 0 {
            None
        } else if flags & FLAG_COMPRESSED != 0 {
            if data.len() < consumed + 4 {
                return Err(Error::Corrupt("truncated WAL record compressed_size".to_string()));
            }
            let compressed_size =
                u32::from_le_bytes(data[consumed..consumed + 4].try_into().unwrap()) as usize;
            consumed += 4;
            if data.len() < consumed + compressed_size {
                return Err(Error::Corrupt("truncated WAL record payload".to_string()));
            }
            let compressed = &data[consumed..consumed + compressed_size];
            consumed += compressed_size;
            let mut decoder = DeflateDecoder::new(compressed);
            let mut out = Vec::with_capacity(original_size);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| Error::Corrupt(format!("failed to inflate WAL record: {e}")))?;
            Some(out)
        } else {
            if data.len() < consumed + original_size {
                return Err(Error::Corrupt("truncated WAL record payload".to_string()));
            }
            let out = data[consumed..consumed + original_size].to_vec();
            consumed += original_size;
            Some(out)
        };

        Ok((
            Record {
                op,
                tx_id,
                file_id,
                page_offset,
                payload,
            },
            consumed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_only_roundtrip() {
        let record = Record {
            op: RecordOp::Write,
            tx_id: 7,
            file_id: 2,
            page_offset: 512,
            payload: None,
        };
        let encoded = record.encode(8192);
        let (decoded, consumed) = Record::decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.tx_id, 7);
        assert_eq!(decoded.file_id, 2);
        assert_eq!(decoded.page_offset, 512);
        assert!(decoded.payload.is_none());
    }

    #[test]
    fn uncompressed_payload_roundtrip() {
        let record = Record {
            op: RecordOp::Update,
            tx_id: 1,
            file_id: 0,
            page_offset: 1024,
            payload: Some(b"small payload".to_vec()),
        };
        let encoded = record.encode(8192);
        let (decoded, _) = Record::decode(&encoded).unwrap();
        assert_eq!(decoded.payload.unwrap(), b"small payload");
    }

    #[test]
    fn compressed_payload_roundtrip() {
        let payload = vec![42u8; 20_000];
        let record = Record {
            op: RecordOp::Update,
            tx_id: 3,
            file_id: 1,
            page_offset: 2048,
            payload: Some(payload.clone()),
        };
        let encoded = record.encode(8192);
        assert!(encoded.len() < payload.len());
        let (decoded, consumed) = Record::decode(&encoded).unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(decoded.payload.unwrap(), payload);
    }

    #[test]
    fn decode_rejects_truncated_header() {
        let buf = [0u8; 10];
        assert!(Record::decode(&buf).is_err());
    }
}
