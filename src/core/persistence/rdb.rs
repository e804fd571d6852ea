// src/core/persistence/rdb.rs

//! The read-only RDB snapshot loader. It produces the keyspace's initial
//! contents at startup; the server never writes snapshots.
//!
//! Layout: `REDIS` magic + 4-byte ASCII version, zero or more `0xFA`
//! metadata pairs, then database sections (`0xFE` + length-encoded index,
//! optional `0xFB` size hints, entries with optional `0xFC`/`0xFD` expiry
//! and a type byte — only `0x00`, string, is supported), terminated by
//! `0xFF` plus an 8-byte checksum that is consumed but not verified.

use crate::config::Config;
use crate::core::CitrineError;
use crate::core::storage::data_types::{DataValue, StoredValue};
use bytes::Bytes;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const OPCODE_METADATA: u8 = 0xFA;
const OPCODE_RESIZEDB: u8 = 0xFB;
const OPCODE_EXPIRE_MS: u8 = 0xFC;
const OPCODE_EXPIRE_SECS: u8 = 0xFD;
const OPCODE_SELECTDB: u8 = 0xFE;
const OPCODE_EOF: u8 = 0xFF;

const TYPE_STRING: u8 = 0x00;

/// Loads the keyspace contents for the configured snapshot file. A missing
/// file is a fresh start, not an error.
pub fn load_keyspace_contents(
    config: &Config,
) -> Result<HashMap<Bytes, StoredValue>, CitrineError> {
    let path = config.rdb_path();
    if !path.exists() {
        info!("No RDB file at {}; starting with an empty keyspace", path.display());
        return Ok(HashMap::new());
    }
    let contents = load_file(&path)?;
    info!(
        "Loaded {} keys from RDB file {}",
        contents.len(),
        path.display()
    );
    Ok(contents)
}

/// Parses a snapshot file into keyspace contents.
pub fn load_file(path: &Path) -> Result<HashMap<Bytes, StoredValue>, CitrineError> {
    let data = std::fs::read(path)?;
    parse(&data)
}

/// Parses snapshot bytes into keyspace contents.
pub fn parse(data: &[u8]) -> Result<HashMap<Bytes, StoredValue>, CitrineError> {
    let mut reader = RdbReader { data, pos: 0 };
    let mut contents = HashMap::new();

    let magic = reader.read_bytes(5)?;
    if magic != b"REDIS" {
        return Err(CitrineError::RdbError("missing 'REDIS' magic".to_string()));
    }
    let version = reader.read_bytes(4)?;
    debug!("RDB version {}", String::from_utf8_lossy(version));

    loop {
        let Some(opcode) = reader.next_byte() else {
            // Truncated files without an EOF marker still load what they had.
            break;
        };
        match opcode {
            OPCODE_METADATA => {
                let name = reader.read_string()?;
                let value = reader.read_string()?;
                debug!(
                    "RDB metadata {} = {}",
                    String::from_utf8_lossy(&name),
                    String::from_utf8_lossy(&value)
                );
            }
            OPCODE_SELECTDB => {
                let db_index = reader.read_length()?;
                debug!("RDB database section {db_index}");
                if reader.peek_byte() == Some(OPCODE_RESIZEDB) {
                    reader.next_byte();
                    let keyspace_size = reader.read_length()?;
                    let expires_size = reader.read_length()?;
                    debug!("RDB size hint: {keyspace_size} keys, {expires_size} expiries");
                }
            }
            OPCODE_EOF => {
                reader.read_bytes(8)?;
                break;
            }
            opcode => {
                let (expiry, type_byte) = match opcode {
                    OPCODE_EXPIRE_MS => (Some(reader.read_u64_le()?), reader.require_byte()?),
                    OPCODE_EXPIRE_SECS => (
                        Some(u64::from(reader.read_u32_le()?) * 1000),
                        reader.require_byte()?,
                    ),
                    other => (None, other),
                };
                if type_byte != TYPE_STRING {
                    return Err(CitrineError::RdbError(format!(
                        "unsupported value type 0x{type_byte:02X}"
                    )));
                }
                let key = reader.read_string()?;
                let value = reader.read_string()?;
                contents.insert(key, StoredValue::with_expiry(DataValue::String(value), expiry));
            }
        }
    }

    Ok(contents)
}

/// A byte cursor over the snapshot contents.
struct RdbReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> RdbReader<'a> {
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.data.get(self.pos).copied();
        if byte.is_some() {
            self.pos += 1;
        }
        byte
    }

    fn require_byte(&mut self) -> Result<u8, CitrineError> {
        self.next_byte()
            .ok_or_else(|| CitrineError::RdbError("unexpected end of file".to_string()))
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], CitrineError> {
        if self.pos + n > self.data.len() {
            return Err(CitrineError::RdbError("unexpected end of file".to_string()));
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn read_u32_le(&mut self) -> Result<u32, CitrineError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_u64_le(&mut self) -> Result<u64, CitrineError> {
        let bytes = self.read_bytes(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(buf))
    }

    /// Length encoding: the two high bits of the first byte select 6-bit,
    /// 14-bit, 32-bit big-endian, or (`0b11`) a special string encoding,
    /// which is returned as-is for `read_string` to interpret.
    fn read_length(&mut self) -> Result<usize, CitrineError> {
        let first = self.require_byte()?;
        match first >> 6 {
            0b00 => Ok((first & 0x3F) as usize),
            0b01 => {
                let second = self.require_byte()?;
                Ok((((first & 0x3F) as usize) << 8) | second as usize)
            }
            0b10 => {
                let bytes = self.read_bytes(4)?;
                Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize)
            }
            _ => Ok(first as usize),
        }
    }

    /// A size-encoded string, or one of the special integer encodings
    /// (loaded as its decimal string form). LZF compression is rejected.
    fn read_string(&mut self) -> Result<Bytes, CitrineError> {
        let length_or_encoding = self.read_length()?;
        if length_or_encoding >> 6 == 0b11 {
            return match length_or_encoding & 0x3F {
                0x00 => {
                    let value = self.require_byte()?;
                    Ok(Bytes::from(value.to_string()))
                }
                0x01 => {
                    let bytes = self.read_bytes(2)?;
                    let value = u16::from_le_bytes([bytes[0], bytes[1]]);
                    Ok(Bytes::from(value.to_string()))
                }
                0x02 => {
                    let value = self.read_u32_le()?;
                    Ok(Bytes::from(value.to_string()))
                }
                0x03 => Err(CitrineError::RdbError(
                    "LZF-compressed strings are not supported".to_string(),
                )),
                other => Err(CitrineError::RdbError(format!(
                    "unknown string encoding 0x{other:02X}"
                ))),
            };
        }
        let bytes = self.read_bytes(length_or_encoding)?;
        Ok(Bytes::copy_from_slice(bytes))
    }
}
