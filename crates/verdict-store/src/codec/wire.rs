//! Low-level wire primitives: varints, field tags, and payload framing.

use thiserror::Error;

/// Varint-encoded scalars.
pub const WIRE_VARINT: u8 = 0;
/// Eight little-endian bytes (doubles).
pub const WIRE_FIXED64: u8 = 1;
/// Length-delimited payloads: strings, bytes, nested messages.
pub const WIRE_LEN: u8 = 2;
/// Four little-endian bytes. Never written by this store, but skippable.
pub const WIRE_FIXED32: u8 = 5;

/// Errors produced while decoding wire data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("truncated input")]
    Truncated,

    #[error("varint overflow")]
    VarintOverflow,

    #[error("unsupported wire type {wire} for field {field}")]
    UnsupportedWireType { field: u32, wire: u8 },

    #[error("field {field} has wire type {actual}, expected {expected}")]
    UnexpectedWireType { field: u32, actual: u8, expected: u8 },

    #[error("invalid utf-8 in {what}")]
    InvalidUtf8 { what: &'static str },

    #[error("invalid {what} code {code}")]
    InvalidEnum { what: &'static str, code: u64 },

    #[error("malformed {0} record")]
    Malformed(&'static str),
}

pub type WireResult<T> = Result<T, WireError>;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn put_tag(buf: &mut Vec<u8>, field: u32, wire: u8) {
    put_varint(buf, (u64::from(field) << 3) | u64::from(wire));
}

pub fn put_uint_field(buf: &mut Vec<u8>, field: u32, value: u64) {
    put_tag(buf, field, WIRE_VARINT);
    put_varint(buf, value);
}

/// Signed 64-bit integers use the two's-complement varint encoding.
pub fn put_int64_field(buf: &mut Vec<u8>, field: u32, value: i64) {
    put_uint_field(buf, field, value as u64);
}

pub fn put_bool_field(buf: &mut Vec<u8>, field: u32, value: bool) {
    put_uint_field(buf, field, u64::from(value));
}

pub fn put_double_field(buf: &mut Vec<u8>, field: u32, value: f64) {
    put_tag(buf, field, WIRE_FIXED64);
    buf.extend_from_slice(&value.to_le_bytes());
}

pub fn put_bytes_field(buf: &mut Vec<u8>, field: u32, bytes: &[u8]) {
    put_tag(buf, field, WIRE_LEN);
    put_varint(buf, bytes.len() as u64);
    buf.extend_from_slice(bytes);
}

pub fn put_string_field(buf: &mut Vec<u8>, field: u32, s: &str) {
    put_bytes_field(buf, field, s.as_bytes());
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A cursor over wire-encoded bytes.
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn done(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Raw bytes between `start` and the current position. Used to preserve
    /// unknown fields verbatim, tag included.
    pub fn slice_from(&self, start: usize) -> &'a [u8] {
        &self.buf[start..self.pos]
    }

    pub fn read_varint(&mut self) -> WireResult<u64> {
        let mut value: u64 = 0;
        let mut shift = 0;
        loop {
            let byte = *self.buf.get(self.pos).ok_or(WireError::Truncated)?;
            self.pos += 1;
            if shift == 63 && byte > 1 {
                return Err(WireError::VarintOverflow);
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift >= 64 {
                return Err(WireError::VarintOverflow);
            }
        }
    }

    /// Read a field tag, returning `(field_number, wire_type)`.
    pub fn read_tag(&mut self) -> WireResult<(u32, u8)> {
        let tag = self.read_varint()?;
        let field = (tag >> 3) as u32;
        let wire = (tag & 0x7) as u8;
        Ok((field, wire))
    }

    /// Read a length-delimited payload.
    pub fn read_len(&mut self) -> WireResult<&'a [u8]> {
        let len = self.read_varint()? as usize;
        let end = self.pos.checked_add(len).ok_or(WireError::Truncated)?;
        if end > self.buf.len() {
            return Err(WireError::Truncated);
        }
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    pub fn read_string(&mut self, what: &'static str) -> WireResult<String> {
        let bytes = self.read_len()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| WireError::InvalidUtf8 { what })
    }

    pub fn read_fixed64(&mut self) -> WireResult<[u8; 8]> {
        let end = self.pos + 8;
        if end > self.buf.len() {
            return Err(WireError::Truncated);
        }
        let mut out = [0u8; 8];
        out.copy_from_slice(&self.buf[self.pos..end]);
        self.pos = end;
        Ok(out)
    }

    /// Skip over one field's payload.
    pub fn skip(&mut self, field: u32, wire: u8) -> WireResult<()> {
        match wire {
            WIRE_VARINT => {
                self.read_varint()?;
            }
            WIRE_FIXED64 => {
                self.read_fixed64()?;
            }
            WIRE_LEN => {
                self.read_len()?;
            }
            WIRE_FIXED32 => {
                let end = self.pos + 4;
                if end > self.buf.len() {
                    return Err(WireError::Truncated);
                }
                self.pos = end;
            }
            other => return Err(WireError::UnsupportedWireType { field, wire: other }),
        }
        Ok(())
    }
}

/// Reject a field read with the wrong wire type.
pub fn expect_wire(field: u32, actual: u8, expected: u8) -> WireResult<()> {
    if actual != expected {
        return Err(WireError::UnexpectedWireType {
            field,
            actual,
            expected,
        });
    }
    Ok(())
}
