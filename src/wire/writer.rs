//! Protobuf wire encoder.
//!
//! Used to synthesize captures (tests, the CLI `synth` command). Output is
//! canonical: fields in schema order, packed scalar lists.

use byteorder::{ByteOrder, LittleEndian};

use super::format::*;

/// Growable output buffer for wire primitives.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// View the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the writer and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Write a base-128 varint.
    pub fn write_varint(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    /// Write a field tag.
    pub fn write_tag(&mut self, field_number: u32, wire_type: WireType) {
        self.write_varint(make_tag(field_number, wire_type));
    }

    /// Write a little-endian fixed 32-bit value.
    pub fn write_fixed32(&mut self, value: u32) {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    /// Write a little-endian fixed 64-bit value.
    pub fn write_fixed64(&mut self, value: u64) {
        let mut bytes = [0u8; 8];
        LittleEndian::write_u64(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    /// Write a length prefix followed by the payload.
    pub fn write_length_delimited(&mut self, payload: &[u8]) {
        self.write_varint(payload.len() as u64);
        self.buf.extend_from_slice(payload);
    }
}
