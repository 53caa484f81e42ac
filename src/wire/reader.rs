//! Bounds-checked cursor over a protobuf-encoded buffer.

use byteorder::{ByteOrder, LittleEndian};

use super::format::*;
use crate::util::{Error, Result};

/// Cursor reading wire primitives from a byte slice.
///
/// Every read is bounds-checked; errors carry the absolute offset into
/// the original capture so corrupt files can be located.
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Offset of `buf[0]` inside the whole capture.
    base: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader over the whole buffer.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0, base: 0 }
    }

    fn with_base(buf: &'a [u8], base: usize) -> Self {
        Self { buf, pos: 0, base }
    }

    /// Absolute offset of the cursor.
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// True once every byte has been consumed.
    #[inline]
    pub fn is_at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    #[inline]
    fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(Error::decode(
                self.offset(),
                format!("need {} bytes, {} remaining", len, self.remaining()),
            ));
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Read a base-128 varint.
    pub fn read_varint(&mut self) -> Result<u64> {
        let start = self.offset();
        let mut value = 0u64;
        for i in 0..MAX_VARINT_LEN {
            let Some(&byte) = self.buf.get(self.pos) else {
                return Err(Error::decode(start, "truncated varint"));
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::decode(start, "varint longer than 10 bytes"))
    }

    /// Read a little-endian fixed 32-bit value.
    pub fn read_fixed32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    /// Read a little-endian fixed 64-bit value.
    pub fn read_fixed64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Read a length-delimited payload as a sub-reader.
    pub fn read_length_delimited(&mut self) -> Result<WireReader<'a>> {
        let len_offset = self.offset();
        let len = self.read_varint()?;
        let len = usize::try_from(len)
            .map_err(|_| Error::decode(len_offset, "length does not fit in memory"))?;
        let base = self.offset();
        let bytes = self.take(len)?;
        Ok(WireReader::with_base(bytes, base))
    }

    /// Read the rest of this reader as raw bytes.
    pub fn read_remaining(&mut self) -> &'a [u8] {
        let bytes = &self.buf[self.pos..];
        self.pos = self.buf.len();
        bytes
    }

    /// Read a tag, returning `(field_number, wire_type)`.
    pub fn read_tag(&mut self) -> Result<(u32, WireType)> {
        let start = self.offset();
        let (number, type_bits) = split_tag(self.read_varint()?);
        let wire_type = WireType::from_bits(type_bits)
            .ok_or_else(|| Error::decode(start, format!("invalid wire type {}", type_bits)))?;
        if number == 0 || number > u64::from(u32::MAX >> TAG_TYPE_BITS) {
            return Err(Error::decode(start, format!("invalid field number {}", number)));
        }
        Ok((number as u32, wire_type))
    }

    /// Skip the payload of a field with the given wire type.
    pub fn skip(&mut self, wire_type: WireType) -> Result<()> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::LengthDelimited => {
                self.read_length_delimited()?;
            }
            WireType::StartGroup | WireType::EndGroup => {
                return Err(Error::decode(self.offset(), "groups are not supported"));
            }
        }
        Ok(())
    }
}
