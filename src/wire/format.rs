//! Protobuf wire format constants and tag helpers.

/// Wire type of a field, stored in the low 3 bits of each tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    StartGroup,
    EndGroup,
    Fixed32,
}

impl WireType {
    /// Parse the wire type bits of a tag.
    pub fn from_bits(bits: u64) -> Option<Self> {
        match bits {
            0 => Some(Self::Varint),
            1 => Some(Self::Fixed64),
            2 => Some(Self::LengthDelimited),
            3 => Some(Self::StartGroup),
            4 => Some(Self::EndGroup),
            5 => Some(Self::Fixed32),
            _ => None,
        }
    }

    /// Numeric value as stored in a tag.
    pub const fn bits(self) -> u64 {
        match self {
            Self::Varint => 0,
            Self::Fixed64 => 1,
            Self::LengthDelimited => 2,
            Self::StartGroup => 3,
            Self::EndGroup => 4,
            Self::Fixed32 => 5,
        }
    }
}

/// Number of bits used by the wire type in a tag.
pub const TAG_TYPE_BITS: u32 = 3;

/// Mask for the wire type bits.
pub const TAG_TYPE_MASK: u64 = (1 << TAG_TYPE_BITS) - 1;

/// Longest valid varint encoding (a u64 needs at most 10 bytes).
pub const MAX_VARINT_LEN: usize = 10;

/// Compose a tag from a field number and wire type.
#[inline]
pub const fn make_tag(field_number: u32, wire_type: WireType) -> u64 {
    ((field_number as u64) << TAG_TYPE_BITS) | wire_type.bits()
}

/// Split a tag into field number and raw wire type bits.
#[inline]
pub const fn split_tag(tag: u64) -> (u64, u64) {
    (tag >> TAG_TYPE_BITS, tag & TAG_TYPE_MASK)
}
