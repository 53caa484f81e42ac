//! Protobuf wire format support for layer trace captures.
//!
//! Captures are protobuf messages. Instead of generated code, decoding is
//! driven by static schema tables ([`MessageSchema`]) and produces dynamic
//! [`Message`] values, so the rest of the pipeline can walk fields by name.
//!
//! ## Wire layout
//!
//! ```text
//! tag = (field_number << 3) | wire_type      (varint)
//! wire_type 0: varint
//! wire_type 1: 8 bytes little-endian
//! wire_type 2: varint length + payload       (strings, messages, packed lists)
//! wire_type 5: 4 bytes little-endian
//! ```

mod codec;
mod format;
mod message;
mod reader;
mod schema;
mod writer;

pub use codec::*;
pub use format::*;
pub use message::*;
pub use reader::*;
pub use schema::*;
pub use writer::*;
