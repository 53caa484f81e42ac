//! Schema-driven message decoding and encoding.

use super::format::WireType;
use super::message::{Field, Message, Value};
use super::reader::WireReader;
use super::schema::{FieldKind, FieldSchema, MessageSchema};
use super::writer::WireWriter;
use crate::util::{Error, Result};

/// Decode a complete buffer as one message of `schema`.
pub fn decode(schema: &'static MessageSchema, buf: &[u8]) -> Result<Message> {
    let mut reader = WireReader::new(buf);
    decode_message(schema, &mut reader)
}

/// Decode fields until the reader is exhausted.
///
/// Unknown field numbers are skipped. Repeated numeric fields are accepted
/// both packed and unpacked. A singular field seen twice keeps the last
/// scalar, while a nested message merges into the earlier one.
pub fn decode_message(schema: &'static MessageSchema, reader: &mut WireReader<'_>) -> Result<Message> {
    let mut message = Message::new();

    while !reader.is_at_end() {
        let tag_offset = reader.offset();
        let (number, wire_type) = reader.read_tag()?;
        let Some(field) = schema.field_by_number(number) else {
            reader.skip(wire_type)?;
            continue;
        };

        let expected = field.kind.wire_type();
        if field.repeated && field.kind.is_packable() && wire_type == WireType::LengthDelimited {
            let mut packed = reader.read_length_delimited()?;
            if !message.contains(field.name) {
                message.set(field.name, Value::List(Vec::new()));
            }
            while !packed.is_at_end() {
                let value = decode_value(field, &mut packed)?;
                message.push_repeated(field.name, value);
            }
            continue;
        }

        if wire_type != expected {
            return Err(Error::decode(
                tag_offset,
                format!(
                    "{}.{}: expected wire type {:?}, found {:?}",
                    schema.name, field.name, expected, wire_type
                ),
            ));
        }

        let value = decode_value(field, reader)?;
        if field.repeated {
            message.push_repeated(field.name, value);
        } else if let Some(current) = message.get_mut(field.name) {
            merge_value(field, current, value);
        } else {
            message.set(field.name, value);
        }
    }

    message.sort_by_declaration(|name| schema.position(name));
    Ok(message)
}

/// Merge `update` into `existing` field by field: repeated fields append,
/// singular messages merge recursively, other values replace.
fn merge_message(schema: &'static MessageSchema, existing: &mut Message, update: Message) {
    for Field { name, value } in update.into_fields() {
        let Some(field) = schema.field(name) else {
            existing.set(name, value);
            continue;
        };
        if let Some(current) = existing.get_mut(name) {
            merge_value(field, current, value);
        } else {
            existing.set(name, value);
        }
    }
    existing.sort_by_declaration(|name| schema.position(name));
}

fn merge_value(field: &'static FieldSchema, current: &mut Value, value: Value) {
    match (current, value, field.kind.message_schema()) {
        (Value::List(items), Value::List(more), _) => items.extend(more),
        (Value::Message(current), Value::Message(update), Some(nested)) if !field.repeated => {
            merge_message(nested, current, update)
        }
        (current, value, _) => *current = value,
    }
}

fn decode_value(field: &'static FieldSchema, reader: &mut WireReader<'_>) -> Result<Value> {
    let value = match field.kind {
        FieldKind::Bool => Value::Bool(reader.read_varint()? != 0),
        FieldKind::Int32 => Value::Int(i64::from(reader.read_varint()? as i32)),
        FieldKind::Int64 => Value::Int(reader.read_varint()? as i64),
        FieldKind::Uint32 => Value::Uint(u64::from(reader.read_varint()? as u32)),
        FieldKind::Uint64 => Value::Uint(reader.read_varint()?),
        FieldKind::Enum(_) => Value::Enum(reader.read_varint()? as i32),
        FieldKind::Fixed32 => Value::Uint(u64::from(reader.read_fixed32()?)),
        FieldKind::Fixed64 => Value::Uint(reader.read_fixed64()?),
        FieldKind::Sfixed64 => Value::Int(reader.read_fixed64()? as i64),
        FieldKind::Float => Value::Float(f64::from(f32::from_bits(reader.read_fixed32()?))),
        FieldKind::Double => Value::Float(f64::from_bits(reader.read_fixed64()?)),
        FieldKind::String => {
            let mut sub = reader.read_length_delimited()?;
            let offset = sub.offset();
            let bytes = sub.read_remaining();
            let text = std::str::from_utf8(bytes).map_err(|e| {
                Error::decode(offset, format!("{}: invalid UTF-8: {}", field.name, e))
            })?;
            Value::Str(text.to_string())
        }
        FieldKind::Bytes => Value::Bytes(reader.read_length_delimited()?.read_remaining().to_vec()),
        FieldKind::Message(nested) => {
            let mut sub = reader.read_length_delimited()?;
            Value::Message(decode_message(nested, &mut sub)?)
        }
    };
    Ok(value)
}

/// Encode a message of `schema` into a new buffer.
pub fn encode(schema: &'static MessageSchema, message: &Message) -> Result<Vec<u8>> {
    let mut writer = WireWriter::new();
    encode_message(schema, message, &mut writer)?;
    Ok(writer.into_bytes())
}

/// Encode present fields in schema order.
pub fn encode_message(
    schema: &'static MessageSchema,
    message: &Message,
    writer: &mut WireWriter,
) -> Result<()> {
    if let Some(unknown) = message.iter().find(|f| schema.field(f.name).is_none()) {
        return Err(Error::other(format!(
            "{} has no field named '{}'",
            schema.name, unknown.name
        )));
    }

    for field in schema.fields {
        let Some(value) = message.get(field.name) else {
            continue;
        };

        if !field.repeated {
            writer.write_tag(field.number, field.kind.wire_type());
            encode_value(field, value, writer)?;
            continue;
        }

        let items = value.as_list().ok_or_else(|| mismatch(field, "list", value))?;
        if items.is_empty() {
            continue;
        }
        if field.kind.is_packable() {
            let mut packed = WireWriter::new();
            for item in items {
                encode_value(field, item, &mut packed)?;
            }
            writer.write_tag(field.number, WireType::LengthDelimited);
            writer.write_length_delimited(packed.as_bytes());
        } else {
            for item in items {
                writer.write_tag(field.number, field.kind.wire_type());
                encode_value(field, item, writer)?;
            }
        }
    }
    Ok(())
}

fn encode_value(field: &'static FieldSchema, value: &Value, writer: &mut WireWriter) -> Result<()> {
    match field.kind {
        FieldKind::Bool => {
            let v = value.as_bool().ok_or_else(|| mismatch(field, "bool", value))?;
            writer.write_varint(u64::from(v));
        }
        FieldKind::Int32 | FieldKind::Int64 | FieldKind::Enum(_) => {
            let v = value.as_i64().ok_or_else(|| mismatch(field, "int", value))?;
            writer.write_varint(v as u64);
        }
        FieldKind::Uint32 | FieldKind::Uint64 => {
            let v = value.as_u64().ok_or_else(|| mismatch(field, "uint", value))?;
            writer.write_varint(v);
        }
        FieldKind::Fixed32 => {
            let v = value.as_u64().ok_or_else(|| mismatch(field, "uint", value))?;
            writer.write_fixed32(v as u32);
        }
        FieldKind::Fixed64 => {
            let v = value.as_u64().ok_or_else(|| mismatch(field, "uint", value))?;
            writer.write_fixed64(v);
        }
        FieldKind::Sfixed64 => {
            let v = value.as_i64().ok_or_else(|| mismatch(field, "int", value))?;
            writer.write_fixed64(v as u64);
        }
        FieldKind::Float => {
            let v = value.as_f64().ok_or_else(|| mismatch(field, "float", value))?;
            writer.write_fixed32((v as f32).to_bits());
        }
        FieldKind::Double => {
            let v = value.as_f64().ok_or_else(|| mismatch(field, "float", value))?;
            writer.write_fixed64(v.to_bits());
        }
        FieldKind::String => {
            let v = value.as_str().ok_or_else(|| mismatch(field, "string", value))?;
            writer.write_length_delimited(v.as_bytes());
        }
        FieldKind::Bytes => match value {
            Value::Bytes(bytes) => writer.write_length_delimited(bytes),
            other => return Err(mismatch(field, "bytes", other)),
        },
        FieldKind::Message(nested) => {
            let m = value.as_message().ok_or_else(|| mismatch(field, "message", value))?;
            let mut sub = WireWriter::new();
            encode_message(nested, m, &mut sub)?;
            writer.write_length_delimited(sub.as_bytes());
        }
    }
    Ok(())
}

fn mismatch(field: &FieldSchema, expected: &str, actual: &Value) -> Error {
    Error::TypeMismatch {
        expected: format!("{} for field '{}'", expected, field.name),
        actual: actual.type_name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{EnumTable, WireWriter};

    static KIND: EnumTable = EnumTable {
        name: "Kind",
        values: &[(0, "NONE"), (1, "SOLID")],
    };

    static POINT: MessageSchema = MessageSchema {
        name: "Point",
        fields: &[
            FieldSchema::new(1, "x", FieldKind::Float),
            FieldSchema::new(2, "y", FieldKind::Float),
        ],
    };

    static NODE: MessageSchema = MessageSchema {
        name: "Node",
        fields: &[
            FieldSchema::new(1, "id", FieldKind::Int32),
            FieldSchema::new(2, "name", FieldKind::String),
            FieldSchema::repeated(3, "children", FieldKind::Int32),
            FieldSchema::new(4, "kind", FieldKind::Enum(&KIND)),
            FieldSchema::new(5, "origin", FieldKind::Message(&POINT)),
            FieldSchema::new(6, "stamp", FieldKind::Sfixed64),
            FieldSchema::repeated(7, "points", FieldKind::Message(&POINT)),
        ],
    };

    fn sample() -> Message {
        Message::new()
            .with("id", -3)
            .with("name", "Task=12")
            .with("children", vec![Value::Int(4), Value::Int(5)])
            .with("kind", Value::Enum(1))
            .with("origin", Message::new().with("x", 1.5f32).with("y", 2.0f32))
            .with("stamp", 850_746_266_486i64)
            .with("points", vec![Value::Message(Message::new().with("x", 3.0f32))])
    }

    #[test]
    fn test_encode_decode_message() {
        let bytes = encode(&NODE, &sample()).unwrap();
        let decoded = decode(&NODE, &bytes).unwrap();
        assert_eq!(decoded, sample());
        assert_eq!(decoded.get_i64("id"), Some(-3));
    }

    #[test]
    fn test_unpacked_repeated_accepted() {
        let mut w = WireWriter::new();
        w.write_tag(3, WireType::Varint);
        w.write_varint(9);
        w.write_tag(3, WireType::Varint);
        w.write_varint(10);
        let decoded = decode(&NODE, w.as_bytes()).unwrap();
        assert_eq!(decoded.get_list("children"), &[Value::Int(9), Value::Int(10)]);
    }

    #[test]
    fn test_unknown_fields_skipped() {
        let mut w = WireWriter::new();
        w.write_tag(99, WireType::LengthDelimited);
        w.write_length_delimited(b"future");
        w.write_tag(1, WireType::Varint);
        w.write_varint(42);
        let decoded = decode(&NODE, w.as_bytes()).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get_i64("id"), Some(42));
    }

    #[test]
    fn test_wire_type_mismatch() {
        let mut w = WireWriter::new();
        w.write_tag(2, WireType::Varint);
        w.write_varint(1);
        let err = decode(&NODE, w.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Decode { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_buffer() {
        let bytes = encode(&NODE, &sample()).unwrap();
        let err = decode(&NODE, &bytes[..bytes.len() - 3]).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
    }

    #[test]
    fn test_invalid_utf8() {
        let mut w = WireWriter::new();
        w.write_tag(2, WireType::LengthDelimited);
        w.write_length_delimited(&[0xff, 0xfe]);
        assert!(matches!(decode(&NODE, w.as_bytes()), Err(Error::Decode { offset: 2, .. })));
    }

    #[test]
    fn test_repeated_singular_fields_merge() {
        let mut w = WireWriter::new();
        let first = encode(&POINT, &Message::new().with("x", 1.0f32).with("y", 2.0f32)).unwrap();
        let second = encode(&POINT, &Message::new().with("x", 5.0f32)).unwrap();
        for (id, origin) in [(1, &first), (2, &second)] {
            w.write_tag(1, WireType::Varint);
            w.write_varint(id);
            w.write_tag(5, WireType::LengthDelimited);
            w.write_length_delimited(origin);
        }
        let decoded = decode(&NODE, w.as_bytes()).unwrap();
        assert_eq!(decoded.get_i64("id"), Some(2));
        let origin = decoded.get_message("origin").unwrap();
        assert_eq!(origin.get_f64("x"), Some(5.0));
        assert_eq!(origin.get_f64("y"), Some(2.0));
    }

    #[test]
    fn test_encode_rejects_unknown_field() {
        let m = Message::new().with("bogus", 1);
        assert!(encode(&NODE, &m).is_err());
    }
}
