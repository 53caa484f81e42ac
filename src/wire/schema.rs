//! Static message schema tables.
//!
//! The capture format is described by `static` tables rather than
//! generated code: one [`MessageSchema`] per message type, one
//! [`FieldSchema`] per field, [`EnumTable`]s for symbolic enum names.

use super::format::WireType;
use super::message::Value;

/// Symbolic names of an enum type.
#[derive(Debug)]
pub struct EnumTable {
    pub name: &'static str,
    pub values: &'static [(i32, &'static str)],
}

impl EnumTable {
    /// Name of an enum number, if declared.
    pub fn name_of(&self, value: i64) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(v, _)| i64::from(*v) == value)
            .map(|(_, name)| *name)
    }
}

/// Value type of a field.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Bool,
    Int32,
    Int64,
    Uint32,
    Uint64,
    Fixed32,
    Fixed64,
    Sfixed64,
    Float,
    Double,
    String,
    Bytes,
    Enum(&'static EnumTable),
    Message(&'static MessageSchema),
}

impl FieldKind {
    /// Wire type used for a single (unpacked) value of this kind.
    pub fn wire_type(&self) -> WireType {
        match self {
            Self::Bool | Self::Int32 | Self::Int64 | Self::Uint32 | Self::Uint64 | Self::Enum(_) => {
                WireType::Varint
            }
            Self::Fixed64 | Self::Sfixed64 | Self::Double => WireType::Fixed64,
            Self::Fixed32 | Self::Float => WireType::Fixed32,
            Self::String | Self::Bytes | Self::Message(_) => WireType::LengthDelimited,
        }
    }

    /// True for numeric kinds, which may be packed when repeated.
    pub fn is_packable(&self) -> bool {
        self.wire_type() != WireType::LengthDelimited
    }

    /// Nested message schema, if this is a message field.
    pub fn message_schema(&self) -> Option<&'static MessageSchema> {
        match self {
            Self::Message(schema) => Some(*schema),
            _ => None,
        }
    }

    /// Enum table, if this is an enum field.
    pub fn enum_table(&self) -> Option<&'static EnumTable> {
        match self {
            Self::Enum(table) => Some(*table),
            _ => None,
        }
    }
}

/// One field of a message schema.
#[derive(Debug)]
pub struct FieldSchema {
    pub number: u32,
    pub name: &'static str,
    pub kind: FieldKind,
    pub repeated: bool,
}

impl FieldSchema {
    /// Singular field.
    pub const fn new(number: u32, name: &'static str, kind: FieldKind) -> Self {
        Self { number, name, kind, repeated: false }
    }

    /// Repeated field.
    pub const fn repeated(number: u32, name: &'static str, kind: FieldKind) -> Self {
        Self { number, name, kind, repeated: true }
    }

    /// Default value of an absent field.
    ///
    /// Returns `None` for singular message fields, whose default is "unset".
    pub fn default_value(&self) -> Option<Value> {
        if self.repeated {
            return Some(Value::List(Vec::new()));
        }
        let value = match self.kind {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::Sfixed64 => Value::Int(0),
            FieldKind::Uint32 | FieldKind::Uint64 | FieldKind::Fixed32 | FieldKind::Fixed64 => {
                Value::Uint(0)
            }
            FieldKind::Float | FieldKind::Double => Value::Float(0.0),
            FieldKind::String => Value::Str(String::new()),
            FieldKind::Bytes => Value::Bytes(Vec::new()),
            FieldKind::Enum(_) => Value::Enum(0),
            FieldKind::Message(_) => return None,
        };
        Some(value)
    }
}

/// Schema of a message type.
#[derive(Debug)]
pub struct MessageSchema {
    pub name: &'static str,
    pub fields: &'static [FieldSchema],
}

impl MessageSchema {
    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&'static FieldSchema> {
        let fields: &'static [FieldSchema] = self.fields;
        fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by wire number.
    pub fn field_by_number(&self, number: u32) -> Option<&'static FieldSchema> {
        let fields: &'static [FieldSchema] = self.fields;
        fields.iter().find(|f| f.number == number)
    }

    /// Declaration index of a field (unknown names sort last).
    pub fn position(&self, name: &str) -> usize {
        self.fields
            .iter()
            .position(|f| f.name == name)
            .unwrap_or(self.fields.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static COLOR: EnumTable = EnumTable {
        name: "Color",
        values: &[(0, "RED"), (1, "GREEN")],
    };

    static NESTED: MessageSchema = MessageSchema {
        name: "Nested",
        fields: &[FieldSchema::new(1, "x", FieldKind::Float)],
    };

    static SAMPLE: MessageSchema = MessageSchema {
        name: "Sample",
        fields: &[
            FieldSchema::new(1, "id", FieldKind::Int32),
            FieldSchema::new(2, "color", FieldKind::Enum(&COLOR)),
            FieldSchema::repeated(3, "ids", FieldKind::Int32),
            FieldSchema::new(4, "nested", FieldKind::Message(&NESTED)),
        ],
    };

    #[test]
    fn test_lookup() {
        assert_eq!(SAMPLE.field("color").map(|f| f.number), Some(2));
        assert_eq!(SAMPLE.field_by_number(3).map(|f| f.name), Some("ids"));
        assert!(SAMPLE.field("missing").is_none());
        assert_eq!(SAMPLE.position("ids"), 2);
        assert_eq!(COLOR.name_of(1), Some("GREEN"));
        assert_eq!(COLOR.name_of(9), None);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(SAMPLE.fields[0].default_value(), Some(Value::Int(0)));
        assert_eq!(SAMPLE.fields[1].default_value(), Some(Value::Enum(0)));
        assert_eq!(SAMPLE.fields[2].default_value(), Some(Value::List(Vec::new())));
        assert_eq!(SAMPLE.fields[3].default_value(), None);
    }
}
