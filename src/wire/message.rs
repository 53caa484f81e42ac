//! Dynamic message values produced by the schema-driven decoder.
//!
//! A [`Message`] only holds the fields that were present on the wire, so
//! field presence (e.g. "dump vs trace entry") is observable. Field order
//! is the schema declaration order, which keeps decoding deterministic.

/// A decoded field value.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    /// Raw enum number; the symbolic name comes from the schema's enum table.
    Enum(i32),
    Message(Message),
    List(Vec<Value>),
}

impl Value {
    /// Short type name for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::List(_) => "list",
        }
    }

    /// Integer view of any integral value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Uint(v) => i64::try_from(*v).ok(),
            Self::Enum(v) => Some(i64::from(*v)),
            _ => None,
        }
    }

    /// Unsigned view of any non-negative integral value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Uint(v) => Some(*v),
            Self::Int(v) => u64::try_from(*v).ok(),
            Self::Enum(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }
}

/// One present field of a message.
#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: &'static str,
    pub value: Value,
}

/// A decoded message: present fields in schema order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    fields: Vec<Field>,
}

impl Message {
    /// Create an empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field value, replacing an existing one.
    pub fn set(&mut self, name: &'static str, value: impl Into<Value>) {
        let value = value.into();
        for field in &mut self.fields {
            if field.name == name {
                field.value = value;
                return;
            }
        }
        self.fields.push(Field { name, value });
    }

    /// Append to a repeated field, creating the list on first use.
    pub fn push_repeated(&mut self, name: &'static str, value: Value) {
        for field in &mut self.fields {
            if field.name == name {
                match &mut field.value {
                    Value::List(items) => items.push(value),
                    other => {
                        let first = std::mem::replace(other, Value::List(Vec::new()));
                        *other = Value::List(vec![first, value]);
                    }
                }
                return;
            }
        }
        self.fields.push(Field { name, value: Value::List(vec![value]) });
    }

    /// Get a field value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.value)
    }

    /// Check if a field was present on the wire.
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// Remove a field and return its value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let pos = self.fields.iter().position(|f| f.name == name)?;
        Some(self.fields.remove(pos).value)
    }

    /// Iterate over present fields.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_i64)
    }

    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(Value::as_u64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_message(&self, name: &str) -> Option<&Message> {
        self.get(name).and_then(Value::as_message)
    }

    /// Items of a repeated field; empty when absent.
    pub fn get_list(&self, name: &str) -> &[Value] {
        self.get(name).and_then(Value::as_list).unwrap_or(&[])
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|f| f.name == name).map(|f| &mut f.value)
    }

    pub(crate) fn into_fields(self) -> Vec<Field> {
        self.fields
    }

    /// Reorder fields to follow the given declaration order.
    pub(crate) fn sort_by_declaration(&mut self, order: impl Fn(&str) -> usize) {
        self.fields.sort_by_key(|f| order(f.name));
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::Uint(u64::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Self::Message(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::List(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_set_get() {
        let mut m = Message::new().with("id", 7).with("name", "StatusBar");
        assert_eq!(m.get_i64("id"), Some(7));
        assert_eq!(m.get_str("name"), Some("StatusBar"));

        m.set("id", 8);
        assert_eq!(m.get_i64("id"), Some(8));
        assert_eq!(m.len(), 2);
        assert!(!m.contains("parent"));
    }

    #[test]
    fn test_push_repeated() {
        let mut m = Message::new();
        m.push_repeated("children", Value::Int(1));
        m.push_repeated("children", Value::Int(2));
        assert_eq!(m.get_list("children"), &[Value::Int(1), Value::Int(2)]);
        assert!(m.get_list("relatives").is_empty());
    }

    #[test]
    fn test_value_views() {
        assert_eq!(Value::Uint(5).as_i64(), Some(5));
        assert_eq!(Value::Int(-1).as_u64(), None);
        assert_eq!(Value::Enum(2).as_i64(), Some(2));
        assert_eq!(Value::Str("x".into()).as_i64(), None);
    }
}
