//! Property trees: the materialized, formatted view of a raw record.

use std::fmt;

use crate::properties::Formatter;
use crate::wire::{Message, Value};

/// Leaf value of a property node.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PropertyValue {
    /// No scalar value (message and list nodes, unset messages).
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of integral values.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Uint(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric view of any number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Uint(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
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
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Uint(v) => write!(f, "{}", v),
            Self::Float(v) => f.write_str(&format_number(*v)),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        Self::Uint(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Render a float with at most three decimals, integral values without any.
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        return format!("{}", v as i64);
    }
    let s = format!("{:.3}", v);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}

/// Where a property value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertySource {
    /// Present in the raw record.
    Proto,
    /// Filled in from the schema default.
    Default,
    /// Derived by an operation or computation.
    Calculated,
}

/// A named property node with ordered children.
///
/// Messages become nodes with one child per field; repeated fields become
/// nodes whose children are named `0..n`.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyTree {
    name: String,
    value: PropertyValue,
    source: PropertySource,
    formatter: Option<Formatter>,
    children: Vec<PropertyTree>,
}

impl PropertyTree {
    /// Create a leaf.
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>, source: PropertySource) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            source,
            formatter: None,
            children: Vec::new(),
        }
    }

    /// Create a node without a scalar value.
    pub fn node(name: impl Into<String>, source: PropertySource) -> Self {
        Self::new(name, PropertyValue::Null, source)
    }

    /// Convert a raw field value, recursively.
    pub fn from_value(name: impl Into<String>, value: &Value, source: PropertySource) -> Self {
        let name = name.into();
        match value {
            Value::Bool(v) => Self::new(name, *v, source),
            Value::Int(v) => Self::new(name, *v, source),
            Value::Uint(v) => Self::new(name, *v, source),
            Value::Float(v) => Self::new(name, *v, source),
            Value::Str(v) => Self::new(name, v.as_str(), source),
            Value::Bytes(v) => Self::new(name, format!("<{} bytes>", v.len()), source),
            Value::Enum(v) => Self::new(name, i64::from(*v), source),
            Value::Message(m) => Self::from_message(name, m, source, |_| true),
            Value::List(items) => {
                let mut node = Self::node(name, source);
                node.children = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_value(i.to_string(), item, source))
                    .collect();
                node
            }
        }
    }

    /// Convert the fields of `message` accepted by `keep`.
    pub fn from_message(
        name: impl Into<String>,
        message: &Message,
        source: PropertySource,
        keep: impl Fn(&str) -> bool,
    ) -> Self {
        let mut node = Self::node(name, source);
        node.children = message
            .iter()
            .filter(|field| keep(field.name))
            .map(|field| Self::from_value(field.name, &field.value, source))
            .collect();
        node
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &PropertyValue {
        &self.value
    }

    #[inline]
    pub fn source(&self) -> PropertySource {
        self.source
    }

    #[inline]
    pub fn formatter(&self) -> Option<Formatter> {
        self.formatter
    }

    #[inline]
    pub fn children(&self) -> &[PropertyTree] {
        &self.children
    }

    #[inline]
    pub fn children_mut(&mut self) -> &mut [PropertyTree] {
        &mut self.children
    }

    pub fn set_value(&mut self, value: impl Into<PropertyValue>) {
        self.value = value.into();
    }

    pub fn set_source(&mut self, source: PropertySource) {
        self.source = source;
    }

    pub fn set_formatter(&mut self, formatter: Option<Formatter>) {
        self.formatter = formatter;
    }

    /// Direct child by name.
    pub fn child(&self, name: &str) -> Option<&PropertyTree> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut PropertyTree> {
        self.children.iter_mut().find(|c| c.name == name)
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.child(name).is_some()
    }

    /// Descendant by dot-separated path, e.g. `"color.a"`.
    pub fn find(&self, path: &str) -> Option<&PropertyTree> {
        path.split('.').try_fold(self, |node, part| node.child(part))
    }

    /// Add a child, replacing an existing one with the same name.
    pub fn add_child(&mut self, child: PropertyTree) {
        match self.children.iter_mut().find(|c| c.name == child.name) {
            Some(slot) => *slot = child,
            None => self.children.push(child),
        }
    }

    pub fn remove_child(&mut self, name: &str) -> Option<PropertyTree> {
        let pos = self.children.iter().position(|c| c.name == name)?;
        Some(self.children.remove(pos))
    }

    pub fn child_i64(&self, name: &str) -> Option<i64> {
        self.child(name).and_then(|c| c.value.as_i64())
    }

    pub fn child_f64(&self, name: &str) -> Option<f64> {
        self.child(name).and_then(|c| c.value.as_f64())
    }

    pub fn child_bool(&self, name: &str) -> Option<bool> {
        self.child(name).and_then(|c| c.value.as_bool())
    }

    pub fn child_str(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(|c| c.value.as_str())
    }

    /// Value rendered through the attached formatter.
    pub fn formatted_value(&self) -> String {
        self.formatter.unwrap_or_default().format(self)
    }

    /// JSON view: formatted leaves, objects for nodes with children.
    pub fn to_json(&self) -> serde_json::Value {
        if !self.children.is_empty() && self.formatter.is_none() {
            let map = self
                .children
                .iter()
                .map(|c| (c.name.clone(), c.to_json()))
                .collect();
            return serde_json::Value::Object(map);
        }
        if self.formatter.is_some() {
            return serde_json::Value::String(self.formatted_value());
        }
        match &self.value {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(v) => serde_json::Value::from(*v),
            PropertyValue::Int(v) => serde_json::Value::from(*v),
            PropertyValue::Uint(v) => serde_json::Value::from(*v),
            PropertyValue::Float(v) => serde_json::Value::from(*v),
            PropertyValue::Str(v) => serde_json::Value::from(v.as_str()),
        }
    }

    /// Total number of nodes in this tree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Self::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer() -> Message {
        Message::new()
            .with("id", 7i32)
            .with("name", "StatusBar")
            .with("color", Message::new().with("r", 1.0f32).with("a", 0.5f32))
            .with("children", vec![Value::Int(8), Value::Int(9)])
    }

    #[test]
    fn test_from_message() {
        let tree = PropertyTree::from_message("7 StatusBar", &layer(), PropertySource::Proto, |_| true);
        assert_eq!(tree.children().len(), 4);
        assert_eq!(tree.child_i64("id"), Some(7));
        assert_eq!(tree.child_str("name"), Some("StatusBar"));
        assert_eq!(tree.find("color.a").and_then(|c| c.value().as_f64()), Some(0.5));
        assert_eq!(tree.find("children.1").and_then(|c| c.value().as_i64()), Some(9));
        assert_eq!(tree.count(), 1 + 4 + 2 + 2);
    }

    #[test]
    fn test_from_message_filtered() {
        let tree = PropertyTree::from_message("layer", &layer(), PropertySource::Proto, |n| n == "id");
        assert_eq!(tree.children().len(), 1);
        assert!(!tree.has_child("name"));
    }

    #[test]
    fn test_add_child_replaces() {
        let mut tree = PropertyTree::node("root", PropertySource::Calculated);
        tree.add_child(PropertyTree::new("x", 1i64, PropertySource::Proto));
        tree.add_child(PropertyTree::new("x", 2i64, PropertySource::Default));
        assert_eq!(tree.children().len(), 1);
        assert_eq!(tree.child_i64("x"), Some(2));
        assert_eq!(tree.child("x").map(PropertyTree::source), Some(PropertySource::Default));
        assert!(tree.remove_child("x").is_some());
        assert!(tree.children().is_empty());
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(0.123456), "0.123");
        assert_eq!(PropertyValue::Float(-2.0).to_string(), "-2");
    }

    #[test]
    fn test_to_json() {
        let tree = PropertyTree::from_message("layer", &layer(), PropertySource::Proto, |_| true);
        let json = tree.to_json();
        assert_eq!(json["id"], serde_json::json!(7));
        assert_eq!(json["name"], serde_json::json!("StatusBar"));
        assert_eq!(json["color"]["a"], serde_json::json!(0.5));
    }
}
