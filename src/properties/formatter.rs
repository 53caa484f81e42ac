//! Display formatters attached to property nodes.

use crate::properties::{format_number, PropertyTree, PropertyValue};
use crate::wire::EnumTable;

/// How a property node renders its value.
#[derive(Clone, Copy, Debug, Default)]
pub enum Formatter {
    /// Plain value.
    #[default]
    Default,
    /// Symbolic enum name, falling back to the number.
    Enum(&'static EnumTable),
    /// Layer cross-reference; `-1` and `0` mean "none".
    LayerId,
    /// `(r, g, b, a)` color.
    Color,
    /// `(left, top) - (right, bottom)` rectangle.
    Rect,
    /// `w x h` size.
    Size,
    /// `x: .., y: ..` position.
    Position,
    /// 2x2 matrix of a transform.
    Transform,
}

impl PartialEq for Formatter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Enum(a), Self::Enum(b)) => std::ptr::eq(*a, *b),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Formatter {
    /// Render `node`.
    pub fn format(&self, node: &PropertyTree) -> String {
        match self {
            Self::Default => match node.value() {
                PropertyValue::Null if !node.children().is_empty() => node
                    .children()
                    .iter()
                    .map(|c| format!("{}: {}", c.name(), c.formatted_value()))
                    .collect::<Vec<_>>()
                    .join(", "),
                value => value.to_string(),
            },
            Self::Enum(table) => match node.value().as_i64() {
                Some(v) => table.name_of(v).map_or_else(|| v.to_string(), str::to_string),
                None => node.value().to_string(),
            },
            Self::LayerId => match node.value().as_i64() {
                Some(-1) | Some(0) => "none".to_string(),
                _ => node.value().to_string(),
            },
            Self::Color => {
                if node.children().is_empty() {
                    return "null".to_string();
                }
                format!(
                    "({}, {}, {}, {})",
                    num(node, "r"),
                    num(node, "g"),
                    num(node, "b"),
                    num(node, "a")
                )
            }
            Self::Rect => {
                if node.children().is_empty() {
                    return "null".to_string();
                }
                format!(
                    "({}, {}) - ({}, {})",
                    num(node, "left"),
                    num(node, "top"),
                    num(node, "right"),
                    num(node, "bottom")
                )
            }
            Self::Size => {
                if node.children().is_empty() {
                    return "null".to_string();
                }
                format!("{} x {}", num(node, "w"), num(node, "h"))
            }
            Self::Position => {
                if node.children().is_empty() {
                    return "null".to_string();
                }
                format!("x: {}, y: {}", num(node, "x"), num(node, "y"))
            }
            Self::Transform => {
                if node.children().is_empty() {
                    return "null".to_string();
                }
                let matrix = format!(
                    "dsdx: {}, dtdx: {}, dsdy: {}, dtdy: {}",
                    num(node, "dsdx"),
                    num(node, "dtdx"),
                    num(node, "dsdy"),
                    num(node, "dtdy")
                );
                match node.child_str("typeName") {
                    Some(name) => format!("{} ({})", name, matrix),
                    None => matrix,
                }
            }
        }
    }
}

fn num(node: &PropertyTree, name: &str) -> String {
    format_number(node.child_f64(name).unwrap_or(0.0))
}
