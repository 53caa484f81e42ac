//! Rewrite rules applied to property trees during materialization.
//!
//! Every operation must be idempotent: eager and lazy trees may both run
//! the shared (common) operations, and tooling may materialize a tree
//! more than once.

use crate::properties::{Formatter, PropertySource, PropertyTree, PropertyValue};
use crate::util::{Error, Result};
use crate::wire::{FieldKind, MessageSchema};

/// A rewrite rule over one node's property tree.
pub trait Operation: Send + Sync {
    /// Rewrite `tree` in place.
    fn apply(&self, tree: &mut PropertyTree) -> Result<()>;
}

/// Ordered list of operations shared by all providers of a kind.
pub type OperationList = &'static [&'static dyn Operation];

/// Apply `ops` in order.
pub fn apply_all(ops: &[&dyn Operation], tree: &mut PropertyTree) -> Result<()> {
    ops.iter().try_for_each(|op| op.apply(tree))
}

/// Fill schema defaults for fields absent from the tree.
///
/// With an allowlist only the listed fields are filled, and a listed field
/// unknown to the schema is an error. Otherwise every schema field not in
/// one of the denylists is filled. Filled nodes get the formatter implied
/// by their field kind.
pub struct AddDefaults {
    schema: &'static MessageSchema,
    allowlist: Option<&'static [&'static str]>,
    denylists: &'static [&'static [&'static str]],
}

impl AddDefaults {
    pub const fn new(
        schema: &'static MessageSchema,
        allowlist: Option<&'static [&'static str]>,
        denylists: &'static [&'static [&'static str]],
    ) -> Self {
        Self { schema, allowlist, denylists }
    }

    fn is_denied(&self, name: &str) -> bool {
        self.denylists.iter().any(|list| list.iter().any(|n| *n == name))
    }

    fn fill(&self, tree: &mut PropertyTree, name: &str) -> Result<()> {
        if tree.has_child(name) {
            return Ok(());
        }
        let field = self
            .schema
            .field(name)
            .ok_or_else(|| Error::missing_field(tree.name(), name))?;
        let mut default = match field.default_value() {
            Some(value) => PropertyTree::from_value(field.name, &value, PropertySource::Default),
            None => PropertyTree::node(field.name, PropertySource::Default),
        };
        if !field.repeated {
            default.set_formatter(kind_formatter(field.kind));
        }
        tree.add_child(default);
        Ok(())
    }
}

impl Operation for AddDefaults {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        match self.allowlist {
            Some(names) => names.iter().try_for_each(|name| self.fill(tree, name)),
            None => self
                .schema
                .fields
                .iter()
                .filter(|f| !self.is_denied(f.name))
                .try_for_each(|f| self.fill(tree, f.name)),
        }
    }
}

/// Attach formatters from field kinds, with per-name overrides.
pub struct SetFormatters {
    schema: &'static MessageSchema,
    custom: &'static [(&'static str, Formatter)],
}

impl SetFormatters {
    pub const fn new(schema: &'static MessageSchema, custom: &'static [(&'static str, Formatter)]) -> Self {
        Self { schema, custom }
    }

    fn format_children(&self, schema: &'static MessageSchema, node: &mut PropertyTree) {
        for child in node.children_mut() {
            let Some(field) = schema.field(child.name()) else {
                continue;
            };
            let formatter = self
                .custom
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, f)| *f)
                .or_else(|| kind_formatter(field.kind));
            let nested = field.kind.message_schema();

            if field.repeated {
                for item in child.children_mut() {
                    self.format_one(item, formatter, nested);
                }
            } else {
                self.format_one(child, formatter, nested);
            }
        }
    }

    fn format_one(
        &self,
        node: &mut PropertyTree,
        formatter: Option<Formatter>,
        nested: Option<&'static MessageSchema>,
    ) {
        if formatter.is_some() {
            node.set_formatter(formatter);
        }
        if let Some(schema) = nested {
            self.format_children(schema, node);
        }
    }
}

impl Operation for SetFormatters {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        self.format_children(self.schema, tree);
        Ok(())
    }
}

/// Formatter implied by a field kind.
fn kind_formatter(kind: FieldKind) -> Option<Formatter> {
    match kind {
        FieldKind::Enum(table) => Some(Formatter::Enum(table)),
        FieldKind::Message(schema) => match schema.name {
            "RectProto" | "FloatRectProto" => Some(Formatter::Rect),
            "ColorProto" => Some(Formatter::Color),
            "SizeProto" => Some(Formatter::Size),
            "PositionProto" => Some(Formatter::Position),
            "TransformProto" => Some(Formatter::Transform),
            _ => None,
        },
        _ => None,
    }
}

/// How an int-def field maps numbers to names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntDefKind {
    /// Exactly one name per value.
    Enum,
    /// Bit set; names joined with `|`.
    Flags,
}

/// Symbolic names for one integer-typed field.
#[derive(Debug)]
pub struct IntDef {
    pub field: &'static str,
    pub kind: IntDefKind,
    pub values: &'static [(u64, &'static str)],
}

impl IntDef {
    /// Symbolic rendering of `value`.
    pub fn translate(&self, value: u64) -> String {
        match self.kind {
            IntDefKind::Enum => self
                .values
                .iter()
                .find(|(v, _)| *v == value)
                .map_or_else(|| value.to_string(), |(_, name)| name.to_string()),
            IntDefKind::Flags => {
                if value == 0 {
                    return "0".to_string();
                }
                let mut names = Vec::new();
                let mut rest = value;
                for &(bit, name) in self.values {
                    if bit != 0 && value & bit == bit {
                        names.push(name.to_string());
                        rest &= !bit;
                    }
                }
                if rest != 0 {
                    names.push(format!("0x{:x}", rest));
                }
                names.join(" | ")
            }
        }
    }
}

/// Rewrite integer int-def fields, anywhere in the tree, into names.
pub struct TranslateIntDef {
    table: &'static [IntDef],
}

impl TranslateIntDef {
    pub const fn new(table: &'static [IntDef]) -> Self {
        Self { table }
    }

    fn translate(&self, node: &mut PropertyTree) {
        if let Some(def) = self.table.iter().find(|d| d.field == node.name()) {
            let raw = match node.value() {
                PropertyValue::Int(v) => u64::try_from(*v).ok(),
                PropertyValue::Uint(v) => Some(*v),
                _ => None,
            };
            if let Some(raw) = raw {
                node.set_value(def.translate(raw));
            }
        }
        for child in node.children_mut() {
            self.translate(child);
        }
    }
}

impl Operation for TranslateIntDef {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        for child in tree.children_mut() {
            self.translate(child);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{EnumTable, FieldSchema, Message, Value};

    static KIND: EnumTable = EnumTable {
        name: "Kind",
        values: &[(0, "UNSPECIFIED"), (1, "CLIENT")],
    };

    static RECT: MessageSchema = MessageSchema {
        name: "RectProto",
        fields: &[
            FieldSchema::new(1, "left", FieldKind::Int32),
            FieldSchema::new(2, "top", FieldKind::Int32),
            FieldSchema::new(3, "right", FieldKind::Int32),
            FieldSchema::new(4, "bottom", FieldKind::Int32),
        ],
    };

    static INFO: MessageSchema = MessageSchema {
        name: "Info",
        fields: &[
            FieldSchema::new(1, "flags", FieldKind::Uint32),
            FieldSchema::new(2, "cropLayerId", FieldKind::Int32),
        ],
    };

    static NODE: MessageSchema = MessageSchema {
        name: "Node",
        fields: &[
            FieldSchema::new(1, "id", FieldKind::Int32),
            FieldSchema::new(2, "kind", FieldKind::Enum(&KIND)),
            FieldSchema::new(3, "crop", FieldKind::Message(&RECT)),
            FieldSchema::repeated(4, "children", FieldKind::Int32),
            FieldSchema::new(5, "info", FieldKind::Message(&INFO)),
            FieldSchema::repeated(6, "regions", FieldKind::Message(&RECT)),
        ],
    };

    static FLAGS: &[IntDef] = &[IntDef {
        field: "flags",
        kind: IntDefKind::Flags,
        values: &[(0x1, "A"), (0x2, "B"), (0x8, "D")],
    }];

    fn seed(message: &Message) -> PropertyTree {
        PropertyTree::from_message("1 node", message, PropertySource::Proto, |_| true)
    }

    #[test]
    fn test_add_defaults_all() {
        let mut tree = seed(&Message::new().with("id", 1i32));
        let op = AddDefaults::new(&NODE, None, &[&["regions"]]);
        op.apply(&mut tree).unwrap();

        assert_eq!(tree.child_i64("id"), Some(1));
        let kind = tree.child("kind").unwrap();
        assert_eq!(kind.source(), PropertySource::Default);
        assert_eq!(kind.value().as_i64(), Some(0));
        assert!(tree.child("crop").unwrap().value().is_null());
        assert_eq!(kind.formatted_value(), "UNSPECIFIED");
        assert!(tree.child("children").unwrap().children().is_empty());
        assert!(!tree.has_child("regions"));
    }

    #[test]
    fn test_add_defaults_idempotent() {
        let op = AddDefaults::new(&NODE, None, &[]);
        let mut once = seed(&Message::new());
        op.apply(&mut once).unwrap();
        let mut twice = once.clone();
        op.apply(&mut twice).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_add_defaults_missing_field() {
        let mut tree = seed(&Message::new());
        let op = AddDefaults::new(&NODE, Some(&["id", "bogus"]), &[]);
        let err = op.apply(&mut tree).unwrap_err();
        assert_eq!(err, Error::missing_field("1 node", "bogus"));
    }

    #[test]
    fn test_set_formatters() {
        let message = Message::new()
            .with("kind", Value::Enum(1))
            .with("crop", Message::new().with("left", 1i32).with("right", 5i32))
            .with("info", Message::new().with("cropLayerId", -1i32))
            .with("regions", vec![Value::Message(Message::new().with("top", 2i32))]);
        let mut tree = seed(&message);
        let op = SetFormatters::new(&NODE, &[("cropLayerId", Formatter::LayerId)]);
        op.apply(&mut tree).unwrap();

        assert_eq!(tree.child("kind").unwrap().formatted_value(), "CLIENT");
        assert_eq!(tree.child("crop").unwrap().formatted_value(), "(1, 0) - (5, 0)");
        assert_eq!(tree.find("info.cropLayerId").unwrap().formatted_value(), "none");
        assert_eq!(tree.find("regions.0").unwrap().formatter(), Some(Formatter::Rect));
    }

    #[test]
    fn test_translate_int_def() {
        let message = Message::new().with("info", Message::new().with("flags", 0x13u32));
        let mut tree = seed(&message);
        let op = TranslateIntDef::new(FLAGS);
        op.apply(&mut tree).unwrap();
        assert_eq!(tree.find("info.flags").and_then(|n| n.value().as_str()), Some("A | B | 0x10"));

        // Already translated values are left alone
        let before = tree.clone();
        op.apply(&mut tree).unwrap();
        assert_eq!(before, tree);
    }
}
