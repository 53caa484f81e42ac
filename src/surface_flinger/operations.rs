//! Layer and entry operations derived from other fields of the same node.

use crate::properties::{
    AddDefaults, Formatter, Operation, OperationList, PropertySource, PropertyTree, SetFormatters,
    TranslateIntDef,
};
use crate::surface_flinger::schema::{DISPLAY, ENTRY, INT_DEFS, LAYER};
use crate::util::{Error, Result};
use crate::wire::MessageSchema;

/// Layer fields materialized eagerly: everything the tree builder and the
/// computations read.
pub const EAGER_PROPERTIES: &[&str] = &[
    "id",
    "name",
    "type",
    "parent",
    "children",
    "bounds",
    "sourceBounds",
    "screenBounds",
    "transform",
    "position",
    "requestedTransform",
    "requestedPosition",
    "bufferTransform",
    "isOpaque",
    "flags",
    "z",
    "zOrderRelativeOf",
    "isRelativeOf",
    "layerStack",
    "backgroundBlurRadius",
    "cornerRadius",
    "shadowRadius",
    "color",
    "activeBuffer",
    "hwcCompositionType",
    "visibleRegion",
    "isTrustedOverlay",
];

/// Fields never materialized as properties.
pub const DENYLIST_PROPERTIES: &[&str] = &["layers", "relatives", "hwcBlob"];

/// Entry fields materialized eagerly.
pub const ENTRY_EAGER_PROPERTIES: &[&str] = &[
    "elapsedRealtimeNanos",
    "where",
    "excludesCompositionState",
    "missedEntries",
    "displays",
    "vsyncId",
];

/// Formatters overriding the ones implied by field kinds.
pub static CUSTOM_FORMATTERS: [(&str, Formatter); 3] = [
    ("cropLayerId", Formatter::LayerId),
    ("zOrderRelativeOf", Formatter::LayerId),
    (
        "hwcCompositionType",
        Formatter::Enum(&crate::surface_flinger::schema::HWC_COMPOSITION_TYPE),
    ),
];

/// Layer flag bits with symbolic names.
pub const LAYER_FLAGS: &[(u64, &str)] = &[
    (0x01, "HIDDEN"),
    (0x02, "OPAQUE"),
    (0x40, "SKIP_SCREENSHOT"),
    (0x80, "SECURE"),
    (0x100, "ENABLE_BACKPRESSURE"),
    (0x200, "DISPLAY_DECORATION"),
    (0x400, "IGNORE_DESTINATION_FRAME"),
];

/// `flags` bit of hidden layers.
pub const FLAG_HIDDEN: u64 = 0x01;

/// Smallest width, in dp, of a large screen.
const LARGE_SCREEN_MIN_DP: f64 = 600.0;

/// Child `name` of `tree`, or `None` when absent but declared by `schema`.
fn field<'a>(schema: &MessageSchema, tree: &'a PropertyTree, name: &str) -> Result<Option<&'a PropertyTree>> {
    match tree.child(name) {
        Some(child) => Ok(Some(child)),
        None if schema.field(name).is_some() => Ok(None),
        None => Err(Error::missing_field(tree.name(), name)),
    }
}

/// Adds `compositionType`: "GPU" for client composition, "HWC" for
/// anything the hardware composer handles.
pub struct AddCompositionType;

impl Operation for AddCompositionType {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        let kind = field(&LAYER, tree, "hwcCompositionType")?.and_then(|n| n.value().as_i64());
        let composition = match kind {
            Some(1) => Some("GPU"),
            Some(2..=6) => Some("HWC"),
            _ => None,
        };
        match composition {
            Some(c) => tree.add_child(PropertyTree::new("compositionType", c, PropertySource::Calculated)),
            None => {
                tree.remove_child("compositionType");
            }
        }
        Ok(())
    }
}

/// Transform type bits (low byte) and orientation bits (second byte).
mod transform_type {
    pub const TRANSLATE: i64 = 0x1;
    pub const SCALE: i64 = 0x4;
    pub const FLIP_H: i64 = 0x100;
    pub const FLIP_V: i64 = 0x200;
    pub const ROT_90: i64 = 0x400;
    pub const ROT_180: i64 = FLIP_H | FLIP_V;
    pub const ROT_270: i64 = ROT_180 | ROT_90;
    pub const ROT_INVALID: i64 = 0x8000;
}

/// Whether the matrix is fully described by the orientation bits.
pub fn is_simple_transform(kind: i64) -> bool {
    use transform_type::*;
    kind & (ROT_INVALID | SCALE) == 0
}

/// Symbolic name of a transform type, e.g. `"ROT_90|TRANSLATE"`.
pub fn transform_type_name(kind: i64) -> String {
    use transform_type::*;
    if kind == 0 {
        return "IDENTITY".to_string();
    }
    let mut names = Vec::new();
    if kind & SCALE != 0 {
        names.push("SCALE");
    }
    if kind & TRANSLATE != 0 {
        names.push("TRANSLATE");
    }
    if kind & ROT_INVALID != 0 {
        names.push("ROT_INVALID");
    } else if kind & ROT_270 == ROT_270 {
        names.push("ROT_270");
    } else if kind & ROT_180 == ROT_180 {
        names.push("ROT_180");
    } else {
        if kind & ROT_90 != 0 {
            names.push("ROT_90");
        }
        if kind & FLIP_V != 0 {
            names.push("FLIP_V");
        }
        if kind & FLIP_H != 0 {
            names.push("FLIP_H");
        }
    }
    if names.is_empty() {
        return format!("0x{:x}", kind);
    }
    names.join("|")
}

/// `(dsdx, dtdx, dsdy, dtdy)` of a simple transform.
pub fn orientation_matrix(kind: i64) -> [f64; 4] {
    use transform_type::*;
    if kind & ROT_270 == ROT_270 {
        [0.0, -1.0, 1.0, 0.0]
    } else if kind & ROT_180 == ROT_180 {
        [-1.0, 0.0, 0.0, -1.0]
    } else if kind & ROT_90 != 0 {
        [0.0, 1.0, -1.0, 0.0]
    } else if kind & FLIP_H != 0 {
        [-1.0, 0.0, 0.0, 1.0]
    } else if kind & FLIP_V != 0 {
        [1.0, 0.0, 0.0, -1.0]
    } else {
        [1.0, 0.0, 0.0, 1.0]
    }
}

/// Fills the matrix of simple transforms (which are written without one)
/// and names every transform's type.
pub struct UpdateTransforms;

const TRANSFORM_FIELDS: &[&str] = &["transform", "requestedTransform", "bufferTransform"];

impl Operation for UpdateTransforms {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        for &name in TRANSFORM_FIELDS {
            if field(&LAYER, tree, name)?.is_none() {
                continue;
            }
            let Some(transform) = tree.child_mut(name) else {
                continue;
            };
            let kind = transform.child_i64("type").unwrap_or(0);
            if is_simple_transform(kind) {
                let matrix = orientation_matrix(kind);
                for (entry, value) in ["dsdx", "dtdx", "dsdy", "dtdy"].into_iter().zip(matrix) {
                    transform.add_child(PropertyTree::new(entry, value, PropertySource::Calculated));
                }
            }
            transform.add_child(PropertyTree::new(
                "typeName",
                transform_type_name(kind),
                PropertySource::Calculated,
            ));
            transform.set_formatter(Some(Formatter::Transform));
        }
        Ok(())
    }
}

/// Adds `verboseFlags`, e.g. `"HIDDEN|OPAQUE (0x3)"`.
pub struct AddVerboseFlags;

/// Symbolic rendering of layer flags.
pub fn verbose_flags(flags: u64) -> String {
    if flags == 0 {
        return String::new();
    }
    let names: Vec<&str> = LAYER_FLAGS
        .iter()
        .filter(|(bit, _)| flags & bit != 0)
        .map(|(_, name)| *name)
        .collect();
    if names.is_empty() {
        return format!("0x{:x}", flags);
    }
    format!("{} (0x{:x})", names.join("|"), flags)
}

impl Operation for AddVerboseFlags {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        let flags = field(&LAYER, tree, "flags")?
            .and_then(|n| n.value().as_i64())
            .and_then(|v| u64::try_from(v).ok())
            .unwrap_or(0);
        tree.add_child(PropertyTree::new(
            "verboseFlags",
            verbose_flags(flags),
            PropertySource::Calculated,
        ));
        Ok(())
    }
}

/// Records whether the entry omitted composition state.
pub struct AddExcludesCompositionState(pub bool);

impl Operation for AddExcludesCompositionState {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        tree.add_child(PropertyTree::new(
            "excludesCompositionState",
            self.0,
            PropertySource::Calculated,
        ));
        Ok(())
    }
}

/// Adds `isLargeScreen` to every display of an entry.
pub struct AddDisplayProperties;

impl Operation for AddDisplayProperties {
    fn apply(&self, tree: &mut PropertyTree) -> Result<()> {
        if field(&ENTRY, tree, "displays")?.is_none() {
            return Ok(());
        }
        let Some(displays) = tree.child_mut("displays") else {
            return Ok(());
        };
        for display in displays.children_mut() {
            let size = field(&DISPLAY, display, "size")?;
            let w = size.and_then(|s| s.child_f64("w")).unwrap_or(0.0);
            let h = size.and_then(|s| s.child_f64("h")).unwrap_or(0.0);
            let dpi_x = field(&DISPLAY, display, "dpiX")?
                .and_then(|n| n.value().as_f64())
                .unwrap_or(0.0);
            let large = dpi_x > 0.0 && w.min(h) / (dpi_x / 160.0) >= LARGE_SCREEN_MIN_DP;
            display.add_child(PropertyTree::new("isLargeScreen", large, PropertySource::Calculated));
        }
        Ok(())
    }
}

pub static SET_FORMATTERS_LAYER: SetFormatters = SetFormatters::new(&LAYER, &CUSTOM_FORMATTERS);
pub static SET_FORMATTERS_ENTRY: SetFormatters = SetFormatters::new(&ENTRY, &CUSTOM_FORMATTERS);
pub static TRANSLATE_INT_DEF: TranslateIntDef = TranslateIntDef::new(&INT_DEFS);
pub static ADD_DEFAULTS_LAYER_EAGER: AddDefaults = AddDefaults::new(&LAYER, Some(EAGER_PROPERTIES), &[]);
pub static ADD_DEFAULTS_LAYER_LAZY: AddDefaults =
    AddDefaults::new(&LAYER, None, &[EAGER_PROPERTIES, DENYLIST_PROPERTIES]);
pub static ADD_DEFAULTS_ENTRY_EAGER: AddDefaults = AddDefaults::new(&ENTRY, Some(ENTRY_EAGER_PROPERTIES), &[]);
pub static ADD_DEFAULTS_ENTRY_LAZY: AddDefaults = AddDefaults::new(&ENTRY, None, &[DENYLIST_PROPERTIES]);

pub static LAYER_COMMON_OPS: OperationList = &[&SET_FORMATTERS_LAYER, &TRANSLATE_INT_DEF];
pub static LAYER_EAGER_OPS: OperationList = &[
    &ADD_DEFAULTS_LAYER_EAGER,
    &SET_FORMATTERS_LAYER,
    &AddCompositionType,
    &UpdateTransforms,
    &AddVerboseFlags,
    &AddExcludesCompositionState(false),
];
pub static LAYER_EAGER_OPS_EXCLUDING_COMPOSITION: OperationList = &[
    &ADD_DEFAULTS_LAYER_EAGER,
    &SET_FORMATTERS_LAYER,
    &AddCompositionType,
    &UpdateTransforms,
    &AddVerboseFlags,
    &AddExcludesCompositionState(true),
];
// Formatters run again after defaults so filled fields get overrides too
pub static LAYER_LAZY_OPS: OperationList = &[&ADD_DEFAULTS_LAYER_LAZY, &SET_FORMATTERS_LAYER];

pub static ENTRY_COMMON_OPS: OperationList = &[&SET_FORMATTERS_ENTRY, &TRANSLATE_INT_DEF];
pub static ENTRY_EAGER_OPS: OperationList = &[&ADD_DEFAULTS_ENTRY_EAGER];
pub static ENTRY_LAZY_OPS: OperationList = &[&ADD_DEFAULTS_ENTRY_LAZY, &AddDisplayProperties];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::apply_all;
    use crate::wire::{Message, Value};

    fn layer(message: &Message) -> PropertyTree {
        PropertyTree::from_message("3 layer", message, PropertySource::Proto, |n| {
            EAGER_PROPERTIES.iter().any(|e| *e == n)
        })
    }

    #[test]
    fn test_composition_type() {
        let mut tree = layer(&Message::new().with("hwcCompositionType", Value::Enum(1)));
        AddCompositionType.apply(&mut tree).unwrap();
        assert_eq!(tree.child_str("compositionType"), Some("GPU"));

        let mut tree = layer(&Message::new().with("hwcCompositionType", Value::Enum(6)));
        AddCompositionType.apply(&mut tree).unwrap();
        assert_eq!(tree.child_str("compositionType"), Some("HWC"));

        let mut tree = layer(&Message::new());
        AddCompositionType.apply(&mut tree).unwrap();
        assert!(!tree.has_child("compositionType"));
    }

    #[test]
    fn test_verbose_flags() {
        assert_eq!(verbose_flags(0x3), "HIDDEN|OPAQUE (0x3)");
        assert_eq!(verbose_flags(0x80), "SECURE (0x80)");
        assert_eq!(verbose_flags(0), "");

        let mut tree = layer(&Message::new().with("flags", 0x41u32));
        AddVerboseFlags.apply(&mut tree).unwrap();
        assert_eq!(tree.child_str("verboseFlags"), Some("HIDDEN|SKIP_SCREENSHOT (0x41)"));
    }

    #[test]
    fn test_transform_names() {
        assert_eq!(transform_type_name(0), "IDENTITY");
        assert_eq!(transform_type_name(0x401), "TRANSLATE|ROT_90");
        assert_eq!(transform_type_name(0x700), "ROT_270");
        assert_eq!(transform_type_name(0x8004), "SCALE|ROT_INVALID");
        assert!(is_simple_transform(0x401));
        assert!(!is_simple_transform(0x4));
    }

    #[test]
    fn test_update_transforms() {
        let message = Message::new().with("transform", Message::new().with("type", 0x300i32));
        let mut tree = layer(&message);
        UpdateTransforms.apply(&mut tree).unwrap();
        let transform = tree.child("transform").unwrap();
        assert_eq!(transform.child_f64("dsdx"), Some(-1.0));
        assert_eq!(transform.child_f64("dtdy"), Some(-1.0));
        assert_eq!(transform.child_str("typeName"), Some("ROT_180"));

        let once = tree.clone();
        UpdateTransforms.apply(&mut tree).unwrap();
        assert_eq!(once, tree);
    }

    #[test]
    fn test_display_properties() {
        let display = |w: i32, h: i32, dpi: f64| {
            Value::Message(
                Message::new()
                    .with("size", Message::new().with("w", w).with("h", h))
                    .with("dpiX", dpi),
            )
        };
        let entry = Message::new().with("displays", vec![display(1080, 2400, 420.0), display(2560, 1600, 240.0)]);
        let mut tree = PropertyTree::from_message("root", &entry, PropertySource::Proto, |_| true);
        AddDisplayProperties.apply(&mut tree).unwrap();

        assert_eq!(tree.find("displays.0.isLargeScreen").and_then(|n| n.value().as_bool()), Some(false));
        assert_eq!(tree.find("displays.1.isLargeScreen").and_then(|n| n.value().as_bool()), Some(true));
    }

    #[test]
    fn test_eager_ops_fill_and_derive() {
        let mut tree = layer(&Message::new().with("id", 3i32).with("flags", 1u32));
        apply_all(LAYER_COMMON_OPS, &mut tree).unwrap();
        apply_all(LAYER_EAGER_OPS, &mut tree).unwrap();

        for name in EAGER_PROPERTIES {
            assert!(tree.has_child(name), "missing {}", name);
        }
        assert_eq!(tree.child("parent").map(PropertyTree::source), Some(PropertySource::Default));
        assert_eq!(tree.child_str("verboseFlags"), Some("HIDDEN (0x1)"));
        assert_eq!(tree.child_bool("excludesCompositionState"), Some(false));
        assert_eq!(tree.find("transform.typeName").and_then(|n| n.value().as_str()), Some("IDENTITY"));
        assert_eq!(tree.child("zOrderRelativeOf").unwrap().formatted_value(), "none");
    }

    #[test]
    fn test_unknown_field_is_schema_error() {
        let tree = PropertyTree::node("9 layer", PropertySource::Proto);
        let err = field(&LAYER, &tree, "noSuchField").unwrap_err();
        assert_eq!(err, Error::missing_field("9 layer", "noSuchField"));
    }
}
