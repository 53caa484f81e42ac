//! Static schema of the layer trace capture format.
//!
//! Field numbers follow the compositor's `layers.proto`,
//! `layerstrace.proto` and `display.proto`. Deprecated and unused fields
//! are omitted; the decoder skips them.

use crate::properties::{IntDef, IntDefKind};
use crate::wire::{EnumTable, FieldKind, FieldSchema, MessageSchema};

/// `magicNumber` of a layer trace: `\x09LYRTRACE` read as a tagged
/// little-endian fixed64.
pub const MAGIC_NUMBER: u64 = 0x4543_4152_5452_594c;

/// Leading bytes of every layer trace capture.
pub const MAGIC_BYTES: [u8; 9] = [0x09, 0x4c, 0x59, 0x52, 0x54, 0x52, 0x41, 0x43, 0x45];

pub static HWC_COMPOSITION_TYPE: EnumTable = EnumTable {
    name: "HwcCompositionType",
    values: &[
        (0, "HWC_TYPE_UNSPECIFIED"),
        (1, "CLIENT"),
        (2, "DEVICE"),
        (3, "SOLID_COLOR"),
        (4, "CURSOR"),
        (5, "SIDEBAND"),
        (6, "DISPLAY_DECORATION"),
    ],
};

pub static RECT: MessageSchema = MessageSchema {
    name: "RectProto",
    fields: &[
        FieldSchema::new(1, "left", FieldKind::Int32),
        FieldSchema::new(2, "top", FieldKind::Int32),
        FieldSchema::new(3, "right", FieldKind::Int32),
        FieldSchema::new(4, "bottom", FieldKind::Int32),
    ],
};

pub static FLOAT_RECT: MessageSchema = MessageSchema {
    name: "FloatRectProto",
    fields: &[
        FieldSchema::new(1, "left", FieldKind::Float),
        FieldSchema::new(2, "top", FieldKind::Float),
        FieldSchema::new(3, "right", FieldKind::Float),
        FieldSchema::new(4, "bottom", FieldKind::Float),
    ],
};

pub static REGION: MessageSchema = MessageSchema {
    name: "RegionProto",
    fields: &[FieldSchema::repeated(2, "rect", FieldKind::Message(&RECT))],
};

pub static POSITION: MessageSchema = MessageSchema {
    name: "PositionProto",
    fields: &[
        FieldSchema::new(1, "x", FieldKind::Float),
        FieldSchema::new(2, "y", FieldKind::Float),
    ],
};

pub static SIZE: MessageSchema = MessageSchema {
    name: "SizeProto",
    fields: &[
        FieldSchema::new(1, "w", FieldKind::Int32),
        FieldSchema::new(2, "h", FieldKind::Int32),
    ],
};

pub static COLOR: MessageSchema = MessageSchema {
    name: "ColorProto",
    fields: &[
        FieldSchema::new(1, "r", FieldKind::Float),
        FieldSchema::new(2, "g", FieldKind::Float),
        FieldSchema::new(3, "b", FieldKind::Float),
        FieldSchema::new(4, "a", FieldKind::Float),
    ],
};

pub static TRANSFORM: MessageSchema = MessageSchema {
    name: "TransformProto",
    fields: &[
        FieldSchema::new(1, "dsdx", FieldKind::Float),
        FieldSchema::new(2, "dtdx", FieldKind::Float),
        FieldSchema::new(3, "dsdy", FieldKind::Float),
        FieldSchema::new(4, "dtdy", FieldKind::Float),
        FieldSchema::new(5, "type", FieldKind::Int32),
    ],
};

pub static ACTIVE_BUFFER: MessageSchema = MessageSchema {
    name: "ActiveBufferProto",
    fields: &[
        FieldSchema::new(1, "width", FieldKind::Uint32),
        FieldSchema::new(2, "height", FieldKind::Uint32),
        FieldSchema::new(3, "stride", FieldKind::Uint32),
        FieldSchema::new(4, "format", FieldKind::Int32),
        FieldSchema::new(5, "usage", FieldKind::Uint64),
    ],
};

pub static INPUT_WINDOW_INFO: MessageSchema = MessageSchema {
    name: "InputWindowInfoProto",
    fields: &[
        FieldSchema::new(1, "layoutParamsFlags", FieldKind::Uint32),
        FieldSchema::new(2, "layoutParamsType", FieldKind::Int32),
        FieldSchema::new(3, "frame", FieldKind::Message(&RECT)),
        FieldSchema::new(4, "touchableRegion", FieldKind::Message(&REGION)),
        FieldSchema::new(5, "surfaceInset", FieldKind::Int32),
        FieldSchema::new(6, "visible", FieldKind::Bool),
        FieldSchema::new(8, "focusable", FieldKind::Bool),
        FieldSchema::new(9, "hasWallpaper", FieldKind::Bool),
        FieldSchema::new(10, "globalScaleFactor", FieldKind::Float),
        FieldSchema::new(11, "windowXScale", FieldKind::Float),
        FieldSchema::new(12, "windowYScale", FieldKind::Float),
        FieldSchema::new(13, "cropLayerId", FieldKind::Int32),
        FieldSchema::new(14, "replaceTouchableRegionWithCrop", FieldKind::Bool),
        FieldSchema::new(15, "touchableRegionCrop", FieldKind::Message(&RECT)),
        FieldSchema::new(16, "transform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(17, "inputConfig", FieldKind::Uint32),
    ],
};

pub static LAYER: MessageSchema = MessageSchema {
    name: "LayerProto",
    fields: &[
        FieldSchema::new(1, "id", FieldKind::Int32),
        FieldSchema::new(2, "name", FieldKind::String),
        FieldSchema::repeated(3, "children", FieldKind::Int32),
        FieldSchema::repeated(4, "relatives", FieldKind::Int32),
        FieldSchema::new(5, "type", FieldKind::String),
        FieldSchema::new(6, "transparentRegion", FieldKind::Message(&REGION)),
        FieldSchema::new(7, "visibleRegion", FieldKind::Message(&REGION)),
        FieldSchema::new(8, "damageRegion", FieldKind::Message(&REGION)),
        FieldSchema::new(9, "layerStack", FieldKind::Uint32),
        FieldSchema::new(10, "z", FieldKind::Int32),
        FieldSchema::new(11, "position", FieldKind::Message(&POSITION)),
        FieldSchema::new(12, "requestedPosition", FieldKind::Message(&POSITION)),
        FieldSchema::new(13, "size", FieldKind::Message(&SIZE)),
        FieldSchema::new(14, "crop", FieldKind::Message(&RECT)),
        FieldSchema::new(16, "isOpaque", FieldKind::Bool),
        FieldSchema::new(18, "dataspace", FieldKind::String),
        FieldSchema::new(19, "pixelFormat", FieldKind::String),
        FieldSchema::new(20, "color", FieldKind::Message(&COLOR)),
        FieldSchema::new(21, "requestedColor", FieldKind::Message(&COLOR)),
        FieldSchema::new(22, "flags", FieldKind::Uint32),
        FieldSchema::new(23, "transform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(24, "requestedTransform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(25, "parent", FieldKind::Int32),
        FieldSchema::new(26, "zOrderRelativeOf", FieldKind::Int32),
        FieldSchema::new(27, "activeBuffer", FieldKind::Message(&ACTIVE_BUFFER)),
        FieldSchema::new(28, "queuedFrames", FieldKind::Int32),
        FieldSchema::new(29, "refreshPending", FieldKind::Bool),
        FieldSchema::new(30, "hwcFrame", FieldKind::Message(&RECT)),
        FieldSchema::new(31, "hwcCrop", FieldKind::Message(&FLOAT_RECT)),
        FieldSchema::new(32, "hwcTransform", FieldKind::Int32),
        FieldSchema::new(35, "hwcCompositionType", FieldKind::Enum(&HWC_COMPOSITION_TYPE)),
        FieldSchema::new(36, "isProtected", FieldKind::Bool),
        FieldSchema::new(37, "currFrame", FieldKind::Uint64),
        FieldSchema::new(39, "bufferTransform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(40, "effectiveScalingMode", FieldKind::Int32),
        FieldSchema::new(41, "cornerRadius", FieldKind::Float),
        FieldSchema::new(43, "effectiveTransform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(44, "sourceBounds", FieldKind::Message(&FLOAT_RECT)),
        FieldSchema::new(45, "bounds", FieldKind::Message(&FLOAT_RECT)),
        FieldSchema::new(46, "screenBounds", FieldKind::Message(&FLOAT_RECT)),
        FieldSchema::new(47, "inputWindowInfo", FieldKind::Message(&INPUT_WINDOW_INFO)),
        FieldSchema::new(48, "cornerRadiusCrop", FieldKind::Message(&FLOAT_RECT)),
        FieldSchema::new(49, "shadowRadius", FieldKind::Float),
        FieldSchema::new(51, "isRelativeOf", FieldKind::Bool),
        FieldSchema::new(52, "backgroundBlurRadius", FieldKind::Int32),
        FieldSchema::new(53, "ownerUid", FieldKind::Uint32),
        FieldSchema::new(55, "isTrustedOverlay", FieldKind::Bool),
        FieldSchema::new(56, "requestedCornerRadius", FieldKind::Float),
        FieldSchema::new(57, "destinationFrame", FieldKind::Message(&RECT)),
        FieldSchema::new(58, "originalId", FieldKind::Uint32),
    ],
};

pub static LAYERS: MessageSchema = MessageSchema {
    name: "LayersProto",
    fields: &[FieldSchema::repeated(1, "layers", FieldKind::Message(&LAYER))],
};

pub static DISPLAY: MessageSchema = MessageSchema {
    name: "DisplayProto",
    fields: &[
        FieldSchema::new(1, "id", FieldKind::Uint64),
        FieldSchema::new(2, "name", FieldKind::String),
        FieldSchema::new(3, "layerStack", FieldKind::Uint32),
        FieldSchema::new(4, "size", FieldKind::Message(&SIZE)),
        FieldSchema::new(5, "layerStackSpaceRect", FieldKind::Message(&RECT)),
        FieldSchema::new(6, "transform", FieldKind::Message(&TRANSFORM)),
        FieldSchema::new(7, "isVirtual", FieldKind::Bool),
        FieldSchema::new(8, "dpiX", FieldKind::Double),
        FieldSchema::new(9, "dpiY", FieldKind::Double),
    ],
};

pub static ENTRY: MessageSchema = MessageSchema {
    name: "LayersTraceProto",
    fields: &[
        FieldSchema::new(1, "elapsedRealtimeNanos", FieldKind::Sfixed64),
        FieldSchema::new(2, "where", FieldKind::String),
        FieldSchema::new(3, "layers", FieldKind::Message(&LAYERS)),
        FieldSchema::new(4, "hwcBlob", FieldKind::String),
        FieldSchema::new(5, "excludesCompositionState", FieldKind::Bool),
        FieldSchema::new(6, "missedEntries", FieldKind::Uint32),
        FieldSchema::repeated(7, "displays", FieldKind::Message(&DISPLAY)),
        FieldSchema::new(8, "vsyncId", FieldKind::Int64),
    ],
};

pub static TRACE_FILE: MessageSchema = MessageSchema {
    name: "LayersTraceFileProto",
    fields: &[
        FieldSchema::new(1, "magicNumber", FieldKind::Fixed64),
        FieldSchema::repeated(2, "entry", FieldKind::Message(&ENTRY)),
        FieldSchema::new(3, "realToElapsedTimeOffsetNanos", FieldKind::Fixed64),
    ],
};

/// Symbolic names of integer window-policy fields inside `inputWindowInfo`.
pub static INT_DEFS: [IntDef; 3] = [
    IntDef {
        field: "layoutParamsFlags",
        kind: IntDefKind::Flags,
        values: &[
            (0x1, "FLAG_ALLOW_LOCK_WHILE_SCREEN_ON"),
            (0x2, "FLAG_DIM_BEHIND"),
            (0x4, "FLAG_BLUR_BEHIND"),
            (0x8, "FLAG_NOT_FOCUSABLE"),
            (0x10, "FLAG_NOT_TOUCHABLE"),
            (0x20, "FLAG_NOT_TOUCH_MODAL"),
            (0x40, "FLAG_TOUCHABLE_WHEN_WAKING"),
            (0x80, "FLAG_KEEP_SCREEN_ON"),
            (0x100, "FLAG_LAYOUT_IN_SCREEN"),
            (0x200, "FLAG_LAYOUT_NO_LIMITS"),
            (0x400, "FLAG_FULLSCREEN"),
            (0x800, "FLAG_FORCE_NOT_FULLSCREEN"),
            (0x1000, "FLAG_DITHER"),
            (0x2000, "FLAG_SECURE"),
            (0x4000, "FLAG_SCALED"),
            (0x8000, "FLAG_IGNORE_CHEEK_PRESSES"),
            (0x10000, "FLAG_LAYOUT_INSET_DECOR"),
            (0x20000, "FLAG_ALT_FOCUSABLE_IM"),
            (0x40000, "FLAG_WATCH_OUTSIDE_TOUCH"),
            (0x80000, "FLAG_SHOW_WHEN_LOCKED"),
            (0x100000, "FLAG_SHOW_WALLPAPER"),
            (0x200000, "FLAG_TURN_SCREEN_ON"),
            (0x400000, "FLAG_DISMISS_KEYGUARD"),
            (0x800000, "FLAG_SPLIT_TOUCH"),
            (0x1000000, "FLAG_HARDWARE_ACCELERATED"),
            (0x2000000, "FLAG_LAYOUT_IN_OVERSCAN"),
            (0x4000000, "FLAG_TRANSLUCENT_STATUS"),
            (0x8000000, "FLAG_TRANSLUCENT_NAVIGATION"),
            (0x10000000, "FLAG_LOCAL_FOCUS_MODE"),
            (0x20000000, "FLAG_SLIPPERY"),
            (0x40000000, "FLAG_LAYOUT_ATTACHED_IN_DECOR"),
            (0x80000000, "FLAG_DRAWS_SYSTEM_BAR_BACKGROUNDS"),
        ],
    },
    IntDef {
        field: "layoutParamsType",
        kind: IntDefKind::Enum,
        values: &[
            (1, "TYPE_BASE_APPLICATION"),
            (2, "TYPE_APPLICATION"),
            (3, "TYPE_APPLICATION_STARTING"),
            (4, "TYPE_DRAWN_APPLICATION"),
            (1000, "TYPE_APPLICATION_PANEL"),
            (1001, "TYPE_APPLICATION_MEDIA"),
            (1002, "TYPE_APPLICATION_SUB_PANEL"),
            (1003, "TYPE_APPLICATION_ATTACHED_DIALOG"),
            (2000, "TYPE_STATUS_BAR"),
            (2001, "TYPE_SEARCH_BAR"),
            (2002, "TYPE_PHONE"),
            (2003, "TYPE_SYSTEM_ALERT"),
            (2005, "TYPE_TOAST"),
            (2006, "TYPE_SYSTEM_OVERLAY"),
            (2008, "TYPE_SYSTEM_DIALOG"),
            (2009, "TYPE_KEYGUARD_DIALOG"),
            (2011, "TYPE_INPUT_METHOD"),
            (2012, "TYPE_INPUT_METHOD_DIALOG"),
            (2013, "TYPE_WALLPAPER"),
            (2014, "TYPE_STATUS_BAR_PANEL"),
            (2019, "TYPE_NAVIGATION_BAR"),
            (2020, "TYPE_VOLUME_OVERLAY"),
            (2021, "TYPE_BOOT_PROGRESS"),
            (2023, "TYPE_DREAM"),
            (2024, "TYPE_NAVIGATION_BAR_PANEL"),
            (2026, "TYPE_DISPLAY_OVERLAY"),
            (2027, "TYPE_MAGNIFICATION_OVERLAY"),
            (2032, "TYPE_ACCESSIBILITY_OVERLAY"),
            (2038, "TYPE_APPLICATION_OVERLAY"),
            (2040, "TYPE_NOTIFICATION_SHADE"),
        ],
    },
    IntDef {
        field: "inputConfig",
        kind: IntDefKind::Flags,
        values: &[
            (0x1, "NO_INPUT_CHANNEL"),
            (0x2, "NOT_VISIBLE"),
            (0x4, "NOT_FOCUSABLE"),
            (0x8, "NOT_TOUCHABLE"),
            (0x10, "PREVENT_SPLITTING"),
            (0x20, "DUPLICATE_TOUCH_TO_WALLPAPER"),
            (0x40, "IS_WALLPAPER"),
            (0x80, "PAUSE_DISPATCHING"),
            (0x100, "TRUSTED_OVERLAY"),
            (0x200, "WATCH_OUTSIDE_TOUCH"),
            (0x400, "SLIPPERY"),
            (0x800, "DISABLE_USER_ACTIVITY"),
            (0x1000, "DROP_INPUT"),
            (0x2000, "DROP_INPUT_IF_OBSCURED"),
            (0x4000, "SPY"),
            (0x8000, "INTERCEPTS_STYLUS"),
        ],
    },
];
