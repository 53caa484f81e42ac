//! Synthesized captures, for tooling and tests.
//!
//! ```ignore
//! let bytes = CaptureBuilder::new()
//!     .real_to_elapsed_offset(1_000)
//!     .entry(100, 1, vec![LayerBuilder::new(1, "Root").build()])
//!     .build()?;
//! ```

use crate::surface_flinger::schema::{MAGIC_NUMBER, TRACE_FILE};
use crate::util::{Rect, Result};
use crate::wire::{self, Message, Value};

/// One layer record with the fields that make it visible by default:
/// a 100x100 buffer at the origin, an opaque white fill, and a visible
/// region covering its bounds.
#[derive(Clone, Debug)]
pub struct LayerBuilder {
    message: Message,
}

fn rect_message(rect: Rect, float: bool) -> Message {
    if float {
        Message::new()
            .with("left", rect.left)
            .with("top", rect.top)
            .with("right", rect.right)
            .with("bottom", rect.bottom)
    } else {
        Message::new()
            .with("left", rect.left as i32)
            .with("top", rect.top as i32)
            .with("right", rect.right as i32)
            .with("bottom", rect.bottom as i32)
    }
}

fn color_message(r: f32, g: f32, b: f32, a: f32) -> Message {
    Message::new().with("r", r).with("g", g).with("b", b).with("a", a)
}

impl LayerBuilder {
    pub fn new(id: i32, name: &str) -> Self {
        let message = Message::new()
            .with("id", id)
            .with("name", name)
            .with("type", "BufferStateLayer")
            .with("activeBuffer", Message::new().with("width", 100u32).with("height", 100u32))
            .with("color", color_message(1.0, 1.0, 1.0, 1.0))
            .with("isOpaque", true);
        Self { message }.bounds(Rect::from_xywh(0.0, 0.0, 100.0, 100.0))
    }

    pub fn parent(mut self, parent: i32) -> Self {
        self.message.set("parent", parent);
        self
    }

    pub fn z(mut self, z: i32) -> Self {
        self.message.set("z", z);
        self
    }

    /// Z-order relative to another layer.
    pub fn relative_of(mut self, layer: i32) -> Self {
        self.message.set("zOrderRelativeOf", layer);
        self.message.set("isRelativeOf", true);
        self
    }

    pub fn layer_stack(mut self, stack: u32) -> Self {
        self.message.set("layerStack", stack);
        self
    }

    /// Bounds, screen bounds and visible region.
    pub fn bounds(mut self, bounds: Rect) -> Self {
        self.message.set("bounds", rect_message(bounds, true));
        self.message.set("screenBounds", rect_message(bounds, true));
        self.message.set(
            "visibleRegion",
            Message::new().with("rect", vec![Value::Message(rect_message(bounds, false))]),
        );
        self
    }

    pub fn color(mut self, r: f32, g: f32, b: f32, a: f32) -> Self {
        self.message.set("color", color_message(r, g, b, a));
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.message.set("flags", flags);
        self
    }

    pub fn opaque(mut self, opaque: bool) -> Self {
        self.message.set("isOpaque", opaque);
        self
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.message.set("cornerRadius", radius);
        self
    }

    /// Drop the visible region, as compositor state does for layers
    /// not drawn in the last frame.
    pub fn without_visible_region(mut self) -> Self {
        self.message.remove("visibleRegion");
        self
    }

    /// Set any other layer field.
    pub fn field(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.message.set(name, value);
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}

/// Entry record; `elapsed` of `None` makes a dump.
pub fn entry_message(elapsed: Option<i64>, vsync_id: i64, layers: Vec<Message>) -> Message {
    let layers: Vec<Value> = layers.into_iter().map(Value::Message).collect();
    let mut entry = Message::new();
    if let Some(elapsed) = elapsed {
        entry.set("elapsedRealtimeNanos", elapsed);
    }
    entry.set("where", "visibleRegionsDirty");
    entry.set("layers", Message::new().with("layers", layers));
    entry.set("vsyncId", vsync_id);
    entry
}

/// Builder of `LYRTRACE` file bytes.
#[derive(Clone, Debug)]
pub struct CaptureBuilder {
    entries: Vec<Message>,
    real_to_elapsed_offset: Option<u64>,
    magic: bool,
}

impl Default for CaptureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureBuilder {
    pub fn new() -> Self {
        Self { entries: Vec::new(), real_to_elapsed_offset: None, magic: true }
    }

    pub fn real_to_elapsed_offset(mut self, offset_ns: u64) -> Self {
        self.real_to_elapsed_offset = Some(offset_ns);
        self
    }

    /// Leave out the magic number field.
    pub fn without_magic(mut self) -> Self {
        self.magic = false;
        self
    }

    pub fn entry(mut self, elapsed: i64, vsync_id: i64, layers: Vec<Message>) -> Self {
        self.entries.push(entry_message(Some(elapsed), vsync_id, layers));
        self
    }

    pub fn dump(mut self, layers: Vec<Message>) -> Self {
        self.entries.push(entry_message(None, 0, layers));
        self
    }

    /// Append a prepared entry record.
    pub fn raw_entry(mut self, entry: Message) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let mut file = Message::new();
        if self.magic {
            file.set("magicNumber", MAGIC_NUMBER);
        }
        let entries: Vec<Value> = self.entries.iter().cloned().map(Value::Message).collect();
        file.set("entry", entries);
        if let Some(offset) = self.real_to_elapsed_offset {
            file.set("realToElapsedTimeOffsetNanos", offset);
        }
        wire::encode(&TRACE_FILE, &file)
    }
}
