//! Shared helpers for integration tests: synthesized captures.

#![allow(dead_code)]

use layertrace::prelude::*;
use layertrace::surface_flinger::capture::{entry_message, CaptureBuilder, LayerBuilder};
use layertrace::wire::Message;

pub const FIRST_ELAPSED_NS: i64 = 850_746_266_486;
pub const FRAME_NS: i64 = 16_666_667;
pub const REAL_OFFSET_NS: u64 = 1_659_107_089_075_566_202;

pub fn layer(id: i32, name: &str) -> LayerBuilder {
    LayerBuilder::new(id, name)
}

/// Root container with two children.
pub fn simple_layers() -> Vec<Message> {
    vec![
        layer(1, "Root").z(0).build(),
        layer(2, "Left").parent(1).z(1).build(),
        layer(3, "Right").parent(1).z(2).build(),
    ]
}

/// 50 trace entries one frame apart; entry `i` has vsync id `i`.
pub fn fifty_entries() -> CaptureBuilder {
    (0..50).fold(CaptureBuilder::new(), |builder, i| {
        builder.entry(FIRST_ELAPSED_NS + i * FRAME_NS, i, simple_layers())
    })
}

/// Capture with a single trace entry.
pub fn single_entry(layers: Vec<Message>) -> Vec<u8> {
    CaptureBuilder::new()
        .entry(FIRST_ELAPSED_NS, 1, layers)
        .build()
        .unwrap()
}

/// Entry record with extra fields.
pub fn entry_with(elapsed: i64, vsync_id: i64, fields: &[(&'static str, u32)]) -> Message {
    let mut entry = entry_message(Some(elapsed), vsync_id, simple_layers());
    for (name, value) in fields {
        entry.set(*name, *value);
    }
    entry
}

pub fn load(bytes: &[u8]) -> Trace<SurfaceFlingerParser> {
    Trace::load(SurfaceFlingerParser::default(), bytes).unwrap()
}

pub fn load_strict(bytes: &[u8]) -> Trace<SurfaceFlingerParser> {
    let mut config = ParserConfig::default();
    config.hierarchy.tolerate_orphans = false;
    Trace::load(SurfaceFlingerParser::new(config), bytes).unwrap()
}

/// Id strings of the children of `id`.
pub fn child_names(tree: &HierarchyTree, id: NodeId) -> Vec<String> {
    tree.node(id)
        .children()
        .iter()
        .map(|&c| tree.node(c).id().to_string())
        .collect()
}
