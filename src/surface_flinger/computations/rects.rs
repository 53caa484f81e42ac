use std::collections::BTreeMap;

use crate::hierarchy::{Computation, HierarchyTree, NodeId, TraceRect};
use crate::properties::PropertyTree;
use crate::surface_flinger::computations::{alpha, layer_stack, rect_property, screen_rect, sort_bottom_to_top, z_order_path, ZOrderPath};
use crate::util::{Rect, Result};

/// Attaches screen-space rects: one per layer, ranked bottom to top
/// within its layer stack, and one per display on the root.
pub struct RectsComputation;

fn display_rects(root: &PropertyTree) -> Vec<TraceRect> {
    let Some(displays) = root.child("displays") else {
        return Vec::new();
    };
    displays
        .children()
        .iter()
        .map(|display| {
            let rect = rect_property(display, "layerStackSpaceRect")
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| {
                    let size = display.child("size");
                    let side = |name: &str| size.and_then(|s| s.child_f64(name)).unwrap_or(0.0) as f32;
                    Rect::from_xywh(0.0, 0.0, side("w"), side("h"))
                });
            let id = display.child_i64("id").unwrap_or(0);
            TraceRect {
                id: format!("Display - {}", id),
                name: display.child_str("name").unwrap_or("Unknown display").to_string(),
                rect,
                group_id: display.child_i64("layerStack").unwrap_or(0),
                depth: 0,
                is_visible: true,
                is_display: true,
                opacity: 1.0,
                corner_radius: 0.0,
            }
        })
        .collect()
}

impl Computation for RectsComputation {
    fn name(&self) -> &'static str {
        "rects"
    }

    fn execute(&self, tree: &mut HierarchyTree) -> Result<()> {
        let mut stacks: BTreeMap<i64, Vec<(NodeId, TraceRect, ZOrderPath)>> = BTreeMap::new();
        for id in tree.preorder() {
            let node = tree.node(id);
            if node.is_root() {
                continue;
            }
            let Some(eager) = node.eager() else {
                continue;
            };
            let rect = TraceRect {
                id: node.id().to_string(),
                name: node.name().to_string(),
                rect: screen_rect(eager),
                group_id: layer_stack(eager),
                depth: 0,
                is_visible: eager.child_bool("isVisible").unwrap_or(false),
                is_display: false,
                opacity: alpha(eager).clamp(0.0, 1.0),
                corner_radius: eager.child_f64("cornerRadius").unwrap_or(0.0) as f32,
            };
            stacks
                .entry(rect.group_id)
                .or_default()
                .push((id, rect, z_order_path(eager)));
        }

        let displays = tree.node(tree.root()).eager().map(display_rects).unwrap_or_default();
        tree.set_rects(tree.root(), displays);

        for (_, mut layers) in stacks {
            sort_bottom_to_top(&mut layers, |layer| &layer.2);
            for (depth, (id, mut rect, _)) in layers.into_iter().enumerate() {
                rect.depth = depth;
                tree.set_rects(id, vec![rect]);
            }
        }
        Ok(())
    }
}
