use std::collections::BTreeMap;

use crate::hierarchy::{Computation, HierarchyTree, NodeId};
use crate::properties::{PropertySource, PropertyTree};
use crate::surface_flinger::computations::{alpha, layer_stack, rect_property, screen_rect, sort_bottom_to_top, z_order_path, ZOrderPath};
use crate::surface_flinger::operations::FLAG_HIDDEN;
use crate::util::{Rect, Result};

/// Writes `isVisible` and `visibilityReason`, plus the layers that occlude
/// (`occludedBy`), partially occlude (`partiallyOccludedBy`) or
/// translucently cover (`coveredBy`) each layer.
///
/// Layers are walked top to bottom per layer stack. A layer whose screen
/// rect lies inside an opaque visible layer above it is occluded.
pub struct VisibilityPropertiesComputation;

/// What the pass needs from one layer's eager properties.
struct LayerInfo {
    id: NodeId,
    id_string: String,
    stack: i64,
    path: ZOrderPath,
    rect: Rect,
    reasons: Vec<&'static str>,
    opaque: bool,
}

fn hidden_by_flag(eager: &PropertyTree) -> bool {
    eager
        .child_i64("flags")
        .is_some_and(|flags| flags as u64 & FLAG_HIDDEN != 0)
}

fn has_content(eager: &PropertyTree) -> bool {
    let buffer = eager.child("activeBuffer");
    let dimension = |name: &str| buffer.and_then(|b| b.child_i64(name)).unwrap_or(0);
    let has_buffer = dimension("width") > 0 && dimension("height") > 0;

    // Layers without a color fill carry negative channels
    let has_color = eager.child("color").is_some_and(|color| {
        !color.children().is_empty()
            && ["r", "g", "b"]
                .iter()
                .all(|c| color.child_f64(c).unwrap_or(0.0) >= 0.0)
    });

    let has_effects = eager.child_f64("shadowRadius").unwrap_or(0.0) > 0.0
        || eager.child_f64("backgroundBlurRadius").unwrap_or(0.0) > 0.0;

    has_buffer || has_color || has_effects
}

fn has_visible_region(eager: &PropertyTree) -> bool {
    eager
        .find("visibleRegion.rect")
        .is_some_and(|rects| !rects.children().is_empty())
}

/// Reasons a layer is invisible regardless of what is above it.
fn own_reasons(eager: &PropertyTree, hidden_by_parent: bool) -> Vec<&'static str> {
    let mut reasons = Vec::new();
    if hidden_by_flag(eager) {
        reasons.push("flag is hidden");
    }
    if hidden_by_parent {
        reasons.push("hidden by parent");
    }
    if alpha(eager) == 0.0 {
        reasons.push("alpha is 0");
    }
    if rect_property(eager, "bounds").map_or(true, |b| b.is_empty()) {
        reasons.push("bounds is 0x0");
    }
    if !has_content(eager) {
        reasons.push("no buffer or color fill");
    }
    let excludes_composition = eager.child_bool("excludesCompositionState").unwrap_or(false);
    if !excludes_composition && !has_visible_region(eager) {
        reasons.push("null visible region");
    }
    reasons
}

fn string_list(name: &str, items: impl IntoIterator<Item = String>) -> PropertyTree {
    let mut node = PropertyTree::node(name, PropertySource::Calculated);
    for (i, item) in items.into_iter().enumerate() {
        node.add_child(PropertyTree::new(i.to_string(), item, PropertySource::Calculated));
    }
    node
}

#[derive(Default)]
struct Verdict {
    reasons: Vec<&'static str>,
    occluded_by: Vec<String>,
    partially_occluded_by: Vec<String>,
    covered_by: Vec<String>,
}

fn collect_layers(tree: &HierarchyTree) -> Vec<LayerInfo> {
    let order = tree.preorder();

    // Hidden flag inherited through parents, filled in pre-order
    let mut hidden_below = vec![false; tree.len()];
    let mut layers = Vec::with_capacity(order.len());
    for id in order {
        let node = tree.node(id);
        if node.is_root() {
            continue;
        }
        let parent_hidden = node.parent().is_some_and(|p| hidden_below[p.index()]);
        let Some(eager) = node.eager() else {
            hidden_below[id.index()] = parent_hidden;
            continue;
        };
        hidden_below[id.index()] = parent_hidden || hidden_by_flag(eager);

        let corner_radius = eager.child_f64("cornerRadius").unwrap_or(0.0);
        layers.push(LayerInfo {
            id,
            id_string: node.id().to_string(),
            stack: layer_stack(eager),
            path: z_order_path(eager),
            rect: screen_rect(eager),
            reasons: own_reasons(eager, parent_hidden),
            opaque: eager.child_bool("isOpaque").unwrap_or(false) && alpha(eager) == 1.0 && corner_radius == 0.0,
        });
    }
    layers
}

fn judge(layers: &[LayerInfo]) -> BTreeMap<NodeId, Verdict> {
    let mut stacks: BTreeMap<i64, Vec<&LayerInfo>> = BTreeMap::new();
    for layer in layers {
        stacks.entry(layer.stack).or_default().push(layer);
    }

    let mut verdicts = BTreeMap::new();
    for (_, mut stack) in stacks {
        // Top-most first
        sort_bottom_to_top(&mut stack, |layer| &layer.path);
        stack.reverse();

        let mut opaque_above: Vec<&LayerInfo> = Vec::new();
        let mut translucent_above: Vec<&LayerInfo> = Vec::new();
        for layer in stack {
            let mut verdict = Verdict { reasons: layer.reasons.clone(), ..Verdict::default() };
            if verdict.reasons.is_empty() {
                for above in &opaque_above {
                    if above.rect.contains_rect(&layer.rect) {
                        verdict.occluded_by.push(above.id_string.clone());
                    } else if above.rect.intersects(&layer.rect) {
                        verdict.partially_occluded_by.push(above.id_string.clone());
                    }
                }
                verdict.covered_by = translucent_above
                    .iter()
                    .filter(|above| above.rect.intersects(&layer.rect))
                    .map(|above| above.id_string.clone())
                    .collect();

                if verdict.occluded_by.is_empty() {
                    if layer.opaque {
                        opaque_above.push(layer);
                    } else {
                        translucent_above.push(layer);
                    }
                } else {
                    verdict.reasons.push("occluded");
                }
            }
            verdicts.insert(layer.id, verdict);
        }
    }
    verdicts
}

impl Computation for VisibilityPropertiesComputation {
    fn name(&self) -> &'static str {
        "visibility"
    }

    fn execute(&self, tree: &mut HierarchyTree) -> Result<()> {
        let layers = collect_layers(tree);
        let verdicts = judge(&layers);

        for (id, verdict) in verdicts {
            let Some(eager) = tree.eager_properties_mut(id) else {
                continue;
            };
            let visible = verdict.reasons.is_empty();
            eager.add_child(PropertyTree::new("isVisible", visible, PropertySource::Calculated));
            eager.add_child(string_list(
                "visibilityReason",
                verdict.reasons.iter().map(|r| r.to_string()),
            ));
            eager.add_child(string_list("occludedBy", verdict.occluded_by));
            eager.add_child(string_list("partiallyOccludedBy", verdict.partially_occluded_by));
            eager.add_child(string_list("coveredBy", verdict.covered_by));
        }
        Ok(())
    }
}
