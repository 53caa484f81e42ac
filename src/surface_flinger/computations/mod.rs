//! Computations run over every assembled layer tree, in this order:
//! z-order paths, visibility, rects.

mod rects;
mod visibility;
mod z_order_paths;

pub use rects::*;
pub use visibility::*;
pub use z_order_paths::*;

use std::cmp::Ordering;

use smallvec::SmallVec;

use crate::properties::PropertyTree;
use crate::util::{affine_from_matrix, Affine2, Rect};

/// Z values from the root down to a layer.
pub type ZOrderPath = SmallVec<[i64; 8]>;

/// Rectangle stored as a `left/top/right/bottom` message property.
/// Unset messages read as `None`.
pub(crate) fn rect_property(tree: &PropertyTree, name: &str) -> Option<Rect> {
    let node = tree.child(name)?;
    if node.children().is_empty() {
        return None;
    }
    let side = |s: &str| node.child_f64(s).unwrap_or(0.0) as f32;
    Some(Rect::from_ltrb(side("left"), side("top"), side("right"), side("bottom")))
}

/// Layer transform with its position as translation.
pub(crate) fn layer_transform(tree: &PropertyTree) -> Affine2 {
    let matrix = tree.child("transform");
    let entry = |name: &str, default: f64| {
        matrix.and_then(|m| m.child_f64(name)).unwrap_or(default) as f32
    };
    let position = tree.child("position");
    let offset = |name: &str| position.and_then(|p| p.child_f64(name)).unwrap_or(0.0) as f32;
    affine_from_matrix(
        entry("dsdx", 1.0),
        entry("dtdx", 0.0),
        entry("dsdy", 0.0),
        entry("dtdy", 1.0),
        offset("x"),
        offset("y"),
    )
}

/// Screen-space bounds of a layer: `screenBounds` when recorded,
/// otherwise `bounds` mapped through the layer transform.
pub(crate) fn screen_rect(tree: &PropertyTree) -> Rect {
    if let Some(screen) = rect_property(tree, "screenBounds").filter(|r| !r.is_empty()) {
        return screen;
    }
    rect_property(tree, "bounds")
        .map(|bounds| bounds.transformed(&layer_transform(tree)))
        .unwrap_or(Rect::EMPTY)
}

/// The `zOrderPath` written by [`ZOrderPathsComputation`].
pub(crate) fn z_order_path(tree: &PropertyTree) -> ZOrderPath {
    tree.child("zOrderPath")
        .map(|path| path.children().iter().filter_map(|c| c.value().as_i64()).collect())
        .unwrap_or_default()
}

/// Composition order of two z-order paths, bottom-most first.
///
/// Paths compare element by element. When one path is a prefix of the
/// other, the longer one is a descendant: it draws below the ancestor if
/// its next z is negative, above it otherwise.
pub(crate) fn compare_z_order(a: &[i64], b: &[i64]) -> Ordering {
    if let Some(ordering) = a.iter().zip(b).map(|(x, y)| x.cmp(y)).find(|o| o.is_ne()) {
        return ordering;
    }
    let below_ancestor = |z: i64| if z < 0 { Ordering::Less } else { Ordering::Greater };
    match a.len().cmp(&b.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Less => below_ancestor(b[a.len()]).reverse(),
        Ordering::Greater => below_ancestor(a[b.len()]),
    }
}

/// Sorts layers bottom to top. Layers with equal paths keep their input
/// order, so the later one is on top.
pub(crate) fn sort_bottom_to_top<T>(layers: &mut [T], path: impl Fn(&T) -> &ZOrderPath) {
    layers.sort_by(|a, b| compare_z_order(path(a), path(b)));
}

/// Alpha of the layer color; layers without color are opaque.
pub(crate) fn alpha(tree: &PropertyTree) -> f32 {
    tree.find("color.a").and_then(|a| a.value().as_f64()).unwrap_or(1.0) as f32
}

pub(crate) fn layer_stack(tree: &PropertyTree) -> i64 {
    tree.child_i64("layerStack").unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::PropertySource;
    use crate::wire::Message;

    fn tree(message: Message) -> PropertyTree {
        PropertyTree::from_message("1 layer", &message, PropertySource::Proto, |_| true)
    }

    fn float_rect(l: f32, t: f32, r: f32, b: f32) -> Message {
        Message::new().with("left", l).with("top", t).with("right", r).with("bottom", b)
    }

    #[test]
    fn test_screen_rect_prefers_screen_bounds() {
        let t = tree(
            Message::new()
                .with("screenBounds", float_rect(10.0, 10.0, 20.0, 20.0))
                .with("bounds", float_rect(0.0, 0.0, 5.0, 5.0)),
        );
        assert_eq!(screen_rect(&t), Rect::from_ltrb(10.0, 10.0, 20.0, 20.0));
    }

    #[test]
    fn test_screen_rect_maps_bounds() {
        let t = tree(
            Message::new()
                .with("bounds", float_rect(0.0, 0.0, 100.0, 50.0))
                .with("position", Message::new().with("x", 10.0f32).with("y", 20.0f32))
                .with(
                    "transform",
                    Message::new().with("dsdx", 0.5f32).with("dtdx", 0.0f32).with("dsdy", 0.0f32).with("dtdy", 0.5f32),
                ),
        );
        assert_eq!(screen_rect(&t), Rect::from_ltrb(10.0, 20.0, 60.0, 45.0));
        assert_eq!(screen_rect(&tree(Message::new())), Rect::EMPTY);
    }

    #[test]
    fn test_compare_z_order() {
        assert_eq!(compare_z_order(&[0, 1], &[0, 2]), Ordering::Less);
        assert_eq!(compare_z_order(&[1], &[0, 5]), Ordering::Greater);
        assert_eq!(compare_z_order(&[0, 1], &[0, 1]), Ordering::Equal);
        // Negative-z children draw under their parent
        assert_eq!(compare_z_order(&[0], &[0, -1]), Ordering::Greater);
        assert_eq!(compare_z_order(&[0, -1], &[0]), Ordering::Less);
        assert_eq!(compare_z_order(&[0], &[0, 0]), Ordering::Less);
        assert_eq!(compare_z_order(&[0, 3, -2], &[0, 3]), Ordering::Less);
    }

    #[test]
    fn test_sort_bottom_to_top_keeps_ties_in_order() {
        let mut layers: Vec<(char, ZOrderPath)> = vec![
            ('a', ZOrderPath::from_slice(&[0])),
            ('b', ZOrderPath::from_slice(&[0, -1])),
            ('c', ZOrderPath::from_slice(&[0])),
            ('d', ZOrderPath::from_slice(&[0, 2])),
        ];
        sort_bottom_to_top(&mut layers, |l| &l.1);
        let order: String = layers.iter().map(|l| l.0).collect();
        assert_eq!(order, "bacd");
    }

    #[test]
    fn test_alpha_default() {
        assert_eq!(alpha(&tree(Message::new())), 1.0);
        let t = tree(Message::new().with("color", Message::new().with("a", 0.25f32)));
        assert_eq!(alpha(&t), 0.25);
    }
}
