//! Screen-space rectangles attached to hierarchy nodes.

use crate::util::Rect;

/// A node's geometry as drawn by a viewer.
#[derive(Clone, Debug, PartialEq)]
pub struct TraceRect {
    /// Id string of the owning node.
    pub id: String,
    pub name: String,
    /// Screen-space bounds.
    pub rect: Rect,
    /// Layer stack (display group) the rect belongs to.
    pub group_id: i64,
    /// Draw order within the group; 0 is bottom-most.
    pub depth: usize,
    pub is_visible: bool,
    pub is_display: bool,
    /// Effective alpha in `[0, 1]`.
    pub opacity: f32,
    pub corner_radius: f32,
}
