//! Child placement for drag-to-create gestures.

use crate::capability::CanvasProjection;
use crate::model::node::{MindMapNode, Position};

/// Screen-space top-left corner of the canvas element.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CanvasOrigin {
    pub left: f64,
    pub top: f64,
}

/// Pan/zoom state of the canvas: `canvas = (point - translate) / zoom`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportTransform {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl CanvasProjection for ViewportTransform {
    fn screen_to_canvas(&self, point: Position) -> Position {
        // Non-positive zoom is never produced by the camera; fall back to 1.
        let zoom = if self.zoom > 0.0 { self.zoom } else { 1.0 };
        Position::new((point.x - self.x) / zoom, (point.y - self.y) / zoom)
    }
}

/// Resolves where a child dropped at `pointer` lands, in the parent's
/// center-relative coordinates.
///
/// Returns `None` when the parent has not been measured yet (no absolute
/// position, or no positive size); callers skip child creation in that case.
pub fn resolve_child_position(
    pointer: Position,
    origin: CanvasOrigin,
    parent: &MindMapNode,
    projection: &impl CanvasProjection,
) -> Option<Position> {
    let absolute = parent.position_absolute?;
    let (width, height) = parent
        .size()
        .filter(|(width, height)| *width > 0.0 && *height > 0.0)?;

    let pane = projection.screen_to_canvas(Position::new(
        pointer.x - origin.left,
        pointer.y - origin.top,
    ));
    Some(Position::new(
        pane.x - absolute.x + width / 2.0,
        pane.y - absolute.y + height / 2.0,
    ))
}
