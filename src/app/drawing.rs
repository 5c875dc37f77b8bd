use crate::model::{self, Point};

#[derive(Clone, Debug, PartialEq)]
pub(super) enum DrawEvent {
    VertexAdded,
    /// The committed polygon. The closing click is a signal, not a vertex.
    ShapeClosed(Vec<Point>),
    Cancelled,
}

/// Accumulates vertices from pointer clicks and closes the polygon when a
/// click lands within the snap threshold of the first vertex.
///
/// States: idle (no vertices) and drawing. One drawing session at a time;
/// the controller enforces draw/select mode exclusivity.
#[derive(Clone, Debug, Default)]
pub(super) struct PolygonDrawingEngine {
    vertices: Vec<Point>,
    active: bool,
}

impl PolygonDrawingEngine {
    pub(super) fn is_active(&self) -> bool {
        self.active
    }

    pub(super) fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    pub(super) fn pointer_click(&mut self, p: Point, close_threshold: f32) -> DrawEvent {
        if !self.active {
            self.active = true;
            self.vertices.clear();
            self.vertices.push(p);
            return DrawEvent::VertexAdded;
        }
        if self.vertices.len() >= model::MIN_SHAPE_VERTICES
            && p.distance(self.vertices[0]) < close_threshold
        {
            self.active = false;
            return DrawEvent::ShapeClosed(std::mem::take(&mut self.vertices));
        }
        self.vertices.push(p);
        DrawEvent::VertexAdded
    }

    /// Discards the session. A cancel while idle is a degenerate no-op.
    pub(super) fn cancel(&mut self) -> Option<DrawEvent> {
        if !self.active {
            return None;
        }
        self.active = false;
        self.vertices.clear();
        Some(DrawEvent::Cancelled)
    }

    /// Whether the pointer is hovering the snap zone of the start vertex.
    /// Visual feedback only; does not affect state transitions.
    pub(super) fn near_close(&self, p: Point, close_threshold: f32) -> bool {
        self.active
            && self.vertices.len() >= model::MIN_SHAPE_VERTICES
            && p.distance(self.vertices[0]) < close_threshold
    }
}
