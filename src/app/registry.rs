use crate::model::{self, Point, Shape, ShapeId, UnitId};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum RegistryError {
    InvalidGeometry,
}

/// The set of shapes belonging to one floor plan. Exclusive owner of the
/// shape list during an edit session; persisted only on explicit save.
#[derive(Clone, Debug)]
pub(super) struct ShapeRegistry {
    shapes: Vec<Shape>,
    next_id: ShapeId,
    dirty: bool,
}

impl Default for ShapeRegistry {
    fn default() -> Self {
        Self {
            shapes: Vec::new(),
            next_id: 1,
            dirty: false,
        }
    }
}

impl ShapeRegistry {
    /// Re-seeds from a fetched plan and re-bases the id allocator past the
    /// highest stored id.
    pub(super) fn load(&mut self, shapes: Vec<Shape>) {
        self.next_id = shapes.iter().map(|s| s.id).max().unwrap_or(0) + 1;
        self.shapes = shapes;
        self.dirty = false;
    }

    pub(super) fn add(&mut self, points: Vec<Point>) -> Result<ShapeId, RegistryError> {
        if points.len() < model::MIN_SHAPE_VERTICES {
            return Err(RegistryError::InvalidGeometry);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.shapes.push(Shape {
            id,
            unit_id: None,
            points,
        });
        self.dirty = true;
        Ok(id)
    }

    pub(super) fn remove(&mut self, id: ShapeId) -> bool {
        let before = self.shapes.len();
        self.shapes.retain(|s| s.id != id);
        let removed = self.shapes.len() != before;
        self.dirty |= removed;
        removed
    }

    pub(super) fn rebind(&mut self, id: ShapeId, unit_id: Option<UnitId>) -> bool {
        let Some(shape) = self.shapes.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        if shape.unit_id != unit_id {
            shape.unit_id = unit_id;
            self.dirty = true;
        }
        true
    }

    pub(super) fn find_by_id(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    /// Insertion order; not spatially sorted.
    pub(super) fn all(&self) -> &[Shape] {
        &self.shapes
    }

    pub(super) fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(super) fn mark_saved(&mut self) {
        self.dirty = false;
    }
}
