use std::collections::HashMap;

use crate::model::{Point, Shape, ShapeId, Unit, UnitId};

/// Which shapes are eligible hit targets. The editor targets every shape;
/// the public viewer only shapes whose bound unit resolves in the unit table.
#[derive(Clone, Copy)]
pub(super) enum HitFilter<'a> {
    All,
    BoundResolvable(&'a HashMap<UnitId, Unit>),
}

impl HitFilter<'_> {
    fn eligible(&self, shape: &Shape) -> bool {
        match self {
            HitFilter::All => true,
            HitFilter::BoundResolvable(units) => shape
                .unit_id
                .is_some_and(|id| units.contains_key(&id)),
        }
    }
}

/// First shape in registry order containing the point wins; overlapping
/// shapes are user error but must not misbehave. The bounding-box check is a
/// fast path before the ray cast.
pub(super) fn hit_test<'a>(
    point: Point,
    shapes: &'a [Shape],
    filter: HitFilter<'_>,
) -> Option<&'a Shape> {
    shapes.iter().find(|s| {
        filter.eligible(s) && s.bounds().contains(point.to_pos2()) && s.contains(point)
    })
}

/// Hover is transient (cleared when the pointer leaves every shape);
/// selection persists until replaced or explicitly cleared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) struct Selection {
    hovered: Option<ShapeId>,
    selected: Option<ShapeId>,
}

impl Selection {
    pub(super) fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    pub(super) fn selected(&self) -> Option<ShapeId> {
        self.selected
    }

    pub(super) fn hover(&mut self, hit: Option<ShapeId>) {
        self.hovered = hit;
    }

    pub(super) fn pointer_left(&mut self) {
        self.hovered = None;
    }

    /// Returns true when the selection changed.
    pub(super) fn select(&mut self, hit: Option<ShapeId>) -> bool {
        if self.selected == hit {
            return false;
        }
        self.selected = hit;
        true
    }

    pub(super) fn clear(&mut self) {
        self.hovered = None;
        self.selected = None;
    }

    pub(super) fn forget(&mut self, id: ShapeId) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        if self.selected == Some(id) {
            self.selected = None;
        }
    }
}
