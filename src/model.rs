use eframe::egui;
use serde::{Deserialize, Serialize};

pub type PlanId = u64;
pub type ShapeId = u64;
pub type UnitId = u64;

/// A committed shape is a closed polygon and needs at least this many vertices.
pub const MIN_SHAPE_VERTICES: usize = 3;

/// Snap-to-close distance as a fraction of the image's natural width, so the
/// snap zone scales with image resolution instead of being a fixed pixel count.
pub const CLOSE_THRESHOLD_RATIO: f32 = 0.01;

/// A point in image-intrinsic pixel coordinates (relative to the floor-plan
/// image's natural width/height, never its displayed size).
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn to_pos2(self) -> egui::Pos2 {
        egui::pos2(self.x, self.y)
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn within(self, natural_w: f32, natural_h: f32) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.x <= natural_w && self.y <= natural_h
    }
}

/// A polygon overlay traced on a floor plan. `unit_id` is a weak reference to
/// a unit owned by the unit directory; an unbound shape still renders but is
/// not a hover/click target in the viewer.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Shape {
    pub id: ShapeId,
    #[serde(default)]
    pub unit_id: Option<UnitId>,
    pub points: Vec<Point>,
}

impl Shape {
    pub fn contains(&self, p: Point) -> bool {
        point_in_polygon(p, &self.points)
    }

    pub fn bounds(&self) -> egui::Rect {
        let mut it = self.points.iter();
        let Some(first) = it.next() else {
            return egui::Rect::NOTHING;
        };
        let mut min = first.to_pos2();
        let mut max = first.to_pos2();
        for p in it {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        egui::Rect::from_min_max(min, max)
    }

    pub fn centroid(&self) -> Point {
        if self.points.is_empty() {
            return Point::default();
        }
        let n = self.points.len() as f32;
        let (sx, sy) = self
            .points
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Point::new(sx / n, sy / n)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FloorPlan {
    pub id: PlanId,
    pub entrance: u32,
    pub floor: u32,
    pub image_url: String,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum UnitStatus {
    Available,
    Reserved,
    Sold,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Unit {
    pub id: UnitId,
    pub entrance: u32,
    pub floor: u32,
    pub number: String,
    pub area: f32,
    pub rooms: u32,
    pub price: u64,
    pub status: UnitStatus,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanSelection {
    pub entrance: u32,
    pub floor: u32,
}

/// Even-odd (ray casting) point-in-polygon test. Well-defined for concave and
/// even self-intersecting input; degenerate polygons contain nothing.
pub fn point_in_polygon(p: Point, vertices: &[Point]) -> bool {
    if vertices.len() < MIN_SHAPE_VERTICES {
        return false;
    }
    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            if p.x < a.x + t * (b.x - a.x) {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 100.0),
            Point::new(0.0, 100.0),
        ]
    }

    #[test]
    fn polygon_contains_interior_point() {
        assert!(point_in_polygon(Point::new(50.0, 50.0), &square()));
    }

    #[test]
    fn polygon_excludes_exterior_point() {
        assert!(!point_in_polygon(Point::new(150.0, 50.0), &square()));
        assert!(!point_in_polygon(Point::new(-1.0, 50.0), &square()));
    }

    #[test]
    fn concave_polygon_respects_notch() {
        // U-shaped outline: the notch between the prongs is outside.
        let u = vec![
            Point::new(0.0, 0.0),
            Point::new(30.0, 0.0),
            Point::new(30.0, 60.0),
            Point::new(60.0, 60.0),
            Point::new(60.0, 0.0),
            Point::new(90.0, 0.0),
            Point::new(90.0, 90.0),
            Point::new(0.0, 90.0),
        ];
        assert!(!point_in_polygon(Point::new(45.0, 30.0), &u));
        assert!(point_in_polygon(Point::new(15.0, 30.0), &u));
        assert!(point_in_polygon(Point::new(45.0, 75.0), &u));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = vec![Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &line));
    }

    #[test]
    fn shape_centroid_is_inside_square() {
        let shape = Shape {
            id: 1,
            unit_id: None,
            points: square(),
        };
        let c = shape.centroid();
        assert_eq!(c, Point::new(50.0, 50.0));
        assert!(shape.contains(c));
    }

    #[test]
    fn shape_bounds_cover_all_vertices() {
        let shape = Shape {
            id: 1,
            unit_id: None,
            points: vec![
                Point::new(10.0, 20.0),
                Point::new(110.0, 5.0),
                Point::new(60.0, 90.0),
            ],
        };
        let b = shape.bounds();
        assert_eq!(b.min, egui::pos2(10.0, 5.0));
        assert_eq!(b.max, egui::pos2(110.0, 90.0));
    }

    #[test]
    fn point_within_natural_bounds() {
        assert!(Point::new(0.0, 0.0).within(800.0, 600.0));
        assert!(Point::new(800.0, 600.0).within(800.0, 600.0));
        assert!(!Point::new(-0.1, 10.0).within(800.0, 600.0));
        assert!(!Point::new(10.0, 600.1).within(800.0, 600.0));
    }

    #[test]
    fn unit_status_deserializes_unknown_strings() {
        let s: UnitStatus = serde_json::from_str("\"available\"").unwrap();
        assert_eq!(s, UnitStatus::Available);
        let s: UnitStatus = serde_json::from_str("\"renovating\"").unwrap();
        assert_eq!(s, UnitStatus::Unknown);
    }

    #[test]
    fn shape_serialization_round_trips() {
        let shape = Shape {
            id: 7,
            unit_id: Some(42),
            points: square(),
        };
        let json = serde_json::to_string(&shape).unwrap();
        let back: Shape = serde_json::from_str(&json).unwrap();
        assert_eq!(back, shape);
    }
}
