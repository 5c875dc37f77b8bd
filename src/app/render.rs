use eframe::egui;
use std::collections::HashMap;

use crate::model::{Point, Shape, ShapeId, Unit, UnitId};

use super::mapper::CoordinateMapper;
use super::status;

const ACCENT: egui::Color32 = egui::Color32::from_rgb(90, 160, 255);

pub(super) fn draw_background(painter: &egui::Painter, rect: egui::Rect) {
    let bg = painter.ctx().style().visuals.extreme_bg_color;
    painter.rect_filled(rect, 0.0, bg);
}

pub(super) fn draw_plan_image(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    rendered: egui::Rect,
) {
    let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
    painter.image(texture.id(), rendered, uv, egui::Color32::WHITE);
}

/// Paints every shape with its status colors. The hovered shape gets a
/// heavier stroke, the selected one an accent outline; in the viewer the
/// bound unit's number is labeled at the centroid.
pub(super) fn draw_shapes(
    painter: &egui::Painter,
    mapper: &CoordinateMapper,
    rendered: egui::Rect,
    shapes: &[Shape],
    units: &HashMap<UnitId, Unit>,
    hovered: Option<ShapeId>,
    selected: Option<ShapeId>,
    label_units: bool,
) {
    for shape in shapes {
        let pts: Vec<egui::Pos2> = shape
            .points
            .iter()
            .filter_map(|p| mapper.to_screen_space(*p, rendered).ok())
            .collect();
        if pts.len() < shape.points.len() || pts.len() < 3 {
            continue;
        }

        let style = status::style_for_shape(shape, units);
        let is_hovered = hovered == Some(shape.id);
        let is_selected = selected == Some(shape.id);
        let stroke_width = if is_hovered { 3.0 } else { 1.5 };
        painter.add(egui::Shape::convex_polygon(
            pts.clone(),
            style.fill,
            egui::Stroke::new(stroke_width, style.stroke),
        ));
        if is_selected {
            painter.add(egui::Shape::closed_line(
                pts.clone(),
                egui::Stroke::new(2.0, ACCENT),
            ));
        }

        if label_units {
            if let Some(unit) = shape.unit_id.and_then(|id| units.get(&id)) {
                if let Ok(center) = mapper.to_screen_space(shape.centroid(), rendered) {
                    painter.text(
                        center,
                        egui::Align2::CENTER_CENTER,
                        &unit.number,
                        egui::FontId::proportional(14.0),
                        egui::Color32::WHITE,
                    );
                }
            }
        }
    }
}

/// The open polyline being traced, with a rubber-band segment to the pointer
/// and a ring around the first vertex when a click there would close.
pub(super) fn draw_in_progress(
    painter: &egui::Painter,
    mapper: &CoordinateMapper,
    rendered: egui::Rect,
    vertices: &[Point],
    pointer: Option<egui::Pos2>,
    near_close: bool,
) {
    if vertices.is_empty() {
        return;
    }
    let vertex_pts: Vec<egui::Pos2> = vertices
        .iter()
        .filter_map(|p| mapper.to_screen_space(*p, rendered).ok())
        .collect();
    if vertex_pts.is_empty() {
        return;
    }
    let first = vertex_pts[0];
    let stroke = egui::Stroke::new(2.0, ACCENT);

    let mut line = vertex_pts.clone();
    if let Some(pointer) = pointer {
        line.push(pointer);
    }
    if line.len() >= 2 {
        painter.add(egui::Shape::line(line, stroke));
    }
    for p in &vertex_pts {
        painter.circle_filled(*p, 3.0, ACCENT);
    }
    if near_close {
        painter.circle_stroke(first, 8.0, stroke);
    }
}

pub(super) fn draw_placeholder(painter: &egui::Painter, rect: egui::Rect, text: &str) {
    painter.text(
        rect.center(),
        egui::Align2::CENTER_CENTER,
        text,
        egui::FontId::proportional(16.0),
        egui::Color32::from_gray(140),
    );
}
