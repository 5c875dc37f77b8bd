use std::collections::HashMap;

use eframe::egui;

use crate::model::{Shape, Unit, UnitId, UnitStatus};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct StatusStyle {
    pub fill: egui::Color32,
    pub stroke: egui::Color32,
}

/// Pure mapping from availability status to overlay colors. Missing unit,
/// unbound shape, or an unknown status fall back to the neutral style.
pub(super) fn style_for(status: Option<UnitStatus>) -> StatusStyle {
    match status {
        Some(UnitStatus::Available) => StatusStyle {
            fill: egui::Color32::from_rgba_unmultiplied(76, 175, 80, 90),
            stroke: egui::Color32::from_rgb(46, 125, 50),
        },
        Some(UnitStatus::Reserved) => StatusStyle {
            fill: egui::Color32::from_rgba_unmultiplied(255, 193, 7, 90),
            stroke: egui::Color32::from_rgb(255, 160, 0),
        },
        Some(UnitStatus::Sold) => StatusStyle {
            fill: egui::Color32::from_rgba_unmultiplied(229, 57, 53, 90),
            stroke: egui::Color32::from_rgb(183, 28, 28),
        },
        Some(UnitStatus::Unknown) | None => StatusStyle {
            fill: egui::Color32::from_rgba_unmultiplied(158, 158, 158, 50),
            stroke: egui::Color32::from_gray(120),
        },
    }
}

pub(super) fn style_for_shape(shape: &Shape, units: &HashMap<UnitId, Unit>) -> StatusStyle {
    style_for(shape.unit_id.and_then(|id| units.get(&id)).map(|u| u.status))
}
