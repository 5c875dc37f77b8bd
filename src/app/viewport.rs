use eframe::egui;

pub(super) const MIN_SCALE: f32 = 1.0;
pub(super) const MAX_SCALE: f32 = 4.0;
const SCALE_STEP: f32 = 0.5;

/// Pan/zoom state shared by editor and viewer. Purely presentational: it
/// moves the rendered rectangle and never touches stored image-space points.
#[derive(Clone, Copy, Debug)]
pub(super) struct ViewportTransform {
    scale: f32,
    translate: egui::Vec2,
    pan_anchor: Option<egui::Vec2>,
}

impl Default for ViewportTransform {
    fn default() -> Self {
        Self {
            scale: MIN_SCALE,
            translate: egui::Vec2::ZERO,
            pan_anchor: None,
        }
    }
}

impl ViewportTransform {
    pub(super) fn scale(&self) -> f32 {
        self.scale
    }

    pub(super) fn translate(&self) -> egui::Vec2 {
        self.translate
    }

    pub(super) fn zoom_in(&mut self) {
        self.scale = (self.scale + SCALE_STEP).clamp(MIN_SCALE, MAX_SCALE);
    }

    /// Zooming back out to 1x does not reset translation; only `reset` does.
    pub(super) fn zoom_out(&mut self) {
        self.scale = (self.scale - SCALE_STEP).clamp(MIN_SCALE, MAX_SCALE);
    }

    pub(super) fn reset(&mut self) {
        *self = Self::default();
    }

    pub(super) fn begin_pan(&mut self, pointer: egui::Pos2) {
        self.pan_anchor = Some(pointer.to_vec2() - self.translate);
    }

    pub(super) fn continue_pan(&mut self, pointer: egui::Pos2) {
        if let Some(anchor) = self.pan_anchor {
            self.translate = pointer.to_vec2() - anchor;
        }
    }

    pub(super) fn end_pan(&mut self) {
        self.pan_anchor = None;
    }

    pub(super) fn is_panning(&self) -> bool {
        self.pan_anchor.is_some()
    }

    /// The on-screen rectangle for the image: `base` (the aspect-fitted rect)
    /// scaled about its center and shifted by the pan translation.
    pub(super) fn apply(&self, base: egui::Rect) -> egui::Rect {
        egui::Rect::from_center_size(base.center() + self.translate, base.size() * self.scale)
    }
}
