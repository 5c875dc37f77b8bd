use eframe::egui;

use crate::model;

/// Coordinate mapping was requested before the image's natural dimensions
/// are known; callers drop the pointer event and wait for the image load.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct ImageNotReady;

/// Converts between pointer/screen coordinates and the image-intrinsic
/// coordinate space, so stored geometry stays correct at any rendered size.
#[derive(Clone, Copy, Debug, Default)]
pub(super) struct CoordinateMapper {
    natural: Option<egui::Vec2>,
}

impl CoordinateMapper {
    pub(super) fn set_natural_size(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            self.natural = None;
        } else {
            self.natural = Some(egui::vec2(width as f32, height as f32));
        }
    }

    pub(super) fn clear(&mut self) {
        self.natural = None;
    }

    pub(super) fn is_ready(&self) -> bool {
        self.natural.is_some()
    }

    pub(super) fn natural_size(&self) -> Option<egui::Vec2> {
        self.natural
    }

    /// Normalizes the pointer position within `rendered` to `[0,1]²` and
    /// scales by the natural dimensions. Positions outside `rendered` map to
    /// out-of-bounds image points; commit-time validation rejects those.
    pub(super) fn to_image_space(
        &self,
        pointer: egui::Pos2,
        rendered: egui::Rect,
    ) -> Result<model::Point, ImageNotReady> {
        let natural = self.natural.ok_or(ImageNotReady)?;
        if rendered.width() <= f32::EPSILON || rendered.height() <= f32::EPSILON {
            return Err(ImageNotReady);
        }
        let nx = (pointer.x - rendered.min.x) / rendered.width();
        let ny = (pointer.y - rendered.min.y) / rendered.height();
        Ok(model::Point::new(nx * natural.x, ny * natural.y))
    }

    pub(super) fn to_screen_space(
        &self,
        point: model::Point,
        rendered: egui::Rect,
    ) -> Result<egui::Pos2, ImageNotReady> {
        let natural = self.natural.ok_or(ImageNotReady)?;
        Ok(egui::pos2(
            rendered.min.x + point.x / natural.x * rendered.width(),
            rendered.min.y + point.y / natural.y * rendered.height(),
        ))
    }

    /// Snap-to-close distance in image-intrinsic pixels.
    pub(super) fn close_threshold(&self) -> Result<f32, ImageNotReady> {
        let natural = self.natural.ok_or(ImageNotReady)?;
        Ok(natural.x * model::CLOSE_THRESHOLD_RATIO)
    }

    /// The largest aspect-preserving rectangle for the image centered in
    /// `available`; the viewport transform is applied on top of this.
    pub(super) fn fitted_rect(&self, available: egui::Rect) -> Result<egui::Rect, ImageNotReady> {
        let natural = self.natural.ok_or(ImageNotReady)?;
        let scale = (available.width() / natural.x)
            .min(available.height() / natural.y)
            .max(0.0);
        let size = natural * scale;
        Ok(egui::Rect::from_center_size(available.center(), size))
    }
}
