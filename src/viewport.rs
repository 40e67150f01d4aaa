//! Letterbox fit between image pixels and canvas screen space.

use eframe::egui;

use crate::crop::CropRect;

/// Derived view transform for one frame.
///
/// Recomputed on every paint from the canvas rect and the image's natural
/// size; nothing here outlives the frame.
#[derive(Clone, Copy, Debug)]
pub struct Viewport {
    /// Uniform scale fitting the whole image inside the canvas.
    pub scale: f32,
    /// Screen position of the image's top-left corner (letterbox centering).
    pub origin: egui::Pos2,
    pub canvas: egui::Rect,
}

impl Viewport {
    pub fn fit(canvas: egui::Rect, img_w: f32, img_h: f32) -> Self {
        let scale = (canvas.width() / img_w).min(canvas.height() / img_h);
        let origin = egui::pos2(
            canvas.min.x + (canvas.width() - img_w * scale) / 2.0,
            canvas.min.y + (canvas.height() - img_h * scale) / 2.0,
        );
        Self {
            scale,
            origin,
            canvas,
        }
    }

    /// Screen rect covered by the fitted image.
    pub fn image_rect(&self, img_w: f32, img_h: f32) -> egui::Rect {
        egui::Rect::from_min_size(
            self.origin,
            egui::vec2(img_w * self.scale, img_h * self.scale),
        )
    }

    /// Crop rect mapped into screen space.
    pub fn rect_to_screen(&self, rect: &CropRect) -> egui::Rect {
        egui::Rect::from_min_size(
            egui::pos2(
                self.origin.x + rect.x * self.scale,
                self.origin.y + rect.y * self.scale,
            ),
            egui::vec2(rect.w * self.scale, rect.h * self.scale),
        )
    }

    /// Whether a screen point lies inside the crop rectangle.
    pub fn rect_contains(&self, rect: &CropRect, pos: egui::Pos2) -> bool {
        self.rect_to_screen(rect).contains(pos)
    }
}
