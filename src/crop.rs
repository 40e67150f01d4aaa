//! Crop rectangle and the aspect-locked constraint solver.
//!
//! All coordinates here are image pixels. Screen-space mapping lives in
//! [`crate::viewport`].

use crate::ratio::AspectRatio;

/// Smallest allowed crop edge, in image pixels.
pub const MIN_CROP_SIZE: f32 = 50.0;

/// The initial rectangle is the largest fitting one shrunk by this factor.
const INITIAL_SHRINK: f32 = 0.85;

/// Clamp with the minimum winning over the maximum, so an allowance below
/// `MIN_CROP_SIZE` still yields the minimum and the bounds pass sorts out
/// the overhang.
fn clamp(v: f32, min: f32, max: f32) -> f32 {
    v.min(max).max(min)
}

/// Axis-aligned crop rectangle in image-pixel coordinates.
///
/// Invariants after every mutation: `w >= 50`, `h >= 50`, the rectangle lies
/// inside the image, and `w / h` matches the selected ratio within
/// integer-floor rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl CropRect {
    /// Largest rectangle of the given ratio that fits the image, shrunk by
    /// 15% and centered.
    pub fn initial(ratio: AspectRatio, img_w: f32, img_h: f32) -> Self {
        let r = ratio.value();

        let mut w = img_w;
        let mut h = w / r;
        if h > img_h {
            h = img_h;
            w = h * r;
        }

        w *= INITIAL_SHRINK;
        h *= INITIAL_SHRINK;

        let w = w.floor().max(MIN_CROP_SIZE);
        let h = h.floor().max(MIN_CROP_SIZE);
        Self {
            x: ((img_w - w) / 2.0).floor(),
            y: ((img_h - h) / 2.0).floor(),
            w,
            h,
        }
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    /// Re-derive the rectangle around a fixed anchor point.
    ///
    /// The desired width is clamped to the maximal width that keeps an
    /// aspect-locked rectangle centered at `(cx, cy)` inside the image:
    /// `min(2*min(cx, iw-cx), ratio * 2*min(cy, ih-cy))`. Height follows from
    /// the ratio, the origin is floored, and a final bounds pass absorbs
    /// rounding drift.
    ///
    /// Used by ratio switching (anchor = current center, desired = current
    /// width) and by pinch resizing (anchor = center at pinch start, desired
    /// = start width scaled by the finger distance ratio).
    pub fn resize_about(
        &mut self,
        cx: f32,
        cy: f32,
        desired_w: f32,
        ratio: AspectRatio,
        img_w: f32,
        img_h: f32,
    ) {
        let r = ratio.value();

        let max_w_centered = 2.0 * cx.min(img_w - cx);
        let max_h_centered = 2.0 * cy.min(img_h - cy);
        let allowed_w = max_w_centered.min(r * max_h_centered);

        let new_w = clamp(desired_w, MIN_CROP_SIZE, allowed_w);

        self.w = new_w.floor();
        self.h = (new_w / r).floor();
        self.x = (cx - self.w / 2.0).floor();
        self.y = (cy - self.h / 2.0).floor();

        self.fit_to_bounds(img_w, img_h);
    }

    /// Re-derive after a ratio change, preserving the current center.
    pub fn apply_ratio(&mut self, ratio: AspectRatio, img_w: f32, img_h: f32) {
        let (cx, cy) = self.center();
        let desired_w = self.w;
        self.resize_about(cx, cy, desired_w, ratio, img_w, img_h);
    }

    /// Safety net for rounding and drag drift: clamp the extent to the image
    /// and pull the origin back inside.
    pub fn fit_to_bounds(&mut self, img_w: f32, img_h: f32) {
        self.w = clamp(self.w, MIN_CROP_SIZE, img_w);
        self.h = clamp(self.h, MIN_CROP_SIZE, img_h);
        self.x = clamp(self.x, 0.0, img_w - self.w);
        self.y = clamp(self.y, 0.0, img_h - self.h);
    }

    /// Floored integer bounds for export.
    pub fn to_pixels(&self) -> (u32, u32, u32, u32) {
        (
            self.x.max(0.0).floor() as u32,
            self.y.max(0.0).floor() as u32,
            self.w.floor().max(1.0) as u32,
            self.h.floor().max(1.0) as u32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariants(rect: &CropRect, img_w: f32, img_h: f32) {
        assert!(rect.x >= 0.0, "x: {rect:?}");
        assert!(rect.y >= 0.0, "y: {rect:?}");
        assert!(rect.x + rect.w <= img_w, "right edge: {rect:?}");
        assert!(rect.y + rect.h <= img_h, "bottom edge: {rect:?}");
        assert!(rect.w >= MIN_CROP_SIZE, "min w: {rect:?}");
        assert!(rect.h >= MIN_CROP_SIZE, "min h: {rect:?}");
    }

    #[test]
    fn initial_rect_1000x800_square() {
        let rect = CropRect::initial(AspectRatio::Square, 1000.0, 800.0);
        assert_eq!(rect.w, 680.0);
        assert_eq!(rect.h, 680.0);
        assert_eq!(rect.x, 160.0);
        assert_eq!(rect.y, 60.0);
        assert_invariants(&rect, 1000.0, 800.0);
    }

    #[test]
    fn initial_rect_wide_ratio_limited_by_width() {
        // 1.81:1 on a 1000x800 image: the full-width rect is 1000x552.5,
        // shrunk to 850x469.
        let rect = CropRect::initial(AspectRatio::R1_81, 1000.0, 800.0);
        assert_eq!(rect.w, 850.0);
        assert_eq!(rect.h, 469.0);
        assert_invariants(&rect, 1000.0, 800.0);
    }

    #[test]
    fn initial_rect_never_below_minimum() {
        let rect = CropRect::initial(AspectRatio::Square, 55.0, 55.0);
        assert_eq!(rect.w, MIN_CROP_SIZE);
        assert_eq!(rect.h, MIN_CROP_SIZE);
        assert_invariants(&rect, 55.0, 55.0);
    }

    #[test]
    fn ratio_switch_preserves_center() {
        let mut rect = CropRect {
            x: 160.0,
            y: 60.0,
            w: 680.0,
            h: 680.0,
        };
        let (cx, cy) = rect.center();
        rect.apply_ratio(AspectRatio::R1_33, 1000.0, 800.0);

        assert_invariants(&rect, 1000.0, 800.0);
        let ratio = (rect.w / rect.h * 100.0).round() / 100.0;
        assert_eq!(ratio, 1.33);
        let (ncx, ncy) = rect.center();
        assert!((ncx - cx).abs() <= 1.0);
        assert!((ncy - cy).abs() <= 1.0);
    }

    #[test]
    fn ratio_switch_clamped_by_bounds() {
        // Center near the top edge: the vertical allowance dominates.
        let mut rect = CropRect {
            x: 400.0,
            y: 0.0,
            w: 200.0,
            h: 200.0,
        };
        rect.apply_ratio(AspectRatio::R1_33, 1000.0, 800.0);
        assert_invariants(&rect, 1000.0, 800.0);
        // allowed = min(2*min(500,500), 1.33 * 2*min(100,700)) = 266
        assert_eq!(rect.w, 200.0);
        assert_eq!(rect.h, (200.0f32 / 1.33).floor());
    }

    #[test]
    fn pinch_growth_clamps_to_centered_allowance() {
        // Width 680 scaled by a 150/100 finger spread wants 1020, but the
        // centered allowance on 1000x800 at 1:1 is 800.
        let mut rect = CropRect {
            x: 160.0,
            y: 60.0,
            w: 680.0,
            h: 680.0,
        };
        let (cx, cy) = rect.center();
        rect.resize_about(cx, cy, 680.0 * 1.5, AspectRatio::Square, 1000.0, 800.0);

        assert_eq!(rect.w, 800.0);
        assert_eq!(rect.h, 800.0);
        assert_eq!(rect.x, 100.0);
        assert_eq!(rect.y, 0.0);
        assert_invariants(&rect, 1000.0, 800.0);
    }

    #[test]
    fn resize_about_keeps_center_when_unconstrained() {
        let mut rect = CropRect {
            x: 400.0,
            y: 300.0,
            w: 200.0,
            h: 200.0,
        };
        let (cx, cy) = rect.center();
        rect.resize_about(cx, cy, 300.0, AspectRatio::Square, 1000.0, 800.0);

        let (ncx, ncy) = rect.center();
        assert!((ncx - cx).abs() <= 1.0);
        assert!((ncy - cy).abs() <= 1.0);
        assert_eq!(rect.w, 300.0);
        assert_invariants(&rect, 1000.0, 800.0);
    }

    #[test]
    fn anchor_near_corner_still_yields_valid_rect() {
        // Allowance at (10, 10) is 20, below the minimum size; the minimum
        // wins and the bounds pass pulls the rect back into the image.
        let mut rect = CropRect {
            x: 0.0,
            y: 0.0,
            w: 60.0,
            h: 60.0,
        };
        rect.resize_about(10.0, 10.0, 10.0, AspectRatio::Square, 1000.0, 800.0);
        assert_eq!(rect.w, MIN_CROP_SIZE);
        assert_eq!(rect.h, MIN_CROP_SIZE);
        assert_invariants(&rect, 1000.0, 800.0);
    }

    #[test]
    fn resize_holds_invariants_across_anchor_grid() {
        let (img_w, img_h) = (1000.0, 800.0);
        for cx in (0..=1000).step_by(125) {
            for cy in (0..=800).step_by(100) {
                for desired in [10.0, 120.0, 640.0, 2000.0] {
                    let mut rect = CropRect::initial(AspectRatio::R1_48, img_w, img_h);
                    rect.resize_about(
                        cx as f32,
                        cy as f32,
                        desired,
                        AspectRatio::R1_48,
                        img_w,
                        img_h,
                    );
                    assert_invariants(&rect, img_w, img_h);
                }
            }
        }
    }

    #[test]
    fn to_pixels_floors() {
        let rect = CropRect {
            x: 10.6,
            y: 10.2,
            w: 200.9,
            h: 150.1,
        };
        assert_eq!(rect.to_pixels(), (10, 10, 200, 150));
    }
}
