//! Pointer tracking and gesture classification.
//!
//! Pointer events from any source (touch ids, or the mouse under a reserved
//! id) feed a small state machine: one pointer pressed inside the crop
//! rectangle drags it, two pointers pinch-resize it about its center. The
//! active gesture is a tagged union so a drag and a pinch can never be live
//! at the same time.

use eframe::egui;

use crate::crop::CropRect;
use crate::ratio::AspectRatio;
use crate::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PointerId(pub u64);

impl PointerId {
    /// Reserved id for the mouse pointer, which has no platform touch id.
    pub const MOUSE: PointerId = PointerId(u64::MAX);
}

/// Active pointers in the order they were first observed. The first two
/// entries become the pinch pair; later pointers are tracked but ignored.
#[derive(Debug, Default)]
pub struct PointerSet {
    points: Vec<(PointerId, egui::Pos2)>,
}

impl PointerSet {
    pub fn insert(&mut self, id: PointerId, pos: egui::Pos2) {
        if let Some(entry) = self.points.iter_mut().find(|(pid, _)| *pid == id) {
            entry.1 = pos;
        } else {
            self.points.push((id, pos));
        }
    }

    pub fn remove(&mut self, id: PointerId) {
        self.points.retain(|(pid, _)| *pid != id);
    }

    pub fn get(&self, id: PointerId) -> Option<egui::Pos2> {
        self.points
            .iter()
            .find(|(pid, _)| *pid == id)
            .map(|(_, pos)| *pos)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn first_two(&self) -> Option<[(PointerId, egui::Pos2); 2]> {
        match self.points.as_slice() {
            [a, b, ..] => Some([*a, *b]),
            _ => None,
        }
    }

    fn sole(&self) -> Option<(PointerId, egui::Pos2)> {
        match self.points.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct DragSession {
    pointer: PointerId,
    start: egui::Pos2,
    rect_x: f32,
    rect_y: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct PinchSession {
    a: PointerId,
    b: PointerId,
    start_dist: f32,
    start_w: f32,
    /// Rect center at pinch start; the resize anchor for the whole gesture.
    cx: f32,
    cy: f32,
}

#[derive(Clone, Copy, Debug, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Drag(DragSession),
    Pinch(PinchSession),
}

#[derive(Debug, Default)]
pub struct GestureController {
    pointers: PointerSet,
    gesture: Gesture,
}

impl GestureController {
    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    /// Forget all pointers and any active gesture. Called when the image is
    /// replaced.
    pub fn reset(&mut self) {
        self.pointers.clear();
        self.gesture = Gesture::Idle;
    }

    pub fn pointer_down(&mut self, id: PointerId, pos: egui::Pos2, view: &Viewport, rect: &CropRect) {
        self.pointers.insert(id, pos);

        if self.pointers.len() == 2 {
            // A second pointer always wins over an in-progress drag.
            self.start_pinch(rect);
            return;
        }

        // Containment is tested only at gesture start; a press outside the
        // rectangle stays idle even if the pointer later moves inside.
        if self.pointers.len() == 1 && view.rect_contains(rect, pos) {
            self.start_drag(id, pos, rect);
        }
    }

    /// Returns true when the crop rectangle was mutated.
    pub fn pointer_move(
        &mut self,
        id: PointerId,
        pos: egui::Pos2,
        view: &Viewport,
        rect: &mut CropRect,
        ratio: AspectRatio,
        img_w: f32,
        img_h: f32,
    ) -> bool {
        if self.pointers.get(id).is_none() {
            return false;
        }
        self.pointers.insert(id, pos);

        if self.pointers.len() >= 2 {
            return self.update_pinch(rect, ratio, img_w, img_h);
        }

        if let Gesture::Drag(session) = self.gesture {
            if session.pointer == id {
                let dx = (pos.x - session.start.x) / view.scale;
                let dy = (pos.y - session.start.y) / view.scale;
                rect.x = session.rect_x + dx;
                rect.y = session.rect_y + dy;
                rect.fit_to_bounds(img_w, img_h);
                return true;
            }
        }
        false
    }

    pub fn pointer_up(&mut self, id: PointerId, view: &Viewport, rect: &CropRect) {
        self.pointers.remove(id);

        match self.gesture {
            Gesture::Drag(session) if session.pointer == id => {
                self.gesture = Gesture::Idle;
            }
            Gesture::Pinch(_) if self.pointers.len() < 2 => {
                self.gesture = Gesture::Idle;
            }
            _ => {}
        }

        // Pinch ending with one finger still down inside the rect becomes a
        // drag, seeded at that finger's current position.
        if let Some((only, pos)) = self.pointers.sole() {
            if view.rect_contains(rect, pos) {
                self.start_drag(only, pos, rect);
            }
        }
    }

    /// Platform pointer-cancel; treated exactly like a release.
    pub fn pointer_cancel(&mut self, id: PointerId, view: &Viewport, rect: &CropRect) {
        self.pointer_up(id, view, rect);
    }

    fn start_drag(&mut self, id: PointerId, pos: egui::Pos2, rect: &CropRect) {
        self.gesture = Gesture::Drag(DragSession {
            pointer: id,
            start: pos,
            rect_x: rect.x,
            rect_y: rect.y,
        });
    }

    fn start_pinch(&mut self, rect: &CropRect) {
        let Some([(a, pa), (b, pb)]) = self.pointers.first_two() else {
            self.gesture = Gesture::Idle;
            return;
        };
        let (cx, cy) = rect.center();
        self.gesture = Gesture::Pinch(PinchSession {
            a,
            b,
            start_dist: pa.distance(pb),
            start_w: rect.w,
            cx,
            cy,
        });
    }

    fn update_pinch(&mut self, rect: &mut CropRect, ratio: AspectRatio, img_w: f32, img_h: f32) -> bool {
        let Gesture::Pinch(pinch) = self.gesture else {
            return false;
        };
        let (Some(pa), Some(pb)) = (self.pointers.get(pinch.a), self.pointers.get(pinch.b)) else {
            return false;
        };
        if pinch.start_dist <= 0.0 {
            return false;
        }

        let scale = pa.distance(pb) / pinch.start_dist;
        rect.resize_about(pinch.cx, pinch.cy, pinch.start_w * scale, ratio, img_w, img_h);
        true
    }
}
