//! Fixed-ratio image cropping tool.
//!
//! Load a photo, pick a target aspect ratio, move the crop rectangle by
//! dragging and resize it with a two-finger pinch, then export the selected
//! region as a JPEG.

pub mod app;
pub mod crop;
pub mod export;
pub mod gesture;
pub mod loader;
pub mod ratio;
pub mod viewport;
