#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use aspectcrop::app::CropApp;
use eframe::egui;

fn main() -> eframe::Result {
    // Log to stderr (run with `RUST_LOG=debug` for loader details).
    env_logger::Builder::from_env(env_logger::Env::default()).init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 640.0])
            .with_min_inner_size([480.0, 360.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };
    eframe::run_native(
        "Aspect Crop",
        options,
        Box::new(|cc| Ok(Box::new(CropApp::new(cc)))),
    )
}
