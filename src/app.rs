//! The application controller: owns the loaded image, the crop rectangle,
//! the selected ratio, and the gesture state, and wires them to egui.

use std::time::Duration;

use eframe::egui;
use image::DynamicImage;

use crate::crop::CropRect;
use crate::export::{self, DownloadsSink, ExportSink, SaveDialogSink};
use crate::gesture::{GestureController, PointerId};
use crate::loader::ImageLoader;
use crate::ratio::{AspectRatio, RATIOS};
use crate::viewport::Viewport;

const BACKGROUND: egui::Color32 = egui::Color32::from_rgb(0x0b, 0x12, 0x20);
const ACCENT: egui::Color32 = egui::Color32::from_rgb(0x2b, 0x7c, 0xff);
/// Accent at 10% opacity, filling the selected region.
const RECT_FILL: egui::Color32 = egui::Color32::from_rgba_premultiplied(4, 12, 26, 26);
/// 35% black over everything outside the selection.
const DIM: egui::Color32 = egui::Color32::from_black_alpha(90);

pub struct CropApp {
    image: Option<DynamicImage>,
    texture: Option<egui::TextureHandle>,
    rect: Option<CropRect>,
    ratio: AspectRatio,
    gestures: GestureController,
    loader: ImageLoader,
    export_sinks: Vec<Box<dyn ExportSink>>,
    error: Option<String>,
    mouse_down: bool,
}

impl CropApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            image: None,
            texture: None,
            rect: None,
            ratio: AspectRatio::default(),
            gestures: GestureController::default(),
            loader: ImageLoader::new(),
            export_sinks: vec![Box::new(SaveDialogSink), Box::new(DownloadsSink::new())],
            error: None,
            mouse_down: false,
        }
    }

    fn open_image_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Image", &["png", "jpg", "jpeg", "bmp", "webp", "gif"])
            .pick_file()
        {
            self.loader.begin_load(path);
        }
    }

    fn poll_loader(&mut self, ctx: &egui::Context) {
        if self.loader.is_loading() {
            ctx.request_repaint_after(Duration::from_millis(50));
        }
        if let Some(result) = self.loader.poll() {
            match result {
                Ok(loaded) => {
                    log::info!(
                        "loaded {} ({}x{})",
                        loaded.path.display(),
                        loaded.image.width(),
                        loaded.image.height()
                    );
                    self.install_image(ctx, loaded.image);
                }
                Err(err) => self.error = Some(format!("Could not load the image: {err:#}")),
            }
        }
    }

    fn install_image(&mut self, ctx: &egui::Context, image: DynamicImage) {
        let size = [image.width() as usize, image.height() as usize];
        let buffer = image.to_rgba8();
        let pixels = buffer.as_flat_samples();
        let color_image = egui::ColorImage::from_rgba_unmultiplied(size, pixels.as_slice());
        // Replacing the handle releases the previous image's texture.
        self.texture = Some(ctx.load_texture("photo", color_image, egui::TextureOptions::LINEAR));
        self.rect = Some(CropRect::initial(
            self.ratio,
            image.width() as f32,
            image.height() as f32,
        ));
        self.image = Some(image);
        self.gestures.reset();
        self.mouse_down = false;
    }

    /// Rasterize the crop, encode it, and walk a sink chain. Used by both
    /// the full export (dialog first) and quick save (fallback sink only).
    fn export_crop(&mut self, quick: bool) {
        let (Some(image), Some(rect)) = (&self.image, &self.rect) else {
            self.error = Some("Load an image first.".to_owned());
            return;
        };

        let cropped = export::crop_image(image, rect);
        let bytes = match export::encode_jpeg(&cropped) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.error = Some(format!("Could not export: {err:#}"));
                return;
            }
        };

        let filename = export::output_filename(self.ratio, chrono::Utc::now());
        let result = if quick {
            let sinks: Vec<Box<dyn ExportSink>> = vec![Box::new(DownloadsSink::new())];
            export::deliver_through(&sinks, &filename, &bytes)
        } else {
            export::deliver_through(&self.export_sinks, &filename, &bytes)
        };
        if let Err(err) = result {
            self.error = Some(format!("Could not save: {err:#}"));
        }
    }

    /// Feed this frame's platform events into the gesture classifier. Touch
    /// events carry their own ids; the primary mouse button acts as one more
    /// pointer under a reserved id unless real touches are active (egui
    /// synthesizes mouse events from the first touch).
    fn process_canvas_input(&mut self, ctx: &egui::Context, canvas: egui::Rect) {
        let Some(image) = &self.image else {
            return;
        };
        let Some(rect) = self.rect.as_mut() else {
            return;
        };
        let gestures = &mut self.gestures;

        let (img_w, img_h) = (image.width() as f32, image.height() as f32);
        let view = Viewport::fit(canvas, img_w, img_h);
        let ratio = self.ratio;

        let (events, any_touches) = ctx.input(|i| (i.events.clone(), i.any_touches()));
        for event in events {
            match event {
                egui::Event::Touch { id, phase, pos, .. } => {
                    let pid = PointerId(id.0);
                    match phase {
                        egui::TouchPhase::Start => {
                            if canvas.contains(pos) {
                                gestures.pointer_down(pid, pos, &view, rect);
                            }
                        }
                        egui::TouchPhase::Move => {
                            gestures.pointer_move(pid, pos, &view, rect, ratio, img_w, img_h);
                        }
                        egui::TouchPhase::End => gestures.pointer_up(pid, &view, rect),
                        egui::TouchPhase::Cancel => gestures.pointer_cancel(pid, &view, rect),
                    }
                }
                egui::Event::PointerButton {
                    pos,
                    button: egui::PointerButton::Primary,
                    pressed,
                    ..
                } if !any_touches => {
                    if pressed {
                        if canvas.contains(pos) {
                            self.mouse_down = true;
                            gestures.pointer_down(PointerId::MOUSE, pos, &view, rect);
                        }
                    } else if self.mouse_down {
                        self.mouse_down = false;
                        gestures.pointer_up(PointerId::MOUSE, &view, rect);
                    }
                }
                egui::Event::PointerMoved(pos) if self.mouse_down && !any_touches => {
                    gestures.pointer_move(PointerId::MOUSE, pos, &view, rect, ratio, img_w, img_h);
                }
                egui::Event::PointerGone if self.mouse_down => {
                    self.mouse_down = false;
                    gestures.pointer_cancel(PointerId::MOUSE, &view, rect);
                }
                _ => {}
            }
        }
    }

    fn paint_canvas(&self, painter: &egui::Painter, canvas: egui::Rect) {
        painter.rect_filled(canvas, 0.0, BACKGROUND);

        let (Some(image), Some(texture), Some(rect)) = (&self.image, &self.texture, &self.rect)
        else {
            painter.text(
                canvas.center(),
                egui::Align2::CENTER_CENTER,
                "Load an image to start cropping",
                egui::FontId::proportional(16.0),
                egui::Color32::GRAY,
            );
            return;
        };

        let (img_w, img_h) = (image.width() as f32, image.height() as f32);
        let view = Viewport::fit(canvas, img_w, img_h);

        painter.image(
            texture.id(),
            view.image_rect(img_w, img_h),
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let screen = view.rect_to_screen(rect);

        painter.rect_filled(screen, 0.0, RECT_FILL);
        painter.rect_stroke(screen, 0.0, egui::Stroke::new(2.0, ACCENT));

        // Dim the four bands outside the selection; degenerate bands are
        // skipped rather than painted with negative extent.
        let bands = [
            egui::Rect::from_min_max(canvas.min, egui::pos2(canvas.max.x, screen.min.y)),
            egui::Rect::from_min_max(egui::pos2(canvas.min.x, screen.max.y), canvas.max),
            egui::Rect::from_min_max(
                egui::pos2(canvas.min.x, screen.min.y),
                egui::pos2(screen.min.x, screen.max.y),
            ),
            egui::Rect::from_min_max(
                egui::pos2(screen.max.x, screen.min.y),
                egui::pos2(canvas.max.x, screen.max.y),
            ),
        ];
        for band in bands {
            if band.is_positive() {
                painter.rect_filled(band, 0.0, DIM);
            }
        }
    }

    fn toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Open Image").clicked() {
                self.open_image_dialog();
            }

            if self.loader.is_loading() {
                ui.spinner();
            }

            if self.image.is_some() {
                ui.separator();
                ui.label("Aspect ratio:");
                let mut changed = false;
                egui::ComboBox::from_id_salt("aspect_ratio")
                    .selected_text(self.ratio.label())
                    .show_ui(ui, |ui| {
                        for ratio in RATIOS {
                            changed |= ui
                                .selectable_value(&mut self.ratio, ratio, ratio.label())
                                .changed();
                        }
                    });
                if changed {
                    if let (Some(image), Some(rect)) = (&self.image, self.rect.as_mut()) {
                        rect.apply_ratio(
                            self.ratio,
                            image.width() as f32,
                            image.height() as f32,
                        );
                    }
                }

                ui.separator();
                if ui.button("Quick Save").clicked() {
                    self.export_crop(true);
                }
                if ui.button("Export…").clicked() {
                    self.export_crop(false);
                }
            }
        });
    }

    fn error_modal(&mut self, ctx: &egui::Context) {
        let Some(message) = self.error.clone() else {
            return;
        };
        egui::Window::new("Error")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.label(message);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        self.error = None;
                    }
                });
            });
    }
}

impl eframe::App for CropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Handle dropped files
        if !ctx.input(|i| i.raw.dropped_files.is_empty()) {
            let dropped_files = ctx.input(|i| i.raw.dropped_files.clone());
            if let Some(path) = dropped_files.first().and_then(|f| f.path.clone()) {
                self.loader.begin_load(path);
            }
        }

        self.poll_loader(ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::default().fill(BACKGROUND).inner_margin(8.0))
            .show(ctx, |ui| {
                self.toolbar(ui);
                ui.separator();

                let canvas = ui.available_rect_before_wrap();
                let _ = ui.allocate_rect(canvas, egui::Sense::hover());
                self.process_canvas_input(ctx, canvas);

                let painter = ui.painter_at(canvas);
                self.paint_canvas(&painter, canvas);
            });

        self.error_modal(ctx);
    }
}
