//! Crop export: rasterize the selected region, encode it as JPEG, and hand
//! the bytes to the first delivery sink that will take them.
//!
//! Sink failures are swallowed so the chain can fall through; only total
//! exhaustion is reported. The downloads-directory sink at the end of the
//! chain always has somewhere to write under normal conditions.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context as _, Result, bail};
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;

use crate::crop::CropRect;
use crate::ratio::AspectRatio;

pub const JPEG_QUALITY: u8 = 92;

/// Pixel-exact crop: the rectangle's floored integer bounds drawn 1:1 into
/// an output raster of exactly that size.
pub fn crop_image(image: &DynamicImage, rect: &CropRect) -> DynamicImage {
    let (x, y, w, h) = rect.to_pixels();
    // The rect invariants keep this in bounds; the guard only absorbs a
    // rect that belongs to a previously loaded image.
    let x = x.min(image.width().saturating_sub(1));
    let y = y.min(image.height().saturating_sub(1));
    let w = w.min(image.width() - x).max(1);
    let h = h.min(image.height() - y).max(1);
    image.crop_imm(x, y, w, h)
}

pub fn encode_jpeg(image: &DynamicImage) -> Result<Vec<u8>> {
    let rgb = image.to_rgb8();
    let mut bytes = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .context("could not encode the crop as JPEG")?;
    Ok(bytes)
}

/// `crop_<ratio label with ':' -> 'x'>_<UTC timestamp with ':' '.' -> '-'>.jpg`
pub fn output_filename(ratio: AspectRatio, now: chrono::DateTime<chrono::Utc>) -> String {
    let stamp = now
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("crop_{}_{stamp}.jpg", ratio.file_label())
}

/// One way of handing the encoded file to the user.
pub trait ExportSink {
    fn name(&self) -> &'static str;

    /// `Ok(Some(path))` when delivered, `Ok(None)` when the sink declined
    /// (user cancel, destination unavailable). Errors are swallowed by the
    /// chain and the next sink is tried.
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>>;
}

/// Native save dialog. A cancelled dialog declines rather than fails.
pub struct SaveDialogSink;

impl ExportSink for SaveDialogSink {
    fn name(&self) -> &'static str {
        "save dialog"
    }

    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("JPEG image", &["jpg", "jpeg"])
            .set_file_name(filename)
            .save_file()
        else {
            return Ok(None);
        };
        fs::write(&path, bytes).with_context(|| format!("could not write {}", path.display()))?;
        Ok(Some(path))
    }
}

/// Writes into the user's downloads directory without asking. Falls back to
/// the home directory and then the working directory, so under normal
/// conditions it cannot decline.
pub struct DownloadsSink {
    dir: Option<PathBuf>,
}

impl DownloadsSink {
    pub fn new() -> Self {
        Self { dir: None }
    }

    /// Fixed destination instead of the platform downloads directory.
    pub fn with_dir(dir: PathBuf) -> Self {
        Self { dir: Some(dir) }
    }

    fn target_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

impl Default for DownloadsSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportSink for DownloadsSink {
    fn name(&self) -> &'static str {
        "downloads folder"
    }

    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<Option<PathBuf>> {
        let path = self.target_dir().join(filename);
        fs::write(&path, bytes).with_context(|| format!("could not write {}", path.display()))?;
        Ok(Some(path))
    }
}

/// Walk the sink chain until one accepts the file. Declines and failures of
/// earlier sinks are logged and skipped.
pub fn deliver_through(
    sinks: &[Box<dyn ExportSink>],
    filename: &str,
    bytes: &[u8],
) -> Result<PathBuf> {
    for sink in sinks {
        match sink.deliver(filename, bytes) {
            Ok(Some(path)) => {
                log::info!("exported {} via {}", path.display(), sink.name());
                return Ok(path);
            }
            Ok(None) => log::debug!("export sink declined: {}", sink.name()),
            Err(err) => log::warn!("export sink failed: {}: {err:#}", sink.name()),
        }
    }
    bail!("no export destination accepted the file");
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgba, RgbaImage};

    fn gradient_image(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        }))
    }

    #[test]
    fn crop_produces_exact_subregion() {
        let image = gradient_image(1000, 800);
        let rect = CropRect {
            x: 10.0,
            y: 10.0,
            w: 200.0,
            h: 150.0,
        };
        let cropped = crop_image(&image, &rect);
        assert_eq!((cropped.width(), cropped.height()), (200, 150));
        assert_eq!(cropped.get_pixel(0, 0), image.get_pixel(10, 10));
        assert_eq!(cropped.get_pixel(199, 149), image.get_pixel(209, 159));
    }

    #[test]
    fn crop_floors_fractional_bounds() {
        let image = gradient_image(300, 300);
        let rect = CropRect {
            x: 10.9,
            y: 10.9,
            w: 100.7,
            h: 60.2,
        };
        let cropped = crop_image(&image, &rect);
        assert_eq!((cropped.width(), cropped.height()), (100, 60));
        assert_eq!(cropped.get_pixel(0, 0), image.get_pixel(10, 10));
    }

    #[test]
    fn encode_emits_jpeg_bytes() {
        let bytes = encode_jpeg(&gradient_image(64, 64)).unwrap();
        // JPEG SOI marker.
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn output_filename_format() {
        use chrono::TimeZone as _;
        let now = chrono::Utc.with_ymd_and_hms(2026, 8, 29, 13, 5, 7).unwrap();
        let name = output_filename(AspectRatio::R1_33, now);
        assert_eq!(name, "crop_1.33x1_2026-08-29T13-05-07-000Z.jpg");
    }

    struct DecliningSink;
    impl ExportSink for DecliningSink {
        fn name(&self) -> &'static str {
            "declining"
        }
        fn deliver(&self, _: &str, _: &[u8]) -> Result<Option<PathBuf>> {
            Ok(None)
        }
    }

    struct FailingSink;
    impl ExportSink for FailingSink {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn deliver(&self, _: &str, _: &[u8]) -> Result<Option<PathBuf>> {
            bail!("sink unavailable")
        }
    }

    #[test]
    fn chain_falls_through_declines_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        let sinks: Vec<Box<dyn ExportSink>> = vec![
            Box::new(DecliningSink),
            Box::new(FailingSink),
            Box::new(DownloadsSink::with_dir(dir.path().to_path_buf())),
        ];

        let path = deliver_through(&sinks, "crop_test.jpg", b"payload").unwrap();
        assert_eq!(path, dir.path().join("crop_test.jpg"));
        assert_eq!(fs::read(&path).unwrap(), b"payload");
    }

    #[test]
    fn exhausted_chain_is_an_error() {
        let sinks: Vec<Box<dyn ExportSink>> = vec![Box::new(DecliningSink), Box::new(FailingSink)];
        assert!(deliver_through(&sinks, "crop_test.jpg", b"payload").is_err());
    }

    #[test]
    fn downloads_sink_writes_into_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DownloadsSink::with_dir(dir.path().to_path_buf());
        let path = sink.deliver("crop_out.jpg", b"bytes").unwrap().unwrap();
        assert!(path.starts_with(dir.path()));
        assert_eq!(fs::read(path).unwrap(), b"bytes");
    }
}
