//! Background image decoding.
//!
//! Decoding runs on a worker thread so the UI stays responsive; completions
//! come back over a channel tagged with a generation counter. Starting a new
//! load bumps the generation, so a slow older decode can never overwrite a
//! newer image.

use std::path::PathBuf;
use std::thread;

use anyhow::{Context as _, Result};
use image::DynamicImage;

#[derive(Debug)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub path: PathBuf,
}

struct Completion {
    generation: u64,
    result: Result<LoadedImage>,
}

pub struct ImageLoader {
    tx: flume::Sender<Completion>,
    rx: flume::Receiver<Completion>,
    generation: u64,
    in_flight: bool,
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageLoader {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            generation: 0,
            in_flight: false,
        }
    }

    /// Whether the most recently requested load is still decoding.
    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Start decoding `path` on a worker thread, superseding any load still
    /// in flight.
    pub fn begin_load(&mut self, path: PathBuf) {
        self.generation += 1;
        self.in_flight = true;

        let generation = self.generation;
        let tx = self.tx.clone();
        thread::spawn(move || {
            log::debug!("decoding {} (load #{generation})", path.display());
            let result = image::open(&path)
                .with_context(|| format!("could not read image {}", path.display()))
                .map(|image| LoadedImage { image, path });
            // The receiver only disappears on shutdown.
            let _ = tx.send(Completion { generation, result });
        });
    }

    /// Drain finished decodes. Completions from superseded loads are
    /// discarded; only the current generation's outcome is returned.
    pub fn poll(&mut self) -> Option<Result<LoadedImage>> {
        let mut current = None;
        for done in self.rx.try_iter() {
            if done.generation == self.generation {
                self.in_flight = false;
                current = Some(done.result);
            } else {
                log::debug!("discarding superseded load #{}", done.generation);
            }
        }
        current
    }
}
