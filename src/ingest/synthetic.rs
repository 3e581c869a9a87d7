use anyhow::Result;
use rand::Rng;
use std::time::{Duration, Instant};

use super::camera::{CameraConfig, CameraStats};
use crate::frame::Frame;

/// Frames each synthetic scene is held for.
const SCENE_FRAMES: u64 = 45;

#[derive(Clone, Copy, Debug)]
enum Scene {
    /// Solid card of the given size.
    Card { w: u32, h: u32 },
    /// Card with a dark band across the middle (lower detector confidence).
    SmudgedCard { w: u32, h: u32 },
    Empty,
}

const SCENES: [Scene; 5] = [
    Scene::Card { w: 150, h: 95 },
    Scene::SmudgedCard { w: 150, h: 95 },
    Scene::Card { w: 230, h: 145 },
    Scene::Card { w: 110, h: 110 },
    Scene::Empty,
];

/// Synthetic desk camera for `stub://` devices.
///
/// Renders a dark background and cycles through a few scenes: a card that
/// should be captured, a partly covered card, a card held too close, a
/// square object and an empty desk.
///
/// Honors `target_fps` by sleeping between frames, the way a real device
/// blocks until its next buffer is ready.
pub(crate) struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
    last_frame_at: Option<Instant>,
}

impl SyntheticCamera {
    pub(crate) fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            last_frame_at: None,
        }
    }

    /// Synthetic sources are always "connected".
    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: connected to {} ({}x{}, synthetic)",
            self.config.device,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        self.pace();
        self.frame_count += 1;
        let mut frame = self.render()?;
        frame.sequence = self.frame_count;
        Ok(frame)
    }

    fn pace(&mut self) {
        if self.config.target_fps > 0 {
            let interval = Duration::from_millis(1000 / self.config.target_fps as u64);
            if let Some(last) = self.last_frame_at {
                let elapsed = last.elapsed();
                if elapsed < interval {
                    std::thread::sleep(interval - elapsed);
                }
            }
        }
        self.last_frame_at = Some(Instant::now());
    }

    fn scene(&self) -> Scene {
        let index = ((self.frame_count - 1) / SCENE_FRAMES) as usize % SCENES.len();
        SCENES[index]
    }

    fn render(&self) -> Result<Frame> {
        let (width, height) = (self.config.width, self.config.height);

        // Dim vertical gradient, well below the bright-card threshold.
        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        for (i, px) in pixels.iter_mut().enumerate() {
            let row = (i / 3) as u32 / width;
            *px = (40 + row * 60 / height) as u8;
        }
        let mut frame = Frame::new(pixels, width, height, self.frame_count)?;

        let (w, h, smudged) = match self.scene() {
            Scene::Card { w, h } => (w, h, false),
            Scene::SmudgedCard { w, h } => (w, h, true),
            Scene::Empty => return Ok(frame),
        };

        let mut rng = rand::thread_rng();
        let jitter_x: i64 = rng.gen_range(-4..=4);
        let jitter_y: i64 = rng.gen_range(-4..=4);
        let x = ((width as i64 - w as i64) / 2 + jitter_x).max(0) as u32;
        let y = ((height as i64 - h as i64) / 2 + jitter_y).max(0) as u32;

        frame.fill_rect(x, y, w, h, [245, 245, 240]);
        if smudged {
            let band = h * 3 / 10;
            frame.fill_rect(x, y + (h - band) / 2, w, band, [60, 60, 60]);
        }
        Ok(frame)
    }

    pub(crate) fn is_healthy(&self) -> bool {
        true
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            device: self.config.device.clone(),
            width: self.config.width,
            height: self.config.height,
        }
    }
}
