use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::frame::Frame;

/// CPU backend that reports the bounding box of bright pixels.
///
/// Pairs with the synthetic `stub://` camera, which paints a light card on a
/// dark background. Confidence is the share of bright pixels inside the box,
/// so a solid card scores 1.0 and a smudged one scores lower.
pub struct BrightRectBackend {
    threshold: u8,
    min_pixels: usize,
}

impl BrightRectBackend {
    pub fn new(threshold: u8, min_pixels: usize) -> Self {
        Self {
            threshold,
            min_pixels,
        }
    }
}

impl Default for BrightRectBackend {
    fn default() -> Self {
        Self::new(220, 64)
    }
}

impl DetectorBackend for BrightRectBackend {
    fn name(&self) -> &'static str {
        "bright-rect"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
        let width = frame.width as usize;
        let height = frame.height as usize;
        let pixels = frame.pixels();
        if pixels.len() != width * height * 3 {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                width * height * 3,
                pixels.len()
            ));
        }

        let mut count = 0usize;
        let (mut min_x, mut min_y) = (usize::MAX, usize::MAX);
        let (mut max_x, mut max_y) = (0usize, 0usize);
        for (idx, rgb) in pixels.chunks_exact(3).enumerate() {
            if rgb.iter().all(|&c| c >= self.threshold) {
                let (x, y) = (idx % width, idx / width);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                count += 1;
            }
        }

        if count < self.min_pixels {
            return Ok(Vec::new());
        }

        let box_w = max_x - min_x + 1;
        let box_h = max_y - min_y + 1;
        let confidence = count as f32 / (box_w * box_h) as f32;

        Ok(vec![Detection::new(
            min_x as f32,
            min_y as f32,
            box_w as f32,
            box_h as f32,
            confidence,
        )
        .with_label("card")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with_rect(x: u32, y: u32, w: u32, h: u32) -> Frame {
        let mut frame = Frame::blank(320, 240);
        frame.fill_rect(x, y, w, h, [255, 255, 255]);
        frame
    }

    #[test]
    fn reports_solid_rectangle_with_full_confidence() {
        let mut backend = BrightRectBackend::default();
        let frame = frame_with_rect(10, 20, 150, 95);

        let detections = backend.detect(&frame).unwrap();
        assert_eq!(detections.len(), 1);
        let det = &detections[0];
        assert_eq!((det.x, det.y, det.width, det.height), (10.0, 20.0, 150.0, 95.0));
        assert_eq!(det.confidence, 1.0);
        assert_eq!(det.label.as_deref(), Some("card"));
    }

    #[test]
    fn dark_frame_has_no_detections() {
        let mut backend = BrightRectBackend::default();
        let frame = Frame::blank(64, 48);
        assert!(backend.detect(&frame).unwrap().is_empty());
    }

    #[test]
    fn partial_fill_lowers_confidence() {
        let mut backend = BrightRectBackend::default();
        let mut frame = frame_with_rect(0, 0, 100, 100);
        frame.fill_rect(0, 10, 100, 40, [0, 0, 0]);

        let detections = backend.detect(&frame).unwrap();
        let det = &detections[0];
        assert_eq!(det.height, 100.0);
        assert!((det.confidence - 0.6).abs() < 1e-6);
    }
}
