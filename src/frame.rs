//! Video frames handed from camera sources to detectors and the overlay.
//!
//! - `Frame`: RGB24 pixel buffer with dimensions and a sequence number.
//!
//! Sources build frames, detectors read them, and the pipeline copies them
//! into an overlay canvas before drawing.

use anyhow::{anyhow, Result};
use image::RgbImage;

/// One RGB24 frame from a camera source.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,

    pub width: u32,
    pub height: u32,

    /// Source-local frame counter, starting at 1.
    pub sequence: u64,
}

impl Frame {
    /// Wrap RGB24 pixels. Fails if the buffer length does not match the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    /// All-black frame.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            data: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
            sequence: 0,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    /// Paint a solid rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for row in y.min(self.height)..y_end {
            for col in x.min(self.width)..x_end {
                let offset = (row as usize * self.width as usize + col as usize) * 3;
                self.data[offset..offset + 3].copy_from_slice(&rgb);
            }
        }
    }

    /// Copy the pixels into an `image` buffer for drawing and encoding.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| anyhow!("frame buffer does not fit {}x{}", self.width, self.height))
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_length_mismatch() {
        assert!(Frame::new(vec![0u8; 10], 2, 2, 1).is_err());
        assert!(Frame::new(vec![0u8; 12], 2, 2, 1).is_ok());
    }

    #[test]
    fn fill_rect_clips_to_bounds() {
        let mut frame = Frame::blank(4, 4);
        frame.fill_rect(2, 2, 10, 10, [9, 8, 7]);

        let img = frame.to_rgb_image().unwrap();
        assert_eq!(img.get_pixel(3, 3).0, [9, 8, 7]);
        assert_eq!(img.get_pixel(1, 1).0, [0, 0, 0]);
    }
}
