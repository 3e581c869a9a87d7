//! Overlay rendering: bounding boxes on the frame canvas and the text panel
//! shown under it.

use image::{Rgb, RgbImage};

use crate::detect::Detection;
use crate::filter::{CARD_HEIGHT_IN, CARD_WIDTH_IN};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const BOX_THICKNESS: u32 = 4;

/// Frame size the inch conversion is calibrated for.
pub const REFERENCE_FRAME_WIDTH: u32 = 640;
pub const REFERENCE_FRAME_HEIGHT: u32 = 480;

/// Pixel-to-inch conversion, assuming the reference card exactly fills a
/// 640x480 frame.
///
/// Readings from any other resolution are wrong by the scale difference.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    pub card_width_in: f32,
    pub card_height_in: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Calibration {

    pub fn inches_per_px_x(&self) -> f32 {
        self.card_width_in / self.frame_width as f32
    }

    pub fn inches_per_px_y(&self) -> f32 {
        self.card_height_in / self.frame_height as f32
    }

    pub fn real_width(&self, px: f32) -> f32 {
        px * self.inches_per_px_x()
    }

    pub fn real_height(&self, px: f32) -> f32 {
        px * self.inches_per_px_y()
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            card_width_in: CARD_WIDTH_IN,
            card_height_in: CARD_HEIGHT_IN,
            frame_width: REFERENCE_FRAME_WIDTH,
            frame_height: REFERENCE_FRAME_HEIGHT,
        }
    }
}

/// The five text labels rendered below the canvas.
///
/// Measurement labels keep the values of the last capture; the confidence
/// label is reset every frame and shows the last match of that frame.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementPanel {
    pub width: String,
    pub height: String,
    pub real_width: String,
    pub real_height: String,
    pub confidence: String,
}

impl MeasurementPanel {
    pub fn new() -> Self {
        Self {
            width: String::new(),
            height: String::new(),
            real_width: String::new(),
            real_height: String::new(),
            confidence: "Confidence: 0%".to_string(),
        }
    }

    pub fn reset_confidence(&mut self) {
        self.confidence = "Confidence: 0%".to_string();
    }

    pub fn show_confidence(&mut self, confidence: f32) {
        self.confidence = format!("Confidence: {:.2}%", confidence * 100.0);
    }

    pub fn record_capture(&mut self, detection: &Detection, calibration: &Calibration) {
        self.width = format!("Width: {}px", detection.width);
        self.height = format!("Height: {}px", detection.height);
        self.real_width = format!(
            "Real Width: {:.2} inches",
            calibration.real_width(detection.width)
        );
        self.real_height = format!(
            "Real Height: {:.2} inches",
            calibration.real_height(detection.height)
        );
    }

    pub fn lines(&self) -> [&str; 5] {
        [
            self.width.as_str(),
            self.height.as_str(),
            self.real_width.as_str(),
            self.real_height.as_str(),
            self.confidence.as_str(),
        ]
    }
}

impl Default for MeasurementPanel {
    fn default() -> Self {
        Self::new()
    }
}

/// Draw a hollow rectangle for `detection`, clipped to the canvas.
pub fn draw_box(img: &mut RgbImage, detection: &Detection, color: Rgb<u8>, thickness: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    let clamp = |v: f32, max: u32| -> u32 { v.max(0.0).min((max - 1) as f32) as u32 };
    let x0 = clamp(detection.x, w);
    let y0 = clamp(detection.y, h);
    let x1 = clamp(detection.x + detection.width, w);
    let y1 = clamp(detection.y + detection.height, h);

    for t in 0..thickness {
        let xx0 = x0 + t;
        let yy0 = y0 + t;
        let xx1 = x1.saturating_sub(t);
        let yy1 = y1.saturating_sub(t);
        if xx0 > xx1 || yy0 > yy1 {
            break;
        }
        for x in xx0..=xx1 {
            img.put_pixel(x, yy0, color);
            img.put_pixel(x, yy1, color);
        }
        for y in yy0..=yy1 {
            img.put_pixel(xx0, y, color);
            img.put_pixel(xx1, y, color);
        }
    }
}
