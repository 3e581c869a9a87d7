//! Detection filtering policy.
//!
//! Decides whether a detection looks like a credit card (aspect ratio and
//! pixel size) and whether it is confident enough to snapshot. Evaluation is
//! a pure function of the detection, the parameters and the current
//! `capturing` flag; state transitions belong to the caller.

use crate::debounce::CaptureState;
use crate::detect::Detection;

/// ISO/IEC 7810 ID-1 card width in inches.
pub const CARD_WIDTH_IN: f32 = 3.37;
/// ISO/IEC 7810 ID-1 card height in inches.
pub const CARD_HEIGHT_IN: f32 = 2.125;

/// Thresholds applied by `DetectionFilter`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    /// Detections at or below this confidence are not candidates at all.
    pub min_display_confidence: f32,
    /// Matches at or above this confidence trigger a capture.
    pub capture_confidence: f32,
    pub target_aspect_ratio: f32,
    /// Maximum absolute difference from the target aspect ratio (exclusive).
    pub aspect_tolerance: f32,
    /// Exclusive lower pixel bound for both width and height.
    pub min_size: f32,
    /// Exclusive upper pixel bound for both width and height.
    pub max_size: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            min_display_confidence: 0.5,
            capture_confidence: 0.9,
            target_aspect_ratio: CARD_WIDTH_IN / CARD_HEIGHT_IN,
            aspect_tolerance: 0.2,
            min_size: 80.0,
            max_size: 200.0,
        }
    }
}

/// Why a detection did not match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    LowConfidence,
    InvalidGeometry,
    AspectRatio,
    Size,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FilterResult {
    pub is_match: bool,
    pub should_capture: bool,
    pub rejection: Option<Rejection>,
}

impl FilterResult {
    fn rejected(reason: Rejection) -> Self {
        Self {
            is_match: false,
            should_capture: false,
            rejection: Some(reason),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DetectionFilter {
    params: FilterParams,
}

impl DetectionFilter {
    pub fn new(params: FilterParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FilterParams {
        &self.params
    }

    /// Classify one detection against the current capture state.
    pub fn evaluate(&self, detection: &Detection, state: &CaptureState) -> FilterResult {
        self.evaluate_with(detection, state.capturing())
    }

    /// Same as `evaluate`, with the `capturing` flag passed directly.
    #[allow(clippy::neg_cmp_op_on_partial_ord)]
    pub fn evaluate_with(&self, detection: &Detection, capturing: bool) -> FilterResult {
        let p = &self.params;

        // Negated so NaN confidence falls through to rejection.
        if !(detection.confidence > p.min_display_confidence) {
            return FilterResult::rejected(Rejection::LowConfidence);
        }

        let (width, height) = (detection.width, detection.height);
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return FilterResult::rejected(Rejection::InvalidGeometry);
        }

        let aspect_error = (width / height - p.target_aspect_ratio).abs();
        if !(aspect_error < p.aspect_tolerance) {
            return FilterResult::rejected(Rejection::AspectRatio);
        }

        let in_bounds = |v: f32| p.min_size < v && v < p.max_size;
        if !(in_bounds(width) && in_bounds(height)) {
            return FilterResult::rejected(Rejection::Size);
        }

        FilterResult {
            is_match: true,
            should_capture: detection.confidence >= p.capture_confidence && !capturing,
            rejection: None,
        }
    }
}
