use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::debounce::DEFAULT_COOLDOWN;
use crate::filter::FilterParams;
use crate::ingest::CameraConfig;
use crate::snapshot::DEFAULT_OUTPUT_DIR;

const DEFAULT_BACKEND: &str = "bright-rect";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CardConfigFile {
    camera: Option<CameraConfigFile>,
    detector: Option<DetectorConfigFile>,
    filter: Option<FilterConfigFile>,
    capture: Option<CaptureConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    target_fps: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct FilterConfigFile {
    min_display_confidence: Option<f32>,
    capture_confidence: Option<f32>,
    target_aspect_ratio: Option<f32>,
    aspect_tolerance: Option<f32>,
    min_size: Option<f32>,
    max_size: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct CaptureConfigFile {
    output_dir: Option<PathBuf>,
    cooldown_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CardConfig {
    pub camera: CameraConfig,
    pub detector: DetectorSettings,
    pub filter: FilterParams,
    pub capture: CaptureSettings,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: String,
    pub model_path: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct CaptureSettings {
    pub output_dir: PathBuf,
    pub cooldown: Duration,
}

impl CardConfig {
    /// Load from the JSON file named by `CARD_CONFIG` (if set), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("CARD_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: CardConfigFile) -> Self {
        let camera_defaults = CameraConfig::default();
        let camera = file.camera.unwrap_or_default();
        let camera = CameraConfig {
            device: camera.device.unwrap_or(camera_defaults.device),
            width: camera.width.unwrap_or(camera_defaults.width),
            height: camera.height.unwrap_or(camera_defaults.height),
            target_fps: camera.target_fps.unwrap_or(camera_defaults.target_fps),
        };

        let detector = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector
                .backend
                .unwrap_or_else(|| DEFAULT_BACKEND.to_string()),
            model_path: detector.model_path,
        };

        let defaults = FilterParams::default();
        let filter = file.filter.unwrap_or_default();
        let filter = FilterParams {
            min_display_confidence: filter
                .min_display_confidence
                .unwrap_or(defaults.min_display_confidence),
            capture_confidence: filter
                .capture_confidence
                .unwrap_or(defaults.capture_confidence),
            target_aspect_ratio: filter
                .target_aspect_ratio
                .unwrap_or(defaults.target_aspect_ratio),
            aspect_tolerance: filter.aspect_tolerance.unwrap_or(defaults.aspect_tolerance),
            min_size: filter.min_size.unwrap_or(defaults.min_size),
            max_size: filter.max_size.unwrap_or(defaults.max_size),
        };

        let capture = file.capture.unwrap_or_default();
        let capture = CaptureSettings {
            output_dir: capture
                .output_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            cooldown: capture
                .cooldown_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_COOLDOWN),
        };

        Self {
            camera,
            detector,
            filter,
            capture,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(device) = std::env::var("CARD_CAMERA_DEVICE") {
            if !device.trim().is_empty() {
                self.camera.device = device;
            }
        }
        if let Ok(backend) = std::env::var("CARD_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("CARD_MODEL_PATH") {
            if !path.trim().is_empty() {
                self.detector.model_path = Some(PathBuf::from(path));
            }
        }
        if let Ok(dir) = std::env::var("CARD_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                self.capture.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(cooldown) = std::env::var("CARD_COOLDOWN_MS") {
            let millis: u64 = cooldown.trim().parse().map_err(|_| {
                anyhow!("CARD_COOLDOWN_MS must be an integer number of milliseconds")
            })?;
            self.capture.cooldown = Duration::from_millis(millis);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera width and height must be greater than zero"));
        }
        let f = &self.filter;
        for (name, value) in [
            ("min_display_confidence", f.min_display_confidence),
            ("capture_confidence", f.capture_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(anyhow!("filter.{} must be within 0..=1 (got {})", name, value));
            }
        }
        if !(f.target_aspect_ratio.is_finite() && f.target_aspect_ratio > 0.0) {
            return Err(anyhow!("filter.target_aspect_ratio must be positive"));
        }
        if !(f.aspect_tolerance.is_finite() && f.aspect_tolerance > 0.0) {
            return Err(anyhow!("filter.aspect_tolerance must be positive"));
        }
        if !(f.min_size >= 0.0 && f.min_size < f.max_size) {
            return Err(anyhow!(
                "filter.min_size must be non-negative and below max_size ({} >= {})",
                f.min_size,
                f.max_size
            ));
        }
        if self.capture.cooldown.is_zero() {
            return Err(anyhow!("capture cooldown must be greater than zero"));
        }
        if self.detector.backend == "tract" && self.detector.model_path.is_none() {
            return Err(anyhow!("detector backend 'tract' requires a model_path"));
        }
        Ok(())
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self::from_file(CardConfigFile::default())
    }
}

fn read_config_file(path: &Path) -> Result<CardConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_reference_setup() {
        let cfg = CardConfig::default();
        assert_eq!(cfg.camera.device, "stub://desk");
        assert_eq!((cfg.camera.width, cfg.camera.height), (640, 480));
        assert_eq!(cfg.detector.backend, "bright-rect");
        assert_eq!(cfg.filter, FilterParams::default());
        assert_eq!(cfg.capture.cooldown, Duration::from_millis(3000));
        assert_eq!(cfg.capture.output_dir, PathBuf::from("captures"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_inverted_size_bounds() {
        let mut cfg = CardConfig::default();
        cfg.filter.min_size = 250.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_confidence() {
        let mut cfg = CardConfig::default();
        cfg.filter.capture_confidence = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn tract_backend_needs_model() {
        let mut cfg = CardConfig::default();
        cfg.detector.backend = "tract".to_string();
        assert!(cfg.validate().is_err());
        cfg.detector.model_path = Some(PathBuf::from("ssd.onnx"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let parsed: std::result::Result<CardConfigFile, _> =
            serde_json::from_str(r#"{ "camera": { "fps": 10 } }"#);
        assert!(parsed.is_err());
    }
}
