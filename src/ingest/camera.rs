//! Camera source front end.
//!
//! `CameraSource` picks a backend from the device string: `stub://` devices
//! get the synthetic camera, anything else is treated as a V4L2 device node.

use anyhow::{anyhow, Result};

use super::synthetic::SyntheticCamera;
#[cfg(feature = "camera-v4l2")]
use super::v4l2::V4l2Source;
use crate::frame::Frame;

/// Configuration for a camera source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video0") or "stub://<name>".
    pub device: String,
    /// Requested frame width.
    pub width: u32,
    /// Requested frame height.
    pub height: u32,
    /// Target frame rate. Zero leaves the device default.
    pub target_fps: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: "stub://desk".to_string(),
            width: 640,
            height: 480,
            target_fps: 30,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    V4l2(V4l2Source),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.width == 0 || config.height == 0 {
            return Err(anyhow!(
                "camera resolution must be non-zero (got {}x{})",
                config.width,
                config.height
            ));
        }
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            })
        } else {
            #[cfg(feature = "camera-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::V4l2(V4l2Source::new(config)?),
                })
            }
            #[cfg(not(feature = "camera-v4l2"))]
            {
                Err(anyhow!(
                    "camera device {} requires the camera-v4l2 feature",
                    config.device
                ))
            }
        }
    }

    /// Open a source and connect it, ready to deliver `width x height` frames.
    pub fn start_capture(config: CameraConfig) -> Result<Self> {
        let mut source = Self::new(config)?;
        source.connect()?;
        Ok(source)
    }

    /// Connect to the device.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_capture_produces_frames_at_requested_size() -> Result<()> {
        let mut source = CameraSource::start_capture(CameraConfig {
            device: "stub://test".to_string(),
            width: 320,
            height: 240,
            target_fps: 0,
        })?;

        let frame = source.next_frame()?;
        assert_eq!((frame.width, frame.height), (320, 240));
        assert_eq!(frame.pixels().len(), 320 * 240 * 3);
        assert!(source.is_healthy());

        let stats = source.stats();
        assert_eq!(stats.frames_captured, 1);
        assert_eq!(stats.device, "stub://test");
        assert_eq!((stats.width, stats.height), (320, 240));
        Ok(())
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let config = CameraConfig {
            width: 0,
            ..CameraConfig::default()
        };
        assert!(CameraSource::new(config).is_err());
    }

    #[cfg(not(feature = "camera-v4l2"))]
    #[test]
    fn device_paths_need_v4l2_feature() {
        let config = CameraConfig {
            device: "/dev/video0".to_string(),
            ..CameraConfig::default()
        };
        assert!(CameraSource::new(config).is_err());
    }
}
