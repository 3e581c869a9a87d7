//! Camera frame sources.
//!
//! This module provides the sources the pipeline can pull frames from:
//! - Synthetic camera (`stub://` devices, always available)
//! - USB/V4L2 devices (feature: camera-v4l2)
//!
//! All sources produce RGB24 `Frame` instances at the configured size.
//! Sources are responsible for:
//! - Opening the device at the requested resolution
//! - Converting device pixel formats to RGB24
//! - Tracking capture statistics and health

pub mod camera;
#[cfg(feature = "camera-v4l2")]
mod normalize;
mod synthetic;
#[cfg(feature = "camera-v4l2")]
pub mod v4l2;

pub use camera::{CameraConfig, CameraSource, CameraStats};
#[cfg(feature = "camera-v4l2")]
pub use v4l2::V4l2Source;
