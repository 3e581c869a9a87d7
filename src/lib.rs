//! Credit-card detector.
//!
//! Pulls frames from a camera, runs an object detector on each one, keeps
//! the detections that look like an ID-1 card held at arm's length, boxes
//! them on the frame and snapshots the frame when the detector is confident.
//!
//! # Module Structure
//!
//! - `ingest`: Camera sources (synthetic `stub://`, V4L2 devices)
//! - `frame`: RGB frames passed between stages
//! - `detect`: Detector backends and the backend registry
//! - `filter`: Aspect-ratio / size / confidence policy
//! - `debounce`: Capture cooldown state machine and clocks
//! - `overlay`: Bounding boxes and the measurement panel
//! - `snapshot`: `credit_card_detected.png` persistence
//! - `pipeline`: The polling loop tying it together
//! - `config`: File + environment configuration

pub mod config;
pub mod debounce;
pub mod detect;
pub mod filter;
pub mod frame;
pub mod ingest;
pub mod overlay;
pub mod pipeline;
pub mod snapshot;

pub use config::CardConfig;
pub use debounce::{CaptureState, Clock, ManualClock, MonotonicClock, Phase, DEFAULT_COOLDOWN};
pub use detect::{BackendRegistry, BrightRectBackend, Detection, DetectorBackend, ScriptedBackend};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use filter::{DetectionFilter, FilterParams, FilterResult, Rejection};
pub use frame::Frame;
pub use ingest::{CameraConfig, CameraSource, CameraStats};
pub use overlay::{Calibration, MeasurementPanel};
pub use pipeline::{CardPipeline, FrameReport, PipelineSettings, RunStats};
pub use snapshot::{SnapshotStore, SNAPSHOT_FILE_NAME};
