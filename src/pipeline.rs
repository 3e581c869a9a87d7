//! Frame pipeline: camera → detector → filter → overlay → snapshot.
//!
//! The loop is cooperative and single-threaded. Each cycle pulls one frame,
//! waits for the detector's answer, applies the filter to every detection in
//! order and only then asks for the next frame. Stopping means not asking
//! again; the shutdown flag is checked once per cycle.

use anyhow::Result;
use image::RgbImage;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::config::CardConfig;
use crate::debounce::{CaptureState, Clock, MonotonicClock};
use crate::detect::{Detection, DetectorBackend};
use crate::filter::{DetectionFilter, FilterParams};
use crate::frame::Frame;
use crate::ingest::CameraSource;
use crate::overlay::{draw_box, Calibration, MeasurementPanel, BOX_COLOR, BOX_THICKNESS};
use crate::snapshot::SnapshotStore;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub filter: FilterParams,
    pub calibration: Calibration,
    pub cooldown: Duration,
}

impl PipelineSettings {
    /// Settings for a loaded configuration.
    ///
    /// Measurements always use the 640x480 reference calibration; other
    /// camera resolutions are logged as a warning and measured the same way.
    pub fn from_config(cfg: &CardConfig) -> Self {
        let calibration = Calibration::default();
        if (cfg.camera.width, cfg.camera.height)
            != (calibration.frame_width, calibration.frame_height)
        {
            log::warn!(
                "camera configured for {}x{}, size calibration assumes {}x{}; inch readings will be off",
                cfg.camera.width,
                cfg.camera.height,
                calibration.frame_width,
                calibration.frame_height
            );
        }
        Self {
            filter: cfg.filter,
            calibration,
            cooldown: cfg.capture.cooldown,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            filter: FilterParams::default(),
            calibration: Calibration::default(),
            cooldown: crate::debounce::DEFAULT_COOLDOWN,
        }
    }
}

/// Counters accumulated over the life of a pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    pub cycles: u64,
    pub frames: u64,
    pub detections: u64,
    pub matches: u64,
    pub captures: u64,
    pub frame_errors: u64,
    pub detector_errors: u64,
    pub snapshot_errors: u64,
}

/// What happened to one frame.
#[derive(Debug)]
pub struct FrameReport {
    pub sequence: u64,
    /// Detections that passed the geometry checks, in detector order.
    pub matches: Vec<Detection>,
    /// Snapshot written for this frame, if any.
    pub captured: Option<PathBuf>,
    /// The frame with boxes drawn for matches seen outside the cooldown.
    pub canvas: RgbImage,
}

pub struct CardPipeline<C: Clock = MonotonicClock> {
    filter: DetectionFilter,
    state: CaptureState,
    calibration: Calibration,
    panel: MeasurementPanel,
    store: SnapshotStore,
    clock: C,
    stats: RunStats,
}

impl CardPipeline<MonotonicClock> {
    pub fn new(settings: PipelineSettings, store: SnapshotStore) -> Self {
        Self::with_clock(settings, store, MonotonicClock)
    }
}

impl<C: Clock> CardPipeline<C> {
    pub fn with_clock(settings: PipelineSettings, store: SnapshotStore, clock: C) -> Self {
        Self {
            filter: DetectionFilter::new(settings.filter),
            state: CaptureState::with_cooldown(settings.cooldown),
            calibration: settings.calibration,
            panel: MeasurementPanel::new(),
            store,
            clock,
            stats: RunStats::default(),
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn panel(&self) -> &MeasurementPanel {
        &self.panel
    }

    pub fn stats(&self) -> RunStats {
        self.stats
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Apply the filter to one frame's detections and render the results.
    ///
    /// Matches are only drawn while no capture is pending. The first
    /// qualifying detection starts the cooldown, so later matches in the same
    /// frame are counted but neither drawn nor captured.
    pub fn process(&mut self, frame: &Frame, detections: &[Detection]) -> Result<FrameReport> {
        let now = self.clock.now();
        if self.state.refresh(now) {
            log::debug!("capture cooldown elapsed, ready to capture again");
        }

        let mut canvas = frame.to_rgb_image()?;
        let mut matches = Vec::new();
        let mut captured = None;
        self.stats.frames += 1;
        self.panel.reset_confidence();

        for detection in detections {
            self.stats.detections += 1;
            let result = self.filter.evaluate(detection, &self.state);
            if !result.is_match {
                log::trace!(
                    "frame {}: skipped {:?} ({:?})",
                    frame.sequence,
                    detection,
                    result.rejection
                );
                continue;
            }

            self.stats.matches += 1;
            matches.push(detection.clone());
            if self.state.capturing() {
                continue;
            }
            draw_box(&mut canvas, detection, BOX_COLOR, BOX_THICKNESS);
            self.panel.show_confidence(detection.confidence);

            if result.should_capture && self.state.begin_cooldown(now) {
                self.panel.record_capture(detection, &self.calibration);
                match self.store.save(&canvas) {
                    Ok(path) => {
                        self.stats.captures += 1;
                        log::info!(
                            "frame {}: card captured to {} ({}, {}, {})",
                            frame.sequence,
                            path.display(),
                            self.panel.real_width,
                            self.panel.real_height,
                            self.panel.confidence
                        );
                        captured = Some(path);
                    }
                    Err(e) => {
                        self.stats.snapshot_errors += 1;
                        log::error!("frame {}: snapshot failed: {:#}", frame.sequence, e);
                    }
                }
            }
        }

        Ok(FrameReport {
            sequence: frame.sequence,
            matches,
            captured,
            canvas,
        })
    }

    /// Poll `source` and `detector` until `shutdown` is set or `max_cycles`
    /// cycles have run.
    ///
    /// Camera and detector failures are logged and the cycle skipped; the
    /// loop never gives up on its own.
    pub fn run(
        &mut self,
        source: &mut CameraSource,
        detector: &mut dyn DetectorBackend,
        shutdown: &AtomicBool,
        max_cycles: Option<u64>,
    ) -> RunStats {
        let mut last_health_log = Instant::now();

        while !shutdown.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| self.stats.cycles >= max) {
                break;
            }
            self.stats.cycles += 1;
            self.cycle(source, detector);

            if last_health_log.elapsed() >= HEALTH_LOG_INTERVAL {
                let camera = source.stats();
                log::info!(
                    "camera health={} frames={} device={} {}x{} matches={} captures={} detector_errors={}",
                    source.is_healthy(),
                    camera.frames_captured,
                    camera.device,
                    camera.width,
                    camera.height,
                    self.stats.matches,
                    self.stats.captures,
                    self.stats.detector_errors
                );
                last_health_log = Instant::now();
            }
        }

        self.stats
    }

    fn cycle(&mut self, source: &mut CameraSource, detector: &mut dyn DetectorBackend) {
        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.stats.frame_errors += 1;
                log::error!("camera frame failed: {:#}", e);
                return;
            }
        };

        let detections = match detector.detect(&frame) {
            Ok(detections) => detections,
            Err(e) => {
                self.stats.detector_errors += 1;
                log::error!(
                    "detector {} failed on frame {}: {:#}",
                    detector.name(),
                    frame.sequence,
                    e
                );
                return;
            }
        };

        if let Err(e) = self.process(&frame, &detections) {
            log::error!("frame {} dropped: {:#}", frame.sequence, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::ManualClock;
    use crate::detect::ScriptedBackend;
    use crate::ingest::CameraConfig;

    fn pipeline(dir: &std::path::Path, clock: ManualClock) -> CardPipeline<ManualClock> {
        let store = SnapshotStore::new(dir).unwrap();
        CardPipeline::with_clock(PipelineSettings::default(), store, clock)
    }

    fn card(confidence: f32) -> Detection {
        Detection::new(100.0, 100.0, 150.0, 95.0, confidence)
    }

    #[test]
    fn qualifying_detection_captures_once_per_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let clock = ManualClock::new();
        let mut pipeline = pipeline(dir.path(), clock.clone());
        let frame = Frame::blank(640, 480);

        let report = pipeline.process(&frame, &[card(0.95)]).unwrap();
        assert!(report.captured.is_some());
        assert!(pipeline.state().capturing());

        clock.advance(Duration::from_millis(2999));
        let report = pipeline.process(&frame, &[card(0.95)]).unwrap();
        assert!(report.captured.is_none());
        assert_eq!(report.matches.len(), 1);
        assert_eq!(*report.canvas.get_pixel(100, 100), image::Rgb([0, 0, 0]));
        assert_eq!(pipeline.panel().confidence, "Confidence: 0%");

        clock.advance(Duration::from_millis(1));
        let report = pipeline.process(&frame, &[card(0.95)]).unwrap();
        assert!(report.captured.is_some());
        assert_eq!(pipeline.stats().captures, 2);
        assert_eq!(pipeline.store().saved(), 2);
    }

    #[test]
    fn second_match_in_same_frame_does_not_capture() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        let frame = Frame::blank(640, 480);
        let other = Detection::new(300.0, 200.0, 140.0, 88.0, 0.97);

        let report = pipeline.process(&frame, &[card(0.95), other]).unwrap();
        assert_eq!(report.matches.len(), 2);
        assert_eq!(pipeline.stats().matches, 2);
        assert_eq!(pipeline.stats().captures, 1);
        assert_eq!(pipeline.panel().confidence, "Confidence: 95.00%");
        assert_eq!(pipeline.panel().width, "Width: 150px");
        assert_eq!(*report.canvas.get_pixel(100, 100), BOX_COLOR);
        assert_eq!(*report.canvas.get_pixel(300, 200), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn failed_snapshot_still_starts_cooldown() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        // A directory where the PNG should go makes the final rename fail.
        std::fs::create_dir(pipeline.store().snapshot_path()).unwrap();
        let frame = Frame::blank(640, 480);

        let report = pipeline.process(&frame, &[card(0.95)]).unwrap();
        assert!(report.captured.is_none());
        assert_eq!(pipeline.stats().snapshot_errors, 1);
        assert_eq!(pipeline.stats().captures, 0);
        assert_eq!(pipeline.store().saved(), 0);
        assert!(pipeline.state().capturing());

        let report = pipeline.process(&frame, &[card(0.95)]).unwrap();
        assert!(report.captured.is_none());
        assert_eq!(pipeline.stats().snapshot_errors, 1);
    }

    #[test]
    fn settings_from_config_keep_reference_calibration() {
        let mut cfg = CardConfig::default();
        cfg.camera.width = 1280;
        cfg.camera.height = 720;
        cfg.capture.cooldown = Duration::from_millis(1500);

        let settings = PipelineSettings::from_config(&cfg);
        assert_eq!(settings.calibration, Calibration::default());
        assert_eq!(settings.cooldown, Duration::from_millis(1500));
        assert!((settings.calibration.real_width(150.0) - 150.0 * 3.37 / 640.0).abs() < 1e-6);
        assert!((settings.calibration.real_height(95.0) - 95.0 * 2.125 / 480.0).abs() < 1e-6);
    }

    #[test]
    fn matches_are_boxed_on_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        let frame = Frame::blank(640, 480);

        let report = pipeline
            .process(&frame, &[card(0.6), Detection::new(0.0, 0.0, 30.0, 30.0, 0.99)])
            .unwrap();
        assert_eq!(report.matches.len(), 1);
        assert!(report.captured.is_none());
        assert_eq!(*report.canvas.get_pixel(100, 100), BOX_COLOR);
        assert_eq!(*report.canvas.get_pixel(0, 0), image::Rgb([0, 0, 0]));
    }

    #[test]
    fn confidence_label_resets_each_frame() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        let frame = Frame::blank(640, 480);

        pipeline.process(&frame, &[card(0.7)]).unwrap();
        assert_eq!(pipeline.panel().confidence, "Confidence: 70.00%");

        pipeline.process(&frame, &[]).unwrap();
        assert_eq!(pipeline.panel().confidence, "Confidence: 0%");
        assert_eq!(pipeline.panel().width, "");
    }

    #[test]
    fn run_skips_detector_failures_and_keeps_polling() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        let mut source = CameraSource::start_capture(CameraConfig {
            device: "stub://test".to_string(),
            target_fps: 0,
            ..CameraConfig::default()
        })
        .unwrap();
        let mut detector = ScriptedBackend::new()
            .with_failure("inference timed out")
            .with_batch(vec![card(0.95)])
            .with_batch(vec![card(0.95)]);
        let shutdown = AtomicBool::new(false);

        let stats = pipeline.run(&mut source, &mut detector, &shutdown, Some(4));
        assert_eq!(stats.cycles, 4);
        assert_eq!(stats.detector_errors, 1);
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.matches, 2);
        assert_eq!(stats.captures, 1);
        assert_eq!(detector.calls(), 4);
    }

    #[test]
    fn run_stops_when_shutdown_is_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut pipeline = pipeline(dir.path(), ManualClock::new());
        let mut source = CameraSource::start_capture(CameraConfig {
            target_fps: 0,
            ..CameraConfig::default()
        })
        .unwrap();
        let mut detector = ScriptedBackend::new();
        let shutdown = AtomicBool::new(true);

        let stats = pipeline.run(&mut source, &mut detector, &shutdown, None);
        assert_eq!(stats.cycles, 0);
        assert_eq!(source.stats().frames_captured, 0);
    }
}
