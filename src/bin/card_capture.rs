//! card_capture - watch a camera for a credit card and snapshot it
//!
//! This binary:
//! 1. Loads configuration (CARD_CONFIG file + CARD_* environment overrides)
//! 2. Opens the camera at the configured resolution
//! 3. Selects a detector backend from the registry
//! 4. Runs the detection pipeline until Ctrl-C or --max-frames
//! 5. Writes credit_card_detected.png on every confident match

use anyhow::{anyhow, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use card_capture::{
    BackendRegistry, BrightRectBackend, CameraSource, CardConfig, CardPipeline,
    PipelineSettings, SnapshotStore,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Detect a credit card in a camera feed and snapshot it"
)]
struct Args {
    /// Stop after this many detection cycles (runs until Ctrl-C when omitted).
    #[arg(long)]
    max_frames: Option<u64>,

    /// Directory for credit_card_detected.png (overrides config).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Detector backend name (overrides config).
    #[arg(long)]
    backend: Option<String>,

    /// Print the available detector backends and exit.
    #[arg(long)]
    list_backends: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut cfg = CardConfig::load()?;
    if let Some(out) = args.out {
        cfg.capture.output_dir = out;
    }
    if let Some(backend) = args.backend {
        cfg.detector.backend = backend;
    }
    cfg.validate()?;

    let registry = build_registry(&cfg)?;
    if args.list_backends {
        for name in registry.list() {
            println!("{}", name);
        }
        return Ok(());
    }

    let backend = registry.select(Some(cfg.detector.backend.as_str()))?;
    let mut detector = backend
        .lock()
        .map_err(|_| anyhow!("backend lock poisoned"))?;
    detector.warm_up()?;

    let mut source = CameraSource::start_capture(cfg.camera.clone())?;
    let store = SnapshotStore::new(&cfg.capture.output_dir)?;
    let mut pipeline = CardPipeline::new(PipelineSettings::from_config(&cfg), store);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::SeqCst);
        })?;
    }

    log::info!(
        "card_capture running: camera={} {}x{} backend={} output={}",
        cfg.camera.device,
        cfg.camera.width,
        cfg.camera.height,
        detector.name(),
        pipeline.store().root().display()
    );
    log::info!(
        "filter: confidence>{} capture>={} ratio={:.4}±{} size=({}, {}) cooldown={}ms",
        cfg.filter.min_display_confidence,
        cfg.filter.capture_confidence,
        cfg.filter.target_aspect_ratio,
        cfg.filter.aspect_tolerance,
        cfg.filter.min_size,
        cfg.filter.max_size,
        cfg.capture.cooldown.as_millis()
    );

    let stats = pipeline.run(&mut source, &mut *detector, &shutdown, args.max_frames);

    println!("card_capture summary:");
    println!("  cycles: {}", stats.cycles);
    println!("  frames processed: {}", stats.frames);
    println!("  detections: {}", stats.detections);
    println!("  card matches: {}", stats.matches);
    println!("  captures: {}", stats.captures);
    println!(
        "  errors: camera={} detector={} snapshot={}",
        stats.frame_errors, stats.detector_errors, stats.snapshot_errors
    );
    for line in pipeline.panel().lines() {
        if !line.is_empty() {
            println!("  {}", line);
        }
    }
    if stats.captures > 0 {
        println!("  snapshot: {}", pipeline.store().snapshot_path().display());
    }
    Ok(())
}

fn build_registry(cfg: &CardConfig) -> Result<BackendRegistry> {
    let mut registry = BackendRegistry::new();
    registry.register(BrightRectBackend::default());

    #[cfg(feature = "backend-tract")]
    {
        if let Some(model_path) = &cfg.detector.model_path {
            let backend =
                card_capture::TractBackend::new(model_path, cfg.camera.width, cfg.camera.height)?;
            registry.register(backend);
        }
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        if cfg.detector.backend == "tract" {
            return Err(anyhow!(
                "detector backend 'tract' requires the backend-tract feature"
            ));
        }
    }

    Ok(registry)
}
