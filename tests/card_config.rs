use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use tempfile::NamedTempFile;

use card_capture::config::CardConfig;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "CARD_CONFIG",
        "CARD_CAMERA_DEVICE",
        "CARD_BACKEND",
        "CARD_MODEL_PATH",
        "CARD_OUTPUT_DIR",
        "CARD_COOLDOWN_MS",
    ] {
        std::env::remove_var(key);
    }
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let mut file = NamedTempFile::new().expect("temp config");
    let json = r#"{
        "camera": {
            "device": "/dev/video2",
            "width": 1280,
            "height": 720,
            "target_fps": 15
        },
        "detector": {
            "backend": "tract",
            "model_path": "models/ssd_card.onnx"
        },
        "filter": {
            "capture_confidence": 0.8,
            "min_size": 120,
            "max_size": 400
        },
        "capture": {
            "output_dir": "/tmp/cards",
            "cooldown_ms": 5000
        }
    }"#;
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");

    std::env::set_var("CARD_CONFIG", file.path());
    std::env::set_var("CARD_CAMERA_DEVICE", "stub://bench");
    std::env::set_var("CARD_COOLDOWN_MS", "1500");

    let cfg = CardConfig::load().expect("load config");

    assert_eq!(cfg.camera.device, "stub://bench");
    assert_eq!((cfg.camera.width, cfg.camera.height), (1280, 720));
    assert_eq!(cfg.camera.target_fps, 15);
    assert_eq!(cfg.detector.backend, "tract");
    assert_eq!(
        cfg.detector.model_path,
        Some(PathBuf::from("models/ssd_card.onnx"))
    );
    assert_eq!(cfg.filter.capture_confidence, 0.8);
    assert_eq!(cfg.filter.min_display_confidence, 0.5);
    assert_eq!((cfg.filter.min_size, cfg.filter.max_size), (120.0, 400.0));
    assert_eq!(cfg.capture.output_dir, PathBuf::from("/tmp/cards"));
    assert_eq!(cfg.capture.cooldown, Duration::from_millis(1500));

    clear_env();
}

#[test]
fn defaults_apply_without_config_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = CardConfig::load().expect("load config");
    assert_eq!(cfg.camera.device, "stub://desk");
    assert_eq!(cfg.detector.backend, "bright-rect");
    assert_eq!(cfg.capture.cooldown, Duration::from_millis(3000));

    clear_env();
}

#[test]
fn rejects_bad_cooldown_override() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CARD_COOLDOWN_MS", "three seconds");
    assert!(CardConfig::load().is_err());

    std::env::set_var("CARD_COOLDOWN_MS", "0");
    assert!(CardConfig::load().is_err());

    clear_env();
}

#[test]
fn rejects_unreadable_or_malformed_file() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("CARD_CONFIG", "/nonexistent/card.json");
    assert!(CardConfig::load().is_err());

    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, b"{ \"filter\": { \"min_size\": \"big\" } }")
        .expect("write config");
    std::env::set_var("CARD_CONFIG", file.path());
    assert!(CardConfig::load().is_err());

    clear_env();
}
