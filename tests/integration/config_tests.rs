use photosift::config::{ConfigError, Settings, SettingsOverrides};
use photosift::scanner::{BatchScanner, ImageMetrics, ScanCriterion};
use std::fs;
use std::sync::Arc;
use tempfile::tempdir;

use crate::common::flat_png;

#[test]
fn test_config_file_feeds_scan() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("photosift.toml");
    fs::write(
        &config,
        r#"
            brightness_threshold = 120.0
            trash_dir_name = "Rejects"
            ignore_patterns = ["raw/"]
        "#,
    )
    .unwrap();

    let photos = dir.path().join("photos");
    flat_png(&photos, "mid.png", [100, 100, 100], 8, 8);
    flat_png(&photos, "raw/skip.png", [0, 0, 0], 8, 8);
    flat_png(&photos, "Rejects/old.png", [0, 0, 0], 8, 8);
    flat_png(&photos, "Trash/scanned.png", [200, 200, 200], 8, 8);

    let settings = Settings::load(Some(&config), &SettingsOverrides::default()).unwrap();
    assert_eq!(settings.brightness_criterion(), ScanCriterion::Brightness { threshold: 120.0 });

    let scanner = BatchScanner::new(Arc::new(ImageMetrics::new()), settings.scanner_config());
    let result = scanner
        .scan(&photos, settings.brightness_criterion())
        .unwrap();

    // "Trash" is an ordinary folder once the trash is renamed.
    assert_eq!(result.total_processed, 2);
    assert_eq!(result.flagged_paths(), vec![photos.join("mid.png")]);
}

#[test]
fn test_overrides_beat_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("photosift.toml");
    fs::write(&config, "similarity_threshold = 0.8\nmin_height = 100\n").unwrap();

    let overrides = SettingsOverrides {
        similarity_threshold: Some(0.99),
        ..SettingsOverrides::default()
    };
    let settings = Settings::load(Some(&config), &overrides).unwrap();

    assert!((settings.similarity_threshold - 0.99).abs() < f32::EPSILON);
    assert_eq!(settings.min_height, 100);
    assert!((settings.grouper_config().threshold - 0.99).abs() < f32::EPSILON);
}

#[test]
fn test_out_of_range_value_in_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("photosift.toml");
    fs::write(&config, "similarity_threshold = 0.0\n").unwrap();

    let err = Settings::load(Some(&config), &SettingsOverrides::default()).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Invalid {
            field: "similarity_threshold",
            ..
        }
    ));
    assert!(err.to_string().contains("similarity_threshold"));
}

#[test]
fn test_unparseable_file() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("photosift.toml");
    fs::write(&config, "this is = = not toml").unwrap();

    let err = Settings::load(Some(&config), &SettingsOverrides::default()).unwrap_err();
    assert!(matches!(err, ConfigError::Load(_)));
}

#[test]
fn test_save_writes_loadable_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("conf/photosift.toml");
    let settings = Settings {
        min_width: 1920,
        min_height: 1080,
        skip_hidden: true,
        ..Settings::default()
    };
    settings.save(&path).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("min_width = 1920"));

    let loaded = Settings::load(Some(&path), &SettingsOverrides::default()).unwrap();
    assert_eq!(loaded.min_width, 1920);
    assert_eq!(loaded.min_height, 1080);
    assert!(loaded.skip_hidden);
}
