//! Command-line interface smoke tests
//!
//! Run with: `cargo test --test cli`

mod common;

use common::write_jpeg;
use std::path::Path;
use std::process::{Command, Output};

fn mediaflow(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mediaflow"))
        .arg("--config")
        .arg(config)
        .args(args)
        .output()
        .unwrap()
}

fn default_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, mediaflow::DEFAULT_CONFIG).unwrap();
    path
}

#[test]
fn info_reports_classification() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());
    let photo = write_jpeg(dir.path(), "photo.jpg", 40, 30);

    let output = mediaflow(&config, &["info", photo.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("image/jpeg"));
    assert!(stdout.contains("Image"));
    assert!(stdout.contains("img"));
}

#[test]
fn make_with_steps_stores_result() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());
    let photo = write_jpeg(dir.path(), "photo.jpg", 640, 480);
    let out = dir.path().join("small");

    let output = mediaflow(
        &config,
        &[
            "make",
            photo.to_str().unwrap(),
            "--out",
            out.to_str().unwrap(),
            "--step",
            "fit=64,64",
            "--step",
            "convert=image/png",
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let written = image::open(dir.path().join("small.png")).unwrap();
    assert_eq!((written.width(), written.height()), (64, 48));
}

#[test]
fn make_refuses_existing_destination() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());
    let photo = write_jpeg(dir.path(), "photo.jpg", 10, 10);

    let output = mediaflow(
        &config,
        &["make", photo.to_str().unwrap(), "--out", photo.to_str().unwrap()],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
}

#[test]
fn filters_lists_presets() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());

    let output = mediaflow(&config, &["filters", "Image"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Image:"));
    assert!(stdout.contains("fit_crop(100, 100)"));
    assert!(!stdout.contains("Css:"));
}

#[test]
fn filters_report_categories_without_presets() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());

    let output = mediaflow(&config, &["filters", "Audio"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Audio: no presets"));
}

#[test]
fn unknown_filter_category_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = default_config(dir.path());
    let output = mediaflow(&config, &["filters", "Hologram"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown category"));
}
