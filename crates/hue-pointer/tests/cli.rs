use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

use hue_pointer::{CalibrationSet, CalibrationStore, ColorModel, JsonCalibrationStore};

fn write_calibration(path: &Path) {
    let set = CalibrationSet::new(
        ColorModel::from_bounds([0, 100, 100], [10, 255, 255]),
        ColorModel::from_bounds([100, 100, 100], [140, 255, 255]),
    );
    JsonCalibrationStore::new(path).save(&set).unwrap();
}

/// 64x48 PNG, gray except a 6x6 red blob whose centroid is (16.5, 12.5).
fn write_frame(path: &Path) {
    let mut img = image::RgbImage::from_pixel(64, 48, image::Rgb([40, 40, 40]));
    for y in 10..16 {
        for x in 14..20 {
            img.put_pixel(x, y, image::Rgb([255, 0, 0]));
        }
    }
    img.save(path).unwrap();
}

#[test]
fn track_reports_marker_positions() {
    let dir = tempfile::tempdir().unwrap();
    let calibration = dir.path().join("calibration.json");
    let frame = dir.path().join("frame.png");
    write_calibration(&calibration);
    write_frame(&frame);

    Command::cargo_bin("hue-pointer")
        .unwrap()
        .arg("track")
        .arg("--calibration")
        .arg(&calibration)
        .args(["--screen", "640x480", "--smoothing", "1.0"])
        .arg(&frame)
        .assert()
        .success()
        // Marker A: blob centroid (16.5, 12.5) scaled by 10.
        .stdout(predicate::str::contains("\"valid\": true"))
        .stdout(predicate::str::contains("\"x\": 165"))
        .stdout(predicate::str::contains("\"y\": 125"))
        // Marker B is absent from the frame.
        .stdout(predicate::str::contains("\"valid\": false"));
}

#[test]
fn show_prints_stored_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let calibration = dir.path().join("calibration.json");
    write_calibration(&calibration);

    Command::cargo_bin("hue-pointer")
        .unwrap()
        .arg("show")
        .arg("--calibration")
        .arg(&calibration)
        .assert()
        .success()
        .stdout(predicate::str::contains("hue_min"))
        .stdout(predicate::str::contains("marker_b"));
}

#[test]
fn missing_calibration_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let frame = dir.path().join("frame.png");
    write_frame(&frame);

    Command::cargo_bin("hue-pointer")
        .unwrap()
        .arg("track")
        .arg("--calibration")
        .arg(dir.path().join("absent.json"))
        .arg(&frame)
        .assert()
        .failure();
}
