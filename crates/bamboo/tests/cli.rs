use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn bamboo(config_home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_bamboo"))
        .args(args)
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("BAMBOO_CONFIG")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run bamboo")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "bamboo failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn write_solid(path: &Path, pixel: [u8; 4]) {
    RgbaImage::from_pixel(16, 16, Rgba(pixel))
        .save(path)
        .expect("write test image");
}

#[test]
fn presets_lists_the_table_in_order() {
    let home = TempDir::new().expect("tempdir");
    let out = stdout(&bamboo(home.path(), &["presets"]));
    let names: Vec<&str> = out
        .lines()
        .skip(1)
        .filter_map(|line| line.split_whitespace().next())
        .collect();
    assert_eq!(names, ["Calm", "Breeze", "Windy", "Strong", "Storm"]);
    assert!(out.contains("200"));
}

#[test]
fn select_maps_wind_speed_to_preset() {
    let home = TempDir::new().expect("tempdir");
    for (kmh, expected) in [
        ("0", "Calm"),
        ("2", "Calm"),
        ("12", "Breeze"),
        ("25", "Windy"),
        ("99.5", "Strong"),
        ("200", "Storm"),
        ("250", "Calm"),
    ] {
        let out = stdout(&bamboo(home.path(), &["select", kmh]));
        assert_eq!(out.trim(), expected, "wind speed {kmh}");
    }
}

#[test]
fn still_exports_a_png_at_surface_size() {
    let home = TempDir::new().expect("tempdir");
    let work = TempDir::new().expect("tempdir");
    let foreground = work.path().join("fg.png");
    let background = work.path().join("bg.png");
    let output = work.path().join("frame.png");
    write_solid(&foreground, [255, 255, 255, 255]);
    write_solid(&background, [30, 90, 150, 255]);

    stdout(&bamboo(
        home.path(),
        &[
            "still",
            "--output",
            output.to_str().expect("utf-8 path"),
            "--foreground",
            foreground.to_str().expect("utf-8 path"),
            "--background",
            background.to_str().expect("utf-8 path"),
            "--time",
            "1.5",
        ],
    ));

    let frame = image::open(&output).expect("exported png").to_rgba8();
    assert_eq!(frame.dimensions(), (1200, 800));
    // A white matte is keyed out everywhere, leaving the background.
    assert_eq!(frame.get_pixel(600, 400).0, [30, 90, 150, 255]);
}

#[test]
fn still_reads_assets_and_size_from_the_config_file() {
    let home = TempDir::new().expect("tempdir");
    let work = TempDir::new().expect("tempdir");
    write_solid(&work.path().join("fg.png"), [255, 255, 255, 255]);
    write_solid(&work.path().join("bg.png"), [0, 0, 0, 255]);
    let config = work.path().join("scene.toml");
    std::fs::write(
        &config,
        "version = 1\n[assets]\nforeground = \"fg.png\"\nbackground = \"bg.png\"\n\
         [wind]\npreset = \"storm\"\n[window]\nwidth = 300\n",
    )
    .expect("write config");
    let output = work.path().join("frame.png");

    stdout(&bamboo(
        home.path(),
        &[
            "--config",
            config.to_str().expect("utf-8 path"),
            "still",
            "--output",
            output.to_str().expect("utf-8 path"),
            "--dpr",
            "2",
        ],
    ));

    let frame = image::open(&output).expect("exported png").to_rgba8();
    assert_eq!(frame.dimensions(), (600, 400));
}

#[test]
fn still_without_assets_fails_with_a_hint() {
    let home = TempDir::new().expect("tempdir");
    let work = TempDir::new().expect("tempdir");
    let output = bamboo(
        home.path(),
        &[
            "still",
            "--output",
            work.path().join("frame.png").to_str().expect("utf-8 path"),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--foreground"), "stderr: {stderr}");
}

#[test]
fn invalid_config_is_reported() {
    let home = TempDir::new().expect("tempdir");
    let work = TempDir::new().expect("tempdir");
    let config = work.path().join("scene.toml");
    std::fs::write(&config, "version = 1\n[wind]\npreset = \"calm\"\nspeed_kmh = 3.0\n")
        .expect("write config");
    let output = bamboo(
        home.path(),
        &[
            "--config",
            config.to_str().expect("utf-8 path"),
            "still",
            "--output",
            work.path().join("frame.png").to_str().expect("utf-8 path"),
        ],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("mutually exclusive"), "stderr: {stderr}");
}

#[test]
fn oversized_width_is_rejected_before_rendering() {
    let home = TempDir::new().expect("tempdir");
    let work = TempDir::new().expect("tempdir");
    let frame = work.path().join("frame.png");
    let output = bamboo(
        home.path(),
        &[
            "still",
            "--output",
            frame.to_str().expect("utf-8 path"),
            "--width",
            "1e9",
        ],
    );
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("width must be in (0, 4096]"), "stderr: {stderr}");
    assert!(!frame.exists());
}
