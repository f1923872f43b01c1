use std::fs;
use std::path::PathBuf;

use image::{DynamicImage, Rgb, RgbImage};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::ResponseTemplate;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Write a small PNG into a fresh temp dir
#[allow(dead_code)]
pub fn temp_png(name: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let path = temp_dir.path().join(name);
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(48, 32, Rgb([220, 180, 160])));
    img.save_with_format(&path, image::ImageFormat::Png)
        .expect("failed to write png");
    (temp_dir, path)
}

/// A `text/event-stream` response carrying `fragments` then `[DONE]`
#[allow(dead_code)]
pub fn sse_response(fragments: &[&str]) -> ResponseTemplate {
    let mut body = String::new();
    for fragment in fragments {
        body.push_str(&format!("data: {}\n\n", json!({ "text": fragment })));
    }
    body.push_str("data: [DONE]\n\n");
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream")
}

/// Analysis payload as the backend sends it
#[allow(dead_code)]
pub fn analysis_json() -> Value {
    json!({
        "issues": ["acne", "pore", "freckle"],
        "issue_categories": ["trouble"],
        "severity": {"acne": 0.7, "pore": 1.4, "freckle": 0.2},
        "hydration": 55,
        "oil_level": 61,
        "texture": "smooth",
        "skin_tone": "neutral",
        "skin_type": "oily",
        "analyzer": "claude_vision"
    })
}

#[allow(dead_code)]
pub fn weather_json(city: &str) -> Value {
    json!({
        "temp": 18.5,
        "humidity": 62,
        "uvi": 3,
        "description": "Clear",
        "city": city,
        "aqi": 40
    })
}
