//! Common test utilities for the garage-crops integration tests.

use std::path::Path;

use image::{DynamicImage, RgbImage};

use garage_crops::config::PuzzleConfig;

/// Build a deterministic gradient test image of the given size.
pub fn test_image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([(x % 251) as u8, (y % 241) as u8, ((x * 7 + y * 3) % 255) as u8])
    }))
}

/// Write a test image as PNG and return its path as a string reference.
pub fn write_test_image(dir: &Path, name: &str, w: u32, h: u32) -> String {
    let path = dir.join(name);
    test_image(w, h)
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("writing test image");
    path.to_str().expect("utf8 path").to_string()
}

/// Standard puzzle record pointing at a local test image.
pub fn puzzle(id: &str, image_ref: String, origin: &str, zoom: f64) -> PuzzleConfig {
    PuzzleConfig::new(id, image_ref, origin, zoom)
}

/// Decode a written stage file and return its dimensions.
pub fn stage_dimensions(root: &Path, puzzle_id: &str, stage: u8) -> (u32, u32) {
    let path = root.join(format!("{puzzle_id}/stage_{stage}.jpg"));
    let bytes = std::fs::read(&path).unwrap_or_else(|e| panic!("reading {path:?}: {e}"));
    let img = image::load_from_memory(&bytes).expect("stage file should be a decodable JPEG");
    (img.width(), img.height())
}
