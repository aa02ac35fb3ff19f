//! # Configuration Module
//!
//! Puzzle and job configuration for crop generation. This is the common
//! interface between the CLI, batch manifests exported from the admin
//! dashboard, and the core pipeline.
//!
//! ## Puzzle Record
//!
//! A [`PuzzleConfig`] carries exactly what the admin dashboard stores per
//! daily puzzle:
//!
//! | Field | Type | Description |
//! |-------|------|-------------|
//! | `id` | `String` | Puzzle identifier, becomes the storage key prefix |
//! | `image_url` | `String` | Source image: http(s) URL, file path, or `data:` URI |
//! | `transform_origin` | `String` | CSS-style zoom origin, e.g. `"30% 70%"` |
//! | `max_zoom` | `f64` | Stage-0 magnification, typically 1-10 |
//!
//! ## Job Settings
//!
//! [`GenerateConfig`] holds the run-wide knobs: delivery resolution (900x600
//! in production) and JPEG quality. Both structs validate before a run starts
//! so a bad record fails loudly instead of producing a half-broken crop set.

use serde::Deserialize;

use crop_geometry::{Size, TARGET_H, TARGET_W};

use crate::error::{CropError, CropResult};

/// Per-puzzle visual configuration, as stored by the admin dashboard.
///
/// Regenerating crops is only necessary when one of these fields changes;
/// the generated stage set is keyed solely by `id`.
#[derive(Debug, Clone, Deserialize)]
pub struct PuzzleConfig {
    /// Puzzle identifier. Used verbatim as the storage key prefix, so it must
    /// be non-empty and free of path separators.
    pub id: String,

    /// Where to fetch the source image from. Supports http(s) URLs, local
    /// filesystem paths, and base64 `data:` URIs.
    pub image_url: String,

    /// CSS `transform-origin`-style zoom origin. Malformed values fall back
    /// to center at parse time rather than failing validation; this matches
    /// browser behavior and keeps old records servable.
    #[serde(default = "default_origin")]
    pub transform_origin: String,

    /// Maximum magnification, applied at stage 0. Must be finite and >= 1.
    #[serde(default = "default_zoom")]
    pub max_zoom: f64,
}

fn default_origin() -> String {
    "center".to_string()
}

fn default_zoom() -> f64 {
    5.0
}

impl PuzzleConfig {
    pub fn new(
        id: impl Into<String>,
        image_url: impl Into<String>,
        transform_origin: impl Into<String>,
        max_zoom: f64,
    ) -> Self {
        Self {
            id: id.into(),
            image_url: image_url.into(),
            transform_origin: transform_origin.into(),
            max_zoom,
        }
    }

    /// Validate the record before a generation run.
    pub fn validate(&self) -> CropResult<()> {
        if self.id.is_empty() {
            return Err(CropError::config("id", "", "must not be empty"));
        }
        if self.id.contains('/') || self.id.contains('\\') {
            return Err(CropError::config(
                "id",
                &self.id,
                "must not contain path separators",
            ));
        }
        if self.image_url.is_empty() {
            return Err(CropError::config("image_url", "", "must not be empty"));
        }
        if !self.max_zoom.is_finite() || self.max_zoom < 1.0 {
            return Err(CropError::config(
                "max_zoom",
                self.max_zoom.to_string(),
                "must be a finite value of at least 1",
            ));
        }
        Ok(())
    }
}

/// Run-wide generation settings.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Delivery resolution for downscaled stages. The target's aspect ratio
    /// is also what the source is cover-cropped to.
    pub target: Size,

    /// JPEG quality (1-100) for encoded stage images.
    pub jpeg_quality: u8,
}

impl Default for GenerateConfig {
    /// Production defaults: 900x600 delivery at quality 82.
    fn default() -> Self {
        Self {
            target: Size::new(TARGET_W, TARGET_H),
            jpeg_quality: 82,
        }
    }
}

impl GenerateConfig {
    /// Validate the run settings.
    pub fn validate(&self) -> CropResult<()> {
        if self.target.w == 0 || self.target.h == 0 {
            return Err(CropError::config(
                "target",
                format!("{}x{}", self.target.w, self.target.h),
                "delivery resolution must be non-zero in both dimensions",
            ));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(CropError::config(
                "jpeg_quality",
                self.jpeg_quality.to_string(),
                "must be between 1 and 100",
            ));
        }
        Ok(())
    }

    /// Aspect ratio the source image is cover-cropped to.
    pub fn target_ratio(&self) -> f64 {
        self.target.w as f64 / self.target.h as f64
    }
}

/// Load a batch manifest: a JSON array of puzzle records.
///
/// A missing or unreadable file surfaces as a retryable I/O error; malformed
/// JSON or an empty array rejects the batch outright. Records are validated
/// individually when their runs start, not here.
pub async fn load_manifest(path: &str) -> CropResult<Vec<PuzzleConfig>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CropError::io("read manifest", e).with_detail(path))?;
    let puzzles: Vec<PuzzleConfig> = serde_json::from_str(&raw)
        .map_err(|e| CropError::config("manifest", path, format!("not a puzzle array: {e}")))?;
    if puzzles.is_empty() {
        return Err(CropError::config("manifest", path, "contains no puzzles"));
    }
    Ok(puzzles)
}
