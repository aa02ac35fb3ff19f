//! # Source Image Acquisition
//!
//! Fetches and decodes the puzzle's source image. Three reference forms are
//! supported, covering everything the admin dashboard can hand us:
//!
//! - `http://` / `https://` URLs, fetched with `reqwest`
//! - `data:` URIs with base64 payloads, as produced by in-browser uploads
//! - anything else is treated as a local filesystem path
//!
//! Failure anywhere here is fatal for the whole generation run: the pipeline
//! never persists a partial stage set against bytes it could not decode.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::DynamicImage;
use tracing::debug;

use crate::error::{CropError, CropResult};

/// Fetch and decode a source image from any supported reference form.
pub async fn load_source(image_ref: &str) -> CropResult<DynamicImage> {
    let bytes = fetch_bytes(image_ref).await?;
    debug!(image_ref, len = bytes.len(), "fetched source image");
    decode(image_ref, &bytes)
}

/// Fetch raw image bytes for a reference.
async fn fetch_bytes(image_ref: &str) -> CropResult<Vec<u8>> {
    if image_ref.starts_with("http://") || image_ref.starts_with("https://") {
        fetch_http(image_ref).await
    } else if let Some(rest) = image_ref.strip_prefix("data:") {
        decode_data_uri(image_ref, rest)
    } else {
        tokio::fs::read(image_ref)
            .await
            .map_err(|e| CropError::fetch(image_ref, e.to_string()))
    }
}

async fn fetch_http(url: &str) -> CropResult<Vec<u8>> {
    let response = reqwest::get(url)
        .await
        .map_err(|e| CropError::fetch_source(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CropError::fetch(url, format!("HTTP status {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CropError::fetch_source(url, e))?;
    Ok(bytes.to_vec())
}

/// Decode a `data:[<mediatype>][;base64],<payload>` URI.
fn decode_data_uri(image_ref: &str, rest: &str) -> CropResult<Vec<u8>> {
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CropError::fetch(image_ref, "data: URI missing ',' separator"))?;

    if !header.ends_with(";base64") {
        return Err(CropError::fetch(
            image_ref,
            "only base64-encoded data: URIs are supported",
        ));
    }

    BASE64
        .decode(payload.trim())
        .map_err(|e| CropError::fetch(image_ref, format!("invalid base64 payload: {e}")))
}

/// Decode fetched bytes into pixels.
fn decode(image_ref: &str, bytes: &[u8]) -> CropResult<DynamicImage> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| CropError::decode(image_ref, e.to_string()))?;
    if img.width() == 0 || img.height() == 0 {
        return Err(CropError::decode(image_ref, "image has a zero dimension"));
    }
    debug!(
        image_ref,
        width = img.width(),
        height = img.height(),
        "decoded source image"
    );
    Ok(img)
}
