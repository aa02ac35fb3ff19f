//! # Stage Rendering
//!
//! Pixel execution of a [`StagePlan`]: crop the base image, downscale with
//! fast_image_resize (SIMD-accelerated) when the plan says so, and JPEG-encode
//! the result. Each stage is produced as a complete in-memory buffer before
//! anything touches storage, so a stage file is never partially written.
//!
//! The resizer is reused across all six stages of a run; RGB8 in, RGB8 out,
//! with the destination written through a typed fir view the same way the
//! scaling hot path always has been.

use std::io::Cursor;

use fast_image_resize as fir;
use fir::images::{TypedImage, TypedImageRef};
use fir::pixels::U8x3;
use fir::{ResizeOptions, Resizer};
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, imageops};
use tracing::debug;

use crop_geometry::{OutputPlan, Size, Stage, StagePlan};

use crate::error::{CropError, CropResult};

/// One encoded stage image, ready for upload.
#[derive(Debug, Clone)]
pub struct RenderedStage {
    pub stage: Stage,
    /// Final encoded dimensions.
    pub size: Size,
    /// Complete JPEG bytes.
    pub jpeg: Vec<u8>,
}

/// Renders stage plans against a base image.
///
/// Owns the reusable resizer and the encoding quality; one renderer serves a
/// whole generation run.
pub struct StageRenderer {
    resizer: Resizer,
    jpeg_quality: u8,
}

impl StageRenderer {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            resizer: Resizer::new(),
            jpeg_quality,
        }
    }

    /// Render one stage: crop, optionally downscale, encode.
    ///
    /// The plan's crop rectangle is guaranteed in-bounds by the geometry
    /// layer; this function trusts it and will not re-clamp.
    pub fn render(&mut self, base: &RgbImage, plan: &StagePlan) -> CropResult<RenderedStage> {
        let crop = plan.crop;
        let cropped = imageops::crop_imm(base, crop.x, crop.y, crop.w, crop.h).to_image();

        let (out_size, out_image) = match plan.output {
            OutputPlan::Native { out } => (out, cropped),
            OutputPlan::Downscale { out } => (out, self.downscale(plan.stage, &cropped, out)?),
        };

        let jpeg = self.encode_jpeg(plan.stage, &out_image)?;
        debug!(
            stage = plan.stage.index(),
            scale = plan.scale,
            crop_w = crop.w,
            crop_h = crop.h,
            out_w = out_size.w,
            out_h = out_size.h,
            bytes = jpeg.len(),
            "rendered stage"
        );

        Ok(RenderedStage {
            stage: plan.stage,
            size: out_size,
            jpeg,
        })
    }

    /// Downscale a crop to the delivery resolution through typed fir views.
    ///
    /// Also reached when the crop already matches the target (the policy's
    /// no-op-resize branch); fir handles the 1:1 case fine.
    fn downscale(&mut self, stage: Stage, src: &RgbImage, out: Size) -> CropResult<RgbImage> {
        let src_view = TypedImageRef::<U8x3>::from_buffer(src.width(), src.height(), src.as_raw())
            .map_err(|e| CropError::render(stage, format!("source view: {e}")))?;

        let mut dst_buf = vec![0u8; out.w as usize * out.h as usize * 3];
        let mut dst_view = TypedImage::<U8x3>::from_buffer(out.w, out.h, &mut dst_buf)
            .map_err(|e| CropError::render(stage, format!("destination view: {e}")))?;

        let opts = ResizeOptions::new().use_alpha(false);
        self.resizer
            .resize_typed::<U8x3>(&src_view, &mut dst_view, &opts)
            .map_err(|e| CropError::render(stage, format!("resize: {e}")))?;

        RgbImage::from_raw(out.w, out.h, dst_buf)
            .ok_or_else(|| CropError::render(stage, "resized buffer has wrong length"))
    }

    fn encode_jpeg(&self, stage: Stage, img: &RgbImage) -> CropResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut cursor = Cursor::new(&mut out);
        let encoder = JpegEncoder::new_with_quality(&mut cursor, self.jpeg_quality);
        img.write_with_encoder(encoder)
            .map_err(|e| CropError::render(stage, format!("jpeg encode: {e}")))?;
        Ok(out)
    }
}
