// SPDX-License-Identifier: MIT
//! # Crop Plan Computation
//!
//! Rectangle math for the zoom-stage pipeline: cover-crop aspect
//! normalization, pivot-based crop windows, and the output-resolution policy.
//!
//! ## Coordinate Spaces
//!
//! All rectangles are axis-aligned, in integer pixel coordinates of the image
//! they were computed against. [`normalize_to_aspect`] works in source-image
//! space; everything downstream works in base-image space (the source after
//! the cover crop).
//!
//! ## Pivot Formula
//!
//! A CSS `transform: scale(S)` with `transform-origin: (ox, oy)` applied to an
//! element that exactly fills its container maps the container's visible
//! top-left corner back to source coordinate `center - center / S`, i.e.
//! `center * (1 - 1/S)`. [`compute_crop_rect`] reproduces that exactly, not an
//! approximation; any drift here would make server-generated crops disagree
//! with client-side preview tooling built on the same formula.
//!
//! ## Rounding Discipline
//!
//! Floating-point intermediates are rounded to integer pixels once, at the
//! end, and every rounded rectangle is re-clamped into the image bounds. An
//! out-of-bounds rectangle must never reach the pixel-crop step.

use crate::focus::FocusPoint;
use crate::stages::{Stage, compute_stage_scale};

/// Fixed aspect ratio the puzzle viewing frame enforces (3:2).
pub const TARGET_RATIO: f64 = 3.0 / 2.0;

/// Standard delivery width for generated stage images.
pub const TARGET_W: u32 = 900;

/// Standard delivery height for generated stage images.
pub const TARGET_H: u32 = 600;

/// A 2D size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Size {
    pub w: u32,
    pub h: u32,
}

impl Size {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    /// The standard delivery target, 900x600.
    pub fn delivery_target() -> Self {
        Self {
            w: TARGET_W,
            h: TARGET_H,
        }
    }
}

/// An axis-aligned rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    /// The full extent of an image of the given size.
    pub fn full(size: Size) -> Self {
        Self {
            x: 0,
            y: 0,
            w: size.w,
            h: size.h,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            w: self.w,
            h: self.h,
        }
    }

    /// Whether this rectangle lies entirely within an image of `bounds` size.
    pub fn contained_in(&self, bounds: Size) -> bool {
        self.x.checked_add(self.w).is_some_and(|r| r <= bounds.w)
            && self.y.checked_add(self.h).is_some_and(|b| b <= bounds.h)
    }
}

/// How a rendered stage crop should be encoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputPlan {
    /// Encode the crop at its native resolution. Chosen when the crop is
    /// smaller than the delivery target: upscaling would introduce visible
    /// artifacting and the viewing frame downscale-fits in the client anyway.
    Native { out: Size },
    /// Resize (downscale only) to exactly the delivery target before
    /// encoding, bounding bandwidth and storage.
    Downscale { out: Size },
}

impl OutputPlan {
    /// Final encoded dimensions under this policy.
    pub fn out(&self) -> Size {
        match *self {
            OutputPlan::Native { out } | OutputPlan::Downscale { out } => out,
        }
    }
}

/// Complete plan for rendering one stage: which pixels of the base image to
/// crop, and how to encode them.
#[derive(Clone, Copy, Debug)]
pub struct StagePlan {
    /// The stage this plan renders.
    pub stage: Stage,
    /// Effective magnification at this stage (1.0 for the reveal).
    pub scale: f64,
    /// Crop window in base-image pixel coordinates.
    pub crop: Rect,
    /// Encoding policy for the cropped pixels.
    pub output: OutputPlan,
}

/// Cover-crop a source image to a target aspect ratio.
///
/// Returns the maximal centered crop of the source whose dimensions satisfy
/// `w / h == target_ratio`: a source wider than the target loses width, a
/// taller one loses height, an exact match comes back as the identity
/// rectangle. This mirrors the UI behavior of covering (not stretching) a
/// fixed-aspect frame; later pivot math assumes a frame-matching base image.
///
/// Coordinates are rounded to whole pixels and re-clamped so the crop never
/// escapes the source bounds, degenerate (zero-sized) sources included.
pub fn normalize_to_aspect(source: Size, target_ratio: f64) -> Rect {
    if source.w == 0 || source.h == 0 || !target_ratio.is_finite() || target_ratio <= 0.0 {
        return Rect::full(source);
    }

    let w = source.w as f64;
    let h = source.h as f64;
    let source_ratio = w / h;

    if source_ratio > target_ratio {
        // Wider than the frame: crop width, keep full height, center.
        let base_w = ((h * target_ratio).round() as u32).clamp(1, source.w);
        let x = (source.w - base_w) / 2;
        Rect {
            x,
            y: 0,
            w: base_w,
            h: source.h,
        }
    } else if source_ratio < target_ratio {
        // Taller than the frame: crop height, keep full width, center.
        let base_h = ((w / target_ratio).round() as u32).clamp(1, source.h);
        let y = (source.h - base_h) / 2;
        Rect {
            x: 0,
            y,
            w: source.w,
            h: base_h,
        }
    } else {
        Rect::full(source)
    }
}

/// Compute the visible crop window for a given focus point and magnification.
///
/// Pixel-space equivalent of a CSS scale transform pivoting on the focus
/// point: the visible window is `base / scale` in each dimension with its
/// top-left corner at `center * (1 - 1/scale)`, clamped and rounded into the
/// base image.
///
/// A degenerate scale (non-finite or below 1.0) is sanitized to 1.0, which
/// yields the full base image regardless of focus point.
pub fn compute_crop_rect(base: Size, focus: FocusPoint, scale: f64) -> Rect {
    if base.w == 0 || base.h == 0 {
        return Rect::full(base);
    }
    let scale = if scale.is_finite() { scale.max(1.0) } else { 1.0 };

    let bw = base.w as f64;
    let bh = base.h as f64;

    let visible_w = bw / scale;
    let visible_h = bh / scale;
    let center_x = bw * focus.x;
    let center_y = bh * focus.y;

    let mut crop_x = center_x * (1.0 - 1.0 / scale);
    let mut crop_y = center_y * (1.0 - 1.0 / scale);

    // Clamp in float space first so the window stays inside the base image.
    if crop_x < 0.0 {
        crop_x = 0.0;
    }
    if crop_x + visible_w > bw {
        crop_x = bw - visible_w;
    }
    if crop_y < 0.0 {
        crop_y = 0.0;
    }
    if crop_y + visible_h > bh {
        crop_y = bh - visible_h;
    }

    // Round to whole pixels, then re-clamp: rounding alone can push the
    // right/bottom edge one pixel past the image.
    let w = (visible_w.round() as u32).clamp(1, base.w);
    let h = (visible_h.round() as u32).clamp(1, base.h);
    let x = (crop_x.round().max(0.0) as u32).min(base.w - w);
    let y = (crop_y.round().max(0.0) as u32).min(base.h - h);

    Rect { x, y, w, h }
}

/// Decide how a rendered crop should be encoded.
///
/// Strictly-smaller-than-target crops encode at native resolution; everything
/// else downscales to exactly the target. A crop whose width equals the
/// target's takes the downscale branch (a no-op resize), the boundary the
/// serving layer has always shipped, kept deliberately.
pub fn decide_post_processing(visible: Size, target: Size) -> OutputPlan {
    if visible.w < target.w {
        OutputPlan::Native { out: visible }
    } else {
        OutputPlan::Downscale { out: target }
    }
}

/// Build the complete plan for one stage.
///
/// Stages 0-4 run the scale recurrence and pivot window; stage 5 is the
/// terminal full-reveal case and bypasses both, rendering the entire base
/// image at the delivery resolution regardless of its native size.
///
/// # Arguments
/// * `base` - Aspect-normalized base image dimensions
/// * `focus` - Zoom origin, parsed from the puzzle's transform-origin string
/// * `base_zoom` - Puzzle-configured stage-0 magnification
/// * `stage` - Which stage to plan
/// * `target` - Delivery resolution (900x600 in production)
pub fn plan_stage(
    base: Size,
    focus: FocusPoint,
    base_zoom: f64,
    stage: Stage,
    target: Size,
) -> StagePlan {
    if stage.is_reveal() {
        return StagePlan {
            stage,
            scale: 1.0,
            crop: Rect::full(base),
            output: OutputPlan::Downscale { out: target },
        };
    }

    let scale = compute_stage_scale(base_zoom, stage);
    let crop = compute_crop_rect(base, focus, scale);
    let output = decide_post_processing(crop.size(), target);

    StagePlan {
        stage,
        scale,
        crop,
        output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(n: u8) -> Stage {
        Stage::new(n).unwrap()
    }

    #[test]
    fn cover_crop_is_identity_for_matching_ratio() {
        let r = normalize_to_aspect(Size::new(900, 600), TARGET_RATIO);
        assert_eq!(r, Rect::full(Size::new(900, 600)));

        let r = normalize_to_aspect(Size::new(3000, 2000), TARGET_RATIO);
        assert_eq!(r, Rect::full(Size::new(3000, 2000)));
    }

    #[test]
    fn cover_crop_trims_width_of_wide_source() {
        // 3000x1000 (3:1) against 3:2 keeps full height, width = 1000 * 1.5.
        let r = normalize_to_aspect(Size::new(3000, 1000), TARGET_RATIO);
        assert_eq!(
            r,
            Rect {
                x: 750,
                y: 0,
                w: 1500,
                h: 1000
            }
        );
    }

    #[test]
    fn cover_crop_trims_height_of_tall_source() {
        // 1600x1200 (4:3) against 3:2 keeps full width, height = 1600 / 1.5.
        let r = normalize_to_aspect(Size::new(1600, 1200), TARGET_RATIO);
        assert_eq!(r.w, 1600);
        assert_eq!(r.h, 1067);
        assert_eq!(r.x, 0);
        assert_eq!(r.y, 66);
        assert!(r.contained_in(Size::new(1600, 1200)));
    }

    #[test]
    fn cover_crop_handles_degenerate_sources() {
        assert_eq!(
            normalize_to_aspect(Size::new(0, 100), TARGET_RATIO),
            Rect::full(Size::new(0, 100))
        );
        // A 1px-tall strip still yields an in-bounds rect.
        let r = normalize_to_aspect(Size::new(10_000, 1), TARGET_RATIO);
        assert!(r.contained_in(Size::new(10_000, 1)));
        assert!(r.w >= 1 && r.h == 1);
    }

    #[test]
    fn scale_one_covers_the_full_base() {
        for focus in [
            FocusPoint::CENTER,
            FocusPoint::new(0.0, 0.0),
            FocusPoint::new(1.0, 1.0),
            FocusPoint::new(0.3, 0.7),
        ] {
            let r = compute_crop_rect(Size::new(1500, 1000), focus, 1.0);
            assert_eq!(r, Rect::full(Size::new(1500, 1000)));
        }
    }

    #[test]
    fn centered_pivot_centers_the_window() {
        let r = compute_crop_rect(Size::new(1600, 1067), FocusPoint::CENTER, 5.0);
        assert_eq!(r.x, 640);
        assert_eq!(r.y, 427);
        assert_eq!(r.w, 320);
        assert_eq!(r.h, 213);
    }

    #[test]
    fn edge_pivots_stay_in_bounds() {
        let base = Size::new(1500, 1000);
        for ox in [0.0, 1.0] {
            for oy in [0.0, 1.0] {
                for scale in [1.2, 2.0, 5.0, 10.0] {
                    let r = compute_crop_rect(base, FocusPoint::new(ox, oy), scale);
                    assert!(
                        r.contained_in(base),
                        "pivot ({ox},{oy}) scale {scale} escaped: {r:?}"
                    );
                }
            }
        }
        // Pivot at (1,1) pins the window to the bottom-right corner exactly.
        let r = compute_crop_rect(base, FocusPoint::new(1.0, 1.0), 5.0);
        assert_eq!(r.x + r.w, base.w);
        assert_eq!(r.y + r.h, base.h);
    }

    #[test]
    fn degenerate_scale_is_sanitized() {
        let base = Size::new(1500, 1000);
        for s in [0.0, -3.0, 0.4, f64::NAN, f64::INFINITY] {
            let r = compute_crop_rect(base, FocusPoint::CENTER, s);
            assert!(r.contained_in(base), "scale {s} escaped: {r:?}");
            if s.is_nan() || s <= 1.0 {
                assert_eq!(r, Rect::full(base), "scale {s} should give full base");
            }
        }
    }

    #[test]
    fn rounding_never_escapes_awkward_bases() {
        // Odd dimensions and fractional pivots force every rounding path.
        let base = Size::new(1601, 1067);
        for ox in [0.0, 0.13, 0.5, 0.77, 1.0] {
            for oy in [0.0, 0.33, 0.5, 0.91, 1.0] {
                for scale in [1.01, 1.7, 3.3, 9.9] {
                    let r = compute_crop_rect(base, FocusPoint::new(ox, oy), scale);
                    assert!(
                        r.contained_in(base),
                        "({ox},{oy}) @ {scale} escaped: {r:?}"
                    );
                    assert!(r.w >= 1 && r.h >= 1);
                }
            }
        }
    }

    #[test]
    fn resolution_policy_boundary() {
        let target = Size::delivery_target();
        assert_eq!(
            decide_post_processing(Size::new(899, 600), target),
            OutputPlan::Native {
                out: Size::new(899, 600)
            }
        );
        // Equal width takes the downscale (no-op resize) branch.
        assert_eq!(
            decide_post_processing(Size::new(900, 600), target),
            OutputPlan::Downscale { out: target }
        );
        assert_eq!(
            decide_post_processing(Size::new(2400, 1600), target),
            OutputPlan::Downscale { out: target }
        );
    }

    #[test]
    fn reveal_plan_is_full_base_at_delivery_size() {
        let base = Size::new(1600, 1067);
        let plan = plan_stage(
            base,
            FocusPoint::new(0.2, 0.9),
            7.5,
            Stage::REVEAL,
            Size::delivery_target(),
        );
        assert_eq!(plan.scale, 1.0);
        assert_eq!(plan.crop, Rect::full(base));
        assert_eq!(
            plan.output,
            OutputPlan::Downscale {
                out: Size::delivery_target()
            }
        );
    }

    #[test]
    fn end_to_end_reference_scenario() {
        // The canonical 1600x1200 / zoom 5 / "center center" scenario.
        let source = Size::new(1600, 1200);
        let base_rect = normalize_to_aspect(source, TARGET_RATIO);
        assert_eq!((base_rect.w, base_rect.h), (1600, 1067));

        let focus = FocusPoint::parse("center center");
        let plan = plan_stage(
            base_rect.size(),
            focus,
            5.0,
            stage(0),
            Size::delivery_target(),
        );
        assert_eq!(plan.scale, 5.0);
        assert_eq!(
            plan.crop,
            Rect {
                x: 640,
                y: 427,
                w: 320,
                h: 213
            }
        );
        // 320 < 900: stage 0 ships at native resolution.
        assert_eq!(
            plan.output,
            OutputPlan::Native {
                out: Size::new(320, 213)
            }
        );
    }
}
