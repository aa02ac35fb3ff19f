// SPDX-License-Identifier: MIT
//! # crop-geometry: Deterministic Zoom-Stage Crop Geometry
//!
//! This crate computes the crop windows for the daily garage image-zoom puzzles.
//! Given a source image size, a zoom origin, and a per-puzzle maximum zoom, it
//! produces one axis-aligned crop rectangle per guess stage (0..=5) together
//! with an output-resolution policy, so that crops can be pre-generated once on
//! the server and served as static files afterwards.
//!
//! ## Server/Client Parity Contract
//!
//! The pivot math reproduces, pixel for pixel, what a client-side CSS
//! `transform: scale(S)` with a matching `transform-origin` would have shown.
//! Crop sets generated here must stay visually identical to any legacy
//! client-side preview, so the stage-scale recurrence is evaluated as repeated
//! multiplicative decay in `f64` (never a closed-form power) and the pivot
//! formula is the exact pixel-space equivalent of the CSS transform.
//!
//! ## Pipeline
//!
//! 1. [`plan::normalize_to_aspect`] - cover-crop the source to the 3:2 frame
//! 2. [`stages::compute_stage_scale`] - per-stage magnification from the
//!    puzzle's base zoom
//! 3. [`plan::compute_crop_rect`] - visible window around the focus point
//! 4. [`plan::decide_post_processing`] - native vs downscale encoding policy
//!
//! [`plan::plan_stage`] composes all four into one `StagePlan` per stage.
//! Stage 5 is the full reveal and bypasses the pivot engine entirely: the
//! whole aspect-normalized image, always resized to the delivery target.
//!
//! ## Key Components
//!
//! - [`plan`]: rectangle math - cover crop, pivot window, output policy
//! - [`stages`]: stage index type, scale recurrence, storage key contract
//! - [`focus`]: CSS `transform-origin`-style focus point parsing
//!
//! This crate is pure geometry: no pixel operations, no I/O, no allocations
//! beyond the storage-key helper. Pixel execution lives in the `garage-crops`
//! pipeline crate.

pub mod focus;
pub mod plan;
pub mod stages;

pub use focus::FocusPoint;
pub use plan::{
    OutputPlan, Rect, Size, StagePlan, TARGET_H, TARGET_RATIO, TARGET_W, compute_crop_rect,
    decide_post_processing, normalize_to_aspect, plan_stage,
};
pub use stages::{STAGE_COUNT, Stage, compute_stage_scale, stage_key};
