//! Crop-generation pipeline: fetch, plan, render, and persist all six stages.

mod pipeline;

pub use pipeline::{GeneratedSet, GeneratedStage, generate_crops};
