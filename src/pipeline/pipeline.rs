//! # Generation Run
//!
//! One generation run turns a puzzle record into six immutable stage images:
//!
//! 1. Fetch and decode the source image (fatal for the run on failure)
//! 2. Cover-crop it to the delivery aspect ratio (the base image)
//! 3. Plan and render every stage into a complete in-memory JPEG
//! 4. Upload all stages concurrently, then report the set valid
//!
//! ## Commit All or Trust None
//!
//! Nothing is written until every stage has rendered successfully, and the
//! run only succeeds once every write has. A run that fails partway may leave
//! some objects behind, but callers must not mark the puzzle as having valid
//! crops until a run returns `Ok`. Stage files are overwritten wholesale on
//! the next attempt, so retrying is always safe. This is an application-level
//! policy, not a transactional guarantee from storage.
//!
//! The base image exists only for the duration of the run; the rendered
//! stage set is the only durable artifact.

use futures_util::future::join_all;
use image::RgbImage;
use tracing::info;

use crop_geometry::{
    FocusPoint, Size, Stage, StagePlan, normalize_to_aspect, plan_stage, stage_key,
};

use crate::config::{GenerateConfig, PuzzleConfig};
use crate::error::CropResult;
use crate::render::{RenderedStage, StageRenderer};
use crate::source::load_source;
use crate::storage::ObjectStore;

/// One persisted stage of a generated set.
#[derive(Debug, Clone)]
pub struct GeneratedStage {
    pub stage: Stage,
    /// Storage key the stage was written under.
    pub key: String,
    /// Final encoded dimensions.
    pub size: Size,
    /// Encoded JPEG size in bytes.
    pub bytes: usize,
}

/// Result of a successful generation run: all six stages, written.
#[derive(Debug, Clone)]
pub struct GeneratedSet {
    pub puzzle_id: String,
    /// Source dimensions before the cover crop.
    pub source: Size,
    /// Base (aspect-normalized) dimensions all stage geometry ran against.
    pub base: Size,
    pub stages: Vec<GeneratedStage>,
}

/// Run crop generation for one puzzle.
///
/// Validates the configuration, executes the full pipeline, and persists
/// every stage under `{puzzle_id}/stage_{n}.jpg` in the given store. Returns
/// an error without a valid set if any step fails; see the module docs for
/// the atomicity policy.
pub async fn generate_crops(
    puzzle: &PuzzleConfig,
    config: &GenerateConfig,
    store: &dyn ObjectStore,
) -> CropResult<GeneratedSet> {
    puzzle.validate()?;
    config.validate()?;

    let source_image = load_source(&puzzle.image_url)
        .await
        .map_err(|e| e.with_puzzle(&puzzle.id))?;
    let source = Size::new(source_image.width(), source_image.height());

    // Aspect-normalize once; every stage window is computed against this.
    let base_rect = normalize_to_aspect(source, config.target_ratio());
    let base_image = source_image
        .crop_imm(base_rect.x, base_rect.y, base_rect.w, base_rect.h)
        .to_rgb8();
    let base = base_rect.size();

    let focus = FocusPoint::parse(&puzzle.transform_origin);
    info!(
        puzzle_id = %puzzle.id,
        source_w = source.w,
        source_h = source.h,
        base_w = base.w,
        base_h = base.h,
        focus_x = focus.x,
        focus_y = focus.y,
        max_zoom = puzzle.max_zoom,
        "starting generation run"
    );

    // Render every stage before the first write so a render failure can
    // never leave a fresher stage_0 next to a stale stage_4.
    let plans: Vec<StagePlan> = Stage::all()
        .map(|stage| plan_stage(base, focus, puzzle.max_zoom, stage, config.target))
        .collect();
    let rendered = render_all(&base_image, &plans, config, &puzzle.id)?;

    // All six renders succeeded; write them concurrently. Any failed write
    // fails the run as a whole.
    let uploads = rendered.iter().map(|stage_image| {
        let key = stage_key(&puzzle.id, stage_image.stage);
        async move {
            store
                .put(&key, &stage_image.jpeg, "image/jpeg")
                .await
                .map(|()| GeneratedStage {
                    stage: stage_image.stage,
                    key,
                    size: stage_image.size,
                    bytes: stage_image.jpeg.len(),
                })
        }
    });

    let mut stages = Vec::with_capacity(rendered.len());
    for result in join_all(uploads).await {
        stages.push(result.map_err(|e| e.with_puzzle(&puzzle.id))?);
    }
    stages.sort_by_key(|s| s.stage);

    info!(
        puzzle_id = %puzzle.id,
        stages = stages.len(),
        destination = %store.describe(),
        "generation run complete"
    );

    Ok(GeneratedSet {
        puzzle_id: puzzle.id.clone(),
        source,
        base,
        stages,
    })
}

fn render_all(
    base_image: &RgbImage,
    plans: &[StagePlan],
    config: &GenerateConfig,
    puzzle_id: &str,
) -> CropResult<Vec<RenderedStage>> {
    let mut renderer = StageRenderer::new(config.jpeg_quality);
    plans
        .iter()
        .map(|plan| {
            renderer
                .render(base_image, plan)
                .map_err(|e| e.with_puzzle(puzzle_id))
        })
        .collect()
}
