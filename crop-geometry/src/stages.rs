// SPDX-License-Identifier: MIT
//! # Stage Index and Scale Recurrence
//!
//! A puzzle reveals its image over six stages. Stages 0-4 correspond to
//! successive guess attempts, each less zoomed than the previous; stage 5 is
//! the canonical fully-revealed state and is special-cased by callers rather
//! than fed through the scale recurrence.
//!
//! ## Decay Recurrence
//!
//! The per-stage magnification starts at the puzzle's base zoom and decays by
//! a factor that itself shrinks each iteration:
//!
//! ```text
//! scale = base_zoom
//! reduction = 0.90
//! repeat n times: scale *= reduction; reduction -= 0.025
//! scale = max(scale, 1.0)
//! ```
//!
//! The shrinking factor gives a fast initial zoom-out and a slower final
//! zoom-out. The loop must stay a loop: legacy crop sets were generated with
//! this exact operation order, and a closed-form rewrite would drift in the
//! low bits and break pixel parity with previously published stages.

/// Number of stages per puzzle, including the final reveal.
pub const STAGE_COUNT: usize = 6;

/// Initial per-stage decay factor.
const REDUCTION: f64 = 0.90;

/// Amount the decay factor itself shrinks after each stage.
const PROGRESSION: f64 = 0.025;

/// A guess stage index in `0..=5`.
///
/// Construction is checked, so a `Stage` value is always a valid index into a
/// generated crop set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Stage(u8);

impl Stage {
    /// The fully-revealed terminal stage.
    pub const REVEAL: Stage = Stage(5);

    /// Create a stage from a raw index, rejecting anything outside `0..=5`.
    pub fn new(index: u8) -> Option<Stage> {
        (index < STAGE_COUNT as u8).then_some(Stage(index))
    }

    /// Raw stage index.
    pub fn index(self) -> u8 {
        self.0
    }

    /// Whether this is the full-reveal stage.
    ///
    /// The reveal bypasses the pivot/scale engine: callers render the entire
    /// aspect-normalized image at the delivery resolution instead.
    pub fn is_reveal(self) -> bool {
        self.0 == Self::REVEAL.0
    }

    /// Iterate over all six stages in order.
    pub fn all() -> impl Iterator<Item = Stage> {
        (0..STAGE_COUNT as u8).map(Stage)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Storage key for one generated stage image: `{puzzle_id}/stage_{n}.jpg`.
///
/// This is the stable naming contract shared with the serving layer; consumers
/// fetch by this exact pattern and must not assume any other layout.
pub fn stage_key(puzzle_id: &str, stage: Stage) -> String {
    format!("{puzzle_id}/stage_{}.jpg", stage.index())
}

/// Compute the effective magnification for a stage.
///
/// Applies the decay recurrence `stage.index()` times to `base_zoom` and
/// floors the result at 1.0, so the visible window never exceeds the base
/// image. A non-finite `base_zoom` also collapses to 1.0 via the floor.
///
/// Meaningful for stages 0-4; the reveal stage never reaches this function
/// (callers branch on [`Stage::is_reveal`] first).
///
/// # Arguments
/// * `base_zoom` - Puzzle-configured maximum magnification (typically 1-10)
/// * `stage` - Which guess stage to compute the scale for
pub fn compute_stage_scale(base_zoom: f64, stage: Stage) -> f64 {
    let mut scale = base_zoom;
    let mut reduction = REDUCTION;
    for _ in 0..stage.index() {
        scale *= reduction;
        reduction -= PROGRESSION;
    }
    // f64::max returns the finite operand for NaN input, which doubles as the
    // degenerate-zoom guard.
    scale.max(1.0)
}
