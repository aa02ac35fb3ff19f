//! # Garage Crops Library
//!
//! Crop-generation pipeline for the daily car-guessing puzzles. Given a
//! puzzle's source image, zoom origin, and maximum zoom, it pre-generates the
//! six progressive-reveal stage images and persists them under the stable
//! `{puzzleId}/stage_{n}.jpg` naming contract, so the serving layer streams
//! static bytes and never does geometry per request.
//!
//! ## Architecture
//!
//! The workspace splits into two crates:
//! - `crop-geometry`: pure, synchronous crop math (cover crop, stage scales,
//!   pivot windows, output policy)
//! - this crate: everything with side effects (fetch, decode, render,
//!   encode, and storage), organized as:
//!   - `config`: puzzle records and run settings, with validation
//!   - `source`: source image acquisition (http, file, `data:` URI)
//!   - `render`: crop/resize/encode execution of stage plans
//!   - `storage`: object-store seam with filesystem and HTTP backends
//!   - `pipeline`: the all-or-nothing generation run
//!
//! ## Example
//!
//! ```rust,no_run
//! use garage_crops::{GenerateOptions, generate};
//! use garage_crops::config::PuzzleConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let options = GenerateOptions {
//!     puzzle: PuzzleConfig::new(
//!         "2026-08-30",
//!         "https://cdn.example.com/cars/gt3rs.jpg",
//!         "30% 70%",
//!         5.0,
//!     ),
//!     output: "./crops".to_string(),
//!     token: None,
//!     jpeg_quality: 82,
//! };
//!
//! let set = generate(options).await?;
//! assert_eq!(set.stages.len(), 6);
//! # Ok(())
//! # }
//! ```

use anyhow::Result;

pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod source;
pub mod storage;

pub use error::{CropError, CropResult, Retryable};
pub use pipeline::{GeneratedSet, GeneratedStage, generate_crops};

use config::{GenerateConfig, PuzzleConfig};
use storage::{FsStore, HttpStore, ObjectStore};

/// Options for one generation run.
///
/// This is the high-level surface used by the CLI; library callers who need
/// a custom store can go straight to [`pipeline::generate_crops`].
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// The puzzle to generate crops for.
    pub puzzle: PuzzleConfig,

    /// Destination: an `http(s)` bucket base URL, or a local directory path.
    pub output: String,

    /// Bearer token for HTTP destinations. Ignored for directory outputs.
    pub token: Option<String>,

    /// JPEG quality (1-100) for the encoded stages.
    pub jpeg_quality: u8,
}

/// Run crop generation for a single puzzle.
///
/// Picks the store backend from the output reference (`http(s)://` means the
/// hosted bucket, anything else a local directory) and executes the pipeline
/// with the production delivery target.
pub async fn generate(options: GenerateOptions) -> Result<GeneratedSet> {
    let store = store_for(&options.output, options.token.clone());
    let config = GenerateConfig {
        jpeg_quality: options.jpeg_quality,
        ..GenerateConfig::default()
    };

    let set = generate_crops(&options.puzzle, &config, store.as_ref()).await?;
    Ok(set)
}

/// Choose a store backend for an output reference.
fn store_for(output: &str, token: Option<String>) -> Box<dyn ObjectStore> {
    if output.starts_with("http://") || output.starts_with("https://") {
        Box::new(HttpStore::new(output, token))
    } else {
        Box::new(FsStore::new(output))
    }
}
