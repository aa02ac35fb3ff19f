//! # Error Handling for Crop Generation
//!
//! Structured error types for the crop-generation pipeline, with enough
//! context to decide whether a failed run should be retried or abandoned.
//!
//! ## Classification
//!
//! The pipeline's failure policy is "commit all or trust none": a puzzle's
//! crop set is only valid once all six stages were written in the same run.
//! Errors therefore split into two families:
//!
//! - **Transient** (`Fetch`, `Storage`, `Io`): the orchestrator may retry the
//!   whole run; nothing about the puzzle configuration is wrong.
//! - **Fatal for the run** (`Config`, `Decode`, `Render`): retrying without
//!   changing the puzzle's source image or settings will fail the same way.
//!
//! The [`Retryable`] trait exposes this split together with suggested delays.

use std::{error::Error as StdError, fmt, time::SystemTime};

use crop_geometry::Stage;

/// Metadata attached to every pipeline error.
#[derive(Debug)]
pub struct ErrorContext {
    /// When the error occurred.
    pub timestamp: SystemTime,
    /// Puzzle being generated, when known.
    pub puzzle_id: Option<String>,
    /// Free-form detail about what the pipeline was doing.
    pub detail: Option<String>,
    /// Whether retrying the run can plausibly succeed.
    pub retryable: bool,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            puzzle_id: None,
            detail: None,
            retryable: false,
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Error type for the crop-generation pipeline.
#[derive(Debug)]
pub enum CropError {
    /// Puzzle or job configuration failed validation.
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// The source image could not be fetched.
    Fetch {
        image_ref: String,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// The fetched bytes could not be decoded as an image.
    Decode {
        image_ref: String,
        reason: String,
        context: ErrorContext,
    },
    /// Cropping, resizing, or encoding a stage failed.
    Render {
        stage: Stage,
        reason: String,
        context: ErrorContext,
    },
    /// A stage could not be written to the object store.
    Storage {
        key: String,
        reason: String,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Local I/O failure, e.g. reading a batch manifest. Store writes report
    /// through [`CropError::Storage`] instead so they carry the object key.
    Io {
        operation: String,
        source: std::io::Error,
        context: ErrorContext,
    },
}

impl CropError {
    /// Create a configuration error.
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a fetch error.
    pub fn fetch(image_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            image_ref: image_ref.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext {
                retryable: true,
                ..ErrorContext::new()
            },
        }
    }

    /// Create a fetch error wrapping an underlying cause.
    pub fn fetch_source(
        image_ref: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Fetch {
            image_ref: image_ref.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
            context: ErrorContext {
                retryable: true,
                ..ErrorContext::new()
            },
        }
    }

    /// Create a decode error. Always fatal for the run.
    pub fn decode(image_ref: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            image_ref: image_ref.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a render error for a specific stage.
    pub fn render(stage: Stage, reason: impl Into<String>) -> Self {
        Self::Render {
            stage,
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a storage error for a specific object key.
    pub fn storage(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Storage {
            key: key.into(),
            reason: reason.into(),
            source: None,
            context: ErrorContext {
                retryable: true,
                ..ErrorContext::new()
            },
        }
    }

    /// Create a storage error wrapping an underlying cause.
    pub fn storage_source(
        key: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            key: key.into(),
            reason: source.to_string(),
            source: Some(Box::new(source)),
            context: ErrorContext {
                retryable: true,
                ..ErrorContext::new()
            },
        }
    }

    /// Create an I/O error.
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
            context: ErrorContext {
                retryable: true,
                ..ErrorContext::new()
            },
        }
    }

    /// Attach the puzzle being generated.
    pub fn with_puzzle(mut self, puzzle_id: impl Into<String>) -> Self {
        self.context_mut().puzzle_id = Some(puzzle_id.into());
        self
    }

    /// Attach free-form detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.context_mut().detail = Some(detail.into());
        self
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Fetch { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Storage { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Fetch { context, .. } => context,
            Self::Decode { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Storage { context, .. } => context,
            Self::Io { context, .. } => context,
        }
    }

    /// Error category as a stable string, used in log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Fetch { .. } => "fetch",
            Self::Decode { .. } => "decode",
            Self::Render { .. } => "render",
            Self::Storage { .. } => "storage",
            Self::Io { .. } => "io",
        }
    }

    /// Whether this error invalidates the puzzle configuration itself, as
    /// opposed to being an environmental hiccup.
    pub fn is_fatal_for_puzzle(&self) -> bool {
        matches!(
            self,
            Self::Config { .. } | Self::Decode { .. } | Self::Render { .. }
        )
    }
}

impl fmt::Display for CropError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CropError::Config {
                field,
                value,
                reason,
                ..
            } => write!(
                f,
                "Configuration error in '{}': {} (value: {})",
                field, reason, value
            ),
            CropError::Fetch {
                image_ref, reason, ..
            } => write!(f, "Failed to fetch source image '{}': {}", image_ref, reason),
            CropError::Decode {
                image_ref, reason, ..
            } => write!(f, "Failed to decode source image '{}': {}", image_ref, reason),
            CropError::Render { stage, reason, .. } => {
                write!(f, "Failed to render stage {}: {}", stage, reason)
            }
            CropError::Storage { key, reason, .. } => {
                write!(f, "Failed to store '{}': {}", key, reason)
            }
            CropError::Io {
                operation, source, ..
            } => {
                write!(f, "I/O error during {}: {}", operation, source)
            }
        }
    }
}

impl StdError for CropError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Fetch {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            Self::Storage {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias for the pipeline.
pub type CropResult<T> = Result<T, CropError>;

/// Trait for errors that can be retried.
pub trait Retryable {
    /// Check if retrying the failed run can plausibly succeed.
    fn is_retryable(&self) -> bool;

    /// Recommended retry delay in milliseconds.
    fn retry_delay_ms(&self) -> Option<u64> {
        None
    }
}

impl Retryable for CropError {
    fn is_retryable(&self) -> bool {
        self.context().retryable
    }

    fn retry_delay_ms(&self) -> Option<u64> {
        match self {
            Self::Fetch { .. } => Some(2000),
            Self::Storage { .. } => Some(1000),
            Self::Io { .. } => Some(100),
            _ => None,
        }
    }
}
