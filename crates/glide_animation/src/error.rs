//! Error types for glide_animation

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while driving an animation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnimationError {
    /// A ticker (or a run's sampling interval) was configured with a zero period
    #[error("Ticker interval must be greater than zero, got {0:?}")]
    InvalidTickInterval(Duration),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
