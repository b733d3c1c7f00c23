//! Error types for the simulation core.

use thiserror::Error;

use crate::target::EntityId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
///
/// Errors here are caller contract violations or invalid configuration.
/// Expected gameplay rejections (out of range, insufficient energy, invalid
/// target) are *not* errors; they are [`crate::target::TargetValidation`]
/// values.
#[derive(Debug, Error)]
pub enum GameError {
    /// A protector id was passed that no supply can resolve.
    #[error("Protector not found: {0}")]
    ProtectorNotFound(EntityId),

    /// A target id was passed that no supply can resolve.
    #[error("Target not found: {0}")]
    TargetNotFound(EntityId),

    /// Detection range must strictly exceed attack range so a unit can
    /// acquire a target before it has to close into firing range.
    #[error("Detection range ({detection}) must exceed attack range ({attack})")]
    DetectionRangeNotGreater {
        /// Configured detection range.
        detection: f32,
        /// Configured attack range.
        attack: f32,
    },

    /// A config field that must be positive was zero or negative.
    #[error("Config field '{field}' must be positive, got {value}")]
    NonPositiveConfig {
        /// Name of the offending field.
        field: &'static str,
        /// Value that was rejected.
        value: f64,
    },

    /// A config field was not a finite number.
    #[error("Config field '{field}' must be finite")]
    NonFiniteConfig {
        /// Name of the offending field.
        field: &'static str,
    },
}
