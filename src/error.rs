//! Error types
//!
//! Only setup can fail. Everything that goes wrong per frame (missing layout,
//! unknown kinds, fish not yet animated) is recovered where it happens.

use thiserror::Error;

/// Fatal setup failures; no frame is ever scheduled after one of these
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("scene container `{id}` not found")]
    MissingContainer { id: String },

    #[error("scene container has unusable bounds {width}x{height}")]
    DegenerateViewport { width: f32, height: f32 },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Configuration could not be parsed or holds out-of-range values
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config value for `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}
