pub mod auto;
pub mod cache;
pub mod ip_api;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::coordinate::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    /// Advisory. Sources that cannot do better than a coarse fix ignore it.
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest fix a source may hand back instead of taking a new one.
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(15),
            maximum_age: Duration::from_secs(300),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PositionError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location unavailable: {0}")]
    Unavailable(String),

    #[error("location request timed out")]
    Timeout,
}

impl PositionError {
    /// Short text for the user. A denied permission is the user's choice
    /// and gets no message.
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            PositionError::PermissionDenied => None,
            PositionError::Unavailable(_) => Some("Location information is unavailable."),
            PositionError::Timeout => Some("Location request timed out."),
        }
    }
}

#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, options: &PositionOptions)
    -> Result<Coordinate, PositionError>;
}

/// Always reports the same configured position, or a denial when none is
/// configured.
#[derive(Debug, Clone, Default)]
pub struct FixedPositionSource {
    position: Option<Coordinate>,
}

impl FixedPositionSource {
    pub fn new(position: Option<Coordinate>) -> Self {
        Self { position }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, PositionError> {
        self.position.ok_or(PositionError::PermissionDenied)
    }
}
