//! Error types for the color picker

use thiserror::Error;

/// Errors raised while extracting or averaging a pixel sample
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    /// Averaging method value with no known meaning
    #[error("unsupported averaging method: {0}")]
    UnsupportedMethod(u32),

    /// Sample is empty, has the wrong depth, or the image is too small
    #[error("invalid sample: {0}")]
    InvalidSample(String),
}

/// Result type for sampling operations
pub type SampleResult<T> = Result<T, SampleError>;

/// Errors raised by a picking session or its display backend
#[derive(Debug, Error)]
pub enum PickerError {
    /// The display server could not be reached
    #[error("cannot open display: {0}")]
    DisplayConnect(String),

    /// Another client holds the pointer, or the grab request failed
    #[error("cannot grab pointer: {0}")]
    GrabFailed(String),

    /// The server returned no pixels for the requested region
    #[error("error getting image @({x}, {y})")]
    ImageFetch { x: i32, y: i32 },

    /// The connection broke while waiting for events or replies
    #[error("display connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Sample(#[from] SampleError),

    #[error("cannot write color: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot encode color: {0}")]
    Json(#[from] serde_json::Error),
}

impl PickerError {
    /// Whether the session can skip the current click and keep going
    pub fn is_recoverable(&self) -> bool {
        matches!(self, PickerError::ImageFetch { .. } | PickerError::Sample(_))
    }
}

/// Result type for picker operations
pub type PickerResult<T> = Result<T, PickerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_fetch_message() {
        let err = PickerError::ImageFetch { x: 12, y: -3 };
        assert_eq!(err.to_string(), "error getting image @(12, -3)");
    }

    #[test]
    fn test_recoverable() {
        assert!(PickerError::ImageFetch { x: 0, y: 0 }.is_recoverable());
        assert!(PickerError::Sample(SampleError::UnsupportedMethod(1)).is_recoverable());
        assert!(!PickerError::DisplayConnect("no DISPLAY".into()).is_recoverable());
        assert!(!PickerError::GrabFailed("AlreadyGrabbed".into()).is_recoverable());
    }
}
