//! Error types shared across SnapBooth crates.

use std::path::PathBuf;

/// Top-level error type for SnapBooth operations.
#[derive(Debug, thiserror::Error)]
pub enum BoothError {
    #[error("Camera unavailable: {message}")]
    CameraUnavailable { message: String },

    #[error("Capture error: {message}")]
    Capture { message: String },

    #[error("Sequence error: {message}")]
    Sequence { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Image decode error: {message}")]
    ImageDecode { message: String },

    #[error("Export error: {message}")]
    Export { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid value: {message}")]
    Validation { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using BoothError.
pub type BoothResult<T> = Result<T, BoothError>;

impl BoothError {
    pub fn camera_unavailable(msg: impl Into<String>) -> Self {
        Self::CameraUnavailable {
            message: msg.into(),
        }
    }

    pub fn capture(msg: impl Into<String>) -> Self {
        Self::Capture {
            message: msg.into(),
        }
    }

    pub fn sequence(msg: impl Into<String>) -> Self {
        Self::Sequence {
            message: msg.into(),
        }
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render {
            message: msg.into(),
        }
    }

    pub fn image_decode(msg: impl Into<String>) -> Self {
        Self::ImageDecode {
            message: msg.into(),
        }
    }

    pub fn export(msg: impl Into<String>) -> Self {
        Self::Export {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Whether retrying the same phase can succeed without user changes.
    ///
    /// Nothing in the booth is process-fatal; only configuration and
    /// validation problems need different input before a retry.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Config { .. } | Self::Validation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = BoothError::camera_unavailable("no device");
        assert_eq!(err.to_string(), "Camera unavailable: no device");

        let err = BoothError::FileNotFound {
            path: PathBuf::from("/tmp/missing.png"),
        };
        assert_eq!(err.to_string(), "File not found: /tmp/missing.png");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(BoothError::export("disk full").is_retryable());
        assert!(BoothError::image_decode("truncated").is_retryable());
        assert!(!BoothError::validation("caption too long").is_retryable());
    }
}
