//! Error types for preview capture

use thiserror::Error;

/// Result type alias for capture operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while capturing a preview
#[derive(Error, Debug)]
pub enum Error {
    /// The rasterizer could not be created
    #[error("Rasterizer initialization failed: {0}")]
    InitializationError(String),

    /// The preview region is not mounted
    #[error("Preview region is not available")]
    RegionUnavailable,

    /// A cross-origin image without permissive access headers was drawn
    #[error("Preview contains an unreadable cross-origin image: {0}")]
    TaintedCanvas(String),

    /// Failed to render or encode the preview
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// A newer capture replaced this one before it ran
    #[error("Capture {0} was superseded by a newer request")]
    Superseded(u64),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Malformed data URI
    #[error("Invalid data URI: {0}")]
    DataUriError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Short message suitable for display next to the capture trigger.
    pub fn user_message(&self) -> String {
        match self {
            Error::RegionUnavailable => "The preview is not on screen; nothing to capture.".to_string(),
            Error::TaintedCanvas(_) => {
                "The image host does not allow its image to be captured. Try another image URL.".to_string()
            }
            Error::Superseded(_) => "A newer capture replaced this one.".to_string(),
            other => format!("Could not generate the preview image: {}", other),
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::RenderError(err.to_string())
    }
}
