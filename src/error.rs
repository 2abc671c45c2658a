use std::path::Path;
use thiserror::Error;

/// Failures surfaced by the resolution and caching core.
#[derive(Debug, Error)]
pub enum ThumbError {
    /// The remote fetch failed, was cancelled, or yielded no usable byte count.
    #[error("could not transfer \"{url}\": {reason}")]
    Transfer { url: String, reason: String },

    /// Bytes were obtained but did not decode into width, height and format.
    #[error("cannot get size of image \"{source_ref}\"")]
    ImageInfo { source_ref: String },

    #[error("filesystem error at \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("info file \"{path}\" could not be stored: {reason}")]
    InfoFile { path: String, reason: String },

    #[error("thumbnail ratio must be a positive finite number, got {0}")]
    InvalidRatio(f64),
}

impl ThumbError {
    pub fn transfer(url: &str, reason: impl Into<String>) -> Self {
        Self::Transfer {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn image_info(source_ref: &str) -> Self {
        Self::ImageInfo {
            source_ref: source_ref.to_string(),
        }
    }

    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    #[must_use]
    pub fn is_transfer(&self) -> bool {
        matches!(self, Self::Transfer { .. })
    }

    #[must_use]
    pub fn is_image_info(&self) -> bool {
        matches!(self, Self::ImageInfo { .. })
    }
}

pub type Result<T, E = ThumbError> = std::result::Result<T, E>;
