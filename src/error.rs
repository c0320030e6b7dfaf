use std::{io, path::PathBuf};

use thiserror::Error;

/// Everything that can go wrong while packing an atlas or loading one back.
#[derive(Debug, Error)]
pub enum AtlasError {
    /// Sizing parameters or project settings that can't produce an atlas.
    #[error("invalid configuration: {message}")]
    Configuration { message: String },

    /// A section, or an angle a section was required to have, is absent.
    #[error("missing frames in section '{section}': {message}")]
    MissingFrames { section: String, message: String },

    #[error("couldn't decode image {}: {}", .path.display(), .source)]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    /// The manifest describes a grid that doesn't match the atlas it was
    /// loaded with.
    #[error("manifest doesn't match atlas: {message}")]
    ManifestMismatch { message: String },

    #[error("couldn't encode atlas: {message}")]
    Encode { message: String },

    #[error("malformed manifest {}: {}", .path.display(), .source)]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl AtlasError {
    pub(crate) fn configuration<S: Into<String>>(message: S) -> Self {
        AtlasError::Configuration {
            message: message.into(),
        }
    }

    pub(crate) fn missing_frames<S: Into<String>, M: Into<String>>(section: S, message: M) -> Self {
        AtlasError::MissingFrames {
            section: section.into(),
            message: message.into(),
        }
    }

    pub(crate) fn mismatch<S: Into<String>>(message: S) -> Self {
        AtlasError::ManifestMismatch {
            message: message.into(),
        }
    }
}
