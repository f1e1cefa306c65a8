use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Text recognition unavailable: {0}")]
    RecognitionUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScanError {
    /// Recover a typed error that travelled through the pipeline as `anyhow::Error`
    pub fn from_pipeline(err: anyhow::Error) -> Self {
        match err.downcast::<ScanError>() {
            Ok(scan_err) => scan_err,
            Err(other) => match other.downcast::<std::io::Error>() {
                Ok(io) => ScanError::Io(io),
                Err(other) => ScanError::Other(other),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pipeline_keeps_recognition_kind() {
        let err = anyhow::Error::from(ScanError::RecognitionUnavailable("models missing".into()));
        assert!(matches!(
            ScanError::from_pipeline(err),
            ScanError::RecognitionUnavailable(_)
        ));
    }

    #[test]
    fn test_from_pipeline_wraps_unknown_errors() {
        let err = anyhow::anyhow!("something else");
        assert!(matches!(ScanError::from_pipeline(err), ScanError::Other(_)));
    }
}
