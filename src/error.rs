use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LabError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("A transcode is already in progress on this workbench")]
    Busy,

    #[error("No transcode result to save yet")]
    NoResult,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("HEIC conversion failed: {0}")]
    FormatConversion(String),

    #[error("Invalid compression level: {0}. Must be between 0 and 9")]
    InvalidLevel(u8),

    #[error("Invalid CRF value: {0}. Must be between 0 and 51")]
    InvalidCrf(u8),

    #[error("Invalid image target: {0}")]
    InvalidImageTarget(String),

    #[error("Conflicting options: {0}")]
    ConflictingOptions(String),

    #[error("Unsupported codec: {0}")]
    UnsupportedCodec(String),

    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Toolchain `{program}` is unavailable: {reason}")]
    ToolchainUnavailable { program: String, reason: String },

    #[error("Toolchain run failed: {0}")]
    ToolchainFailed(String),

    #[error("Toolchain timed out after {0:?}")]
    Timeout(Duration),

    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

/// Coarse classification used by the workbench when reporting a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    UserInputMissing,
    FormatConversion,
    Transcoder,
    Busy,
}

impl LabError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LabError::NoFileSelected | LabError::NoResult | LabError::FileNotFound(_) => {
                FailureKind::UserInputMissing
            }
            LabError::FormatConversion(_) => FailureKind::FormatConversion,
            LabError::Busy => FailureKind::Busy,
            _ => FailureKind::Transcoder,
        }
    }
}

pub type Result<T> = std::result::Result<T, LabError>;
