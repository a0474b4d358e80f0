use crate::utils::file_size::FileSizeUtils;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between picking a file and seeing it in the gallery.
///
/// The `Display` text of each variant is the message shown to the user.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select an image file")]
    NoFileSelected,

    #[error("Invalid file type. Please upload JPG, PNG, or GIF")]
    InvalidFileType { mime_type: Option<String> },

    #[error(
        "File size too large. Please upload an image smaller than {}",
        limit_text(.limit)
    )]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("An error occurred while uploading. Please try again.")]
    Network(#[source] reqwest::Error),

    #[error("Server error: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Server(String),

    #[error("Server is processing the image but sent no image id")]
    MissingImageId,

    #[error("Processing timed out after {attempts} checks. Please try again later.")]
    PollTimeout { attempts: u32 },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl UploadError {
    /// True for failures detected locally, before anything was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::NoFileSelected
                | UploadError::InvalidFileType { .. }
                | UploadError::FileTooLarge { .. }
        )
    }
}

fn limit_text(limit: &u64) -> String {
    FileSizeUtils::format_limit(*limit)
}

pub type Result<T> = std::result::Result<T, UploadError>;
