use crate::error::{Result, UploadError};
use crate::upload::types::SelectedImage;

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/gif"];
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Client-side checks run before anything is sent.
#[derive(Debug, Clone, Copy)]
pub struct Validator {
    max_size: u64,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl Validator {
    pub fn new(max_size: u64) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn validate<'a>(&self, file: Option<&'a SelectedImage>) -> Result<&'a SelectedImage> {
        let file = file.ok_or(UploadError::NoFileSelected)?;

        let allowed = file
            .mime_type
            .map_or(false, |mime| ALLOWED_MIME_TYPES.contains(&mime));
        if !allowed {
            return Err(UploadError::InvalidFileType {
                mime_type: file.mime_type.map(str::to_string),
            });
        }

        if file.size > self.max_size {
            return Err(UploadError::FileTooLarge {
                size: file.size,
                limit: self.max_size,
            });
        }

        Ok(file)
    }
}
