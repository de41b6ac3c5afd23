//! Upload limits for the grade import endpoint.
//!
//! # Environment Variables
//!
//! - `MAX_UPLOAD_SIZE_MB`: Maximum accepted request body in megabytes (default: 5)

use crate::env_or;

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub max_upload_size_mb: usize,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            max_upload_size_mb: env_or("MAX_UPLOAD_SIZE_MB", 5),
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 5,
        }
    }
}
