//! # Rapor Config
//!
//! Configuration types for the Rapor API.
//!
//! This crate provides configuration structures loaded from environment variables:
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`curriculum`]: Location and layout of curriculum (ATP) workbooks
//! - [`upload`]: Limits applied to uploaded grade workbooks
//!
//! # Example
//!
//! ```ignore
//! use rapor_config::{CorsConfig, CurriculumConfig, UploadConfig};
//!
//! let cors_config = CorsConfig::from_env();
//! let curriculum_config = CurriculumConfig::from_env();
//! let upload_config = UploadConfig::from_env();
//! ```

pub mod cors;
pub mod curriculum;
pub mod upload;

pub use cors::CorsConfig;
pub use curriculum::CurriculumConfig;
pub use upload::UploadConfig;

/// Reads an environment variable and parses it, falling back to `default`
/// when the variable is unset or malformed.
pub(crate) fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring malformed environment value");
                default
            }
        },
        Err(_) => default,
    }
}
