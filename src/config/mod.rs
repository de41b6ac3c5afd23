//! Configuration for the Rapor API, loaded from environment variables.
//!
//! The types live in the `rapor-config` crate; see each for variable names
//! and defaults.

pub use rapor_config::{CorsConfig, CurriculumConfig, UploadConfig};
