//! Curriculum (ATP) workbook configuration.
//!
//! Curriculum documents are spreadsheets maintained outside the application.
//! The database stores a path per (subject, phase); relative paths are
//! resolved against [`CurriculumConfig::base_dir`].
//!
//! # Environment Variables
//!
//! - `CURRICULUM_DIR`: Base directory of curriculum workbooks (default: `storage/curriculum`)
//! - `CURRICULUM_SHEET_PREFIX`: Prefix of curriculum sheet names (default: `ATP`)
//! - `CURRICULUM_HEADER_ROW`: Zero-based header row inside curriculum sheets (default: 0)

use std::path::{Path, PathBuf};

use crate::env_or;

#[derive(Clone, Debug)]
pub struct CurriculumConfig {
    pub base_dir: PathBuf,
    pub sheet_prefix: String,
    pub header_row: u32,
}

impl CurriculumConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            base_dir: std::env::var("CURRICULUM_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.base_dir),
            sheet_prefix: std::env::var("CURRICULUM_SHEET_PREFIX")
                .map(|s| s.trim().to_string())
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.sheet_prefix),
            header_row: env_or("CURRICULUM_HEADER_ROW", defaults.header_row),
        }
    }

    /// Resolves a stored document path. Absolute paths are kept as-is.
    pub fn resolve_path(&self, stored: &str) -> PathBuf {
        let path = Path::new(stored);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl Default for CurriculumConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("storage/curriculum"),
            sheet_prefix: "ATP".to_string(),
            header_row: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_path() {
        let config = CurriculumConfig {
            base_dir: PathBuf::from("/srv/atp"),
            ..CurriculumConfig::default()
        };
        assert_eq!(
            config.resolve_path("ipa/fase_b.xlsx"),
            PathBuf::from("/srv/atp/ipa/fase_b.xlsx")
        );
    }

    #[test]
    fn test_resolve_absolute_path() {
        let config = CurriculumConfig::default();
        assert_eq!(
            config.resolve_path("/data/atp.xlsx"),
            PathBuf::from("/data/atp.xlsx")
        );
    }
}
