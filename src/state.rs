use sqlx::PgPool;

use crate::config::{CorsConfig, CurriculumConfig, UploadConfig};
use crate::modules::grade_exchange::curriculum::CurriculumResolver;

#[derive(Clone, Debug)]
pub struct AppState {
    pub db: PgPool,
    pub cors_config: CorsConfig,
    pub upload_config: UploadConfig,
    pub curriculum_resolver: CurriculumResolver,
}

impl AppState {
    pub fn new(db: PgPool) -> Self {
        Self {
            db,
            cors_config: CorsConfig::from_env(),
            upload_config: UploadConfig::from_env(),
            curriculum_resolver: CurriculumResolver::new(CurriculumConfig::from_env()),
        }
    }
}
