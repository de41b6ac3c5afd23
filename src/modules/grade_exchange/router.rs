use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::state::AppState;

use super::controller::{download_template, get_final_scores, import_grades};

/// Initialize the grades router
/// Routes: GET /template, POST /import, GET /final-scores
pub fn init_grades_router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/template", get(download_template))
        .route(
            "/import",
            post(import_grades).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/final-scores", get(get_final_scores))
}
