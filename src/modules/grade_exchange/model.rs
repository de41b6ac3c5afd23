//! Grade exchange data models and DTOs.
//!
//! Shared grade and class models live in the `rapor-models` crate; this
//! module re-exports them and adds the request shapes only the HTTP layer
//! needs.

use serde::Serialize;
use utoipa::ToSchema;

pub use rapor_models::classes::*;
pub use rapor_models::grades::*;

/// Multipart body of `POST /api/grades/import`. Documentation only; the
/// handler reads the fields one by one.
#[derive(Debug, Serialize, ToSchema)]
pub struct ImportGradesForm {
    /// Filled-in grade template (.xlsx)
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    #[schema(value_type = String, format = Uuid)]
    pub teacher_id: String,
    #[schema(value_type = String, format = Uuid)]
    pub subject_id: String,
    #[schema(value_type = String, format = Uuid)]
    pub class_id: String,
    #[schema(value_type = String, format = Uuid)]
    pub academic_term_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}
