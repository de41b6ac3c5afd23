use std::str::FromStr;

use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Query, State, multipart::MultipartError},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use rapor_core::AppError;
use rapor_models::ids::{AcademicTermId, ClassId, SubjectId, TeacherId};

use crate::modules::grade_exchange::model::{
    ErrorResponse, FinalScoresResponse, GradeScope, ImportGradesForm, ImportOutcome,
};
use crate::modules::grade_exchange::service::GradeExchangeService;
use crate::modules::grade_exchange::store::PgGradeExchangeStore;
use crate::modules::grade_exchange::template::XLSX_CONTENT_TYPE;
use crate::state::AppState;

/// Download the grade-entry template for a class
#[utoipa::path(
    get,
    path = "/api/grades/template",
    summary = "Download grade template",
    params(GradeScope),
    responses(
        (status = 200, description = "Grade template workbook", content_type = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet", body = Vec<u8>),
        (status = 400, description = "Missing or malformed identifiers", body = ErrorResponse),
        (status = 404, description = "Subject, class or term not found, or class has no students", body = ErrorResponse)
    ),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn download_template(
    State(state): State<AppState>,
    Query(scope): Query<GradeScope>,
) -> Result<Response, AppError> {
    let store = PgGradeExchangeStore::new(state.db.clone());
    let file =
        GradeExchangeService::export_template(&store, &state.curriculum_resolver, scope).await?;

    let disposition = format!("attachment; filename=\"{}\"", file.filename);
    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

/// Import grades from a filled-in template
#[utoipa::path(
    post,
    path = "/api/grades/import",
    summary = "Import grade template",
    request_body(content = ImportGradesForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import summary; per-cell failures are listed in `errors`", body = ImportOutcome),
        (status = 400, description = "Missing fields, no file, or unreadable template", body = ErrorResponse),
        (status = 413, description = "Uploaded file too large", body = ErrorResponse)
    ),
    tag = "Grades"
)]
#[instrument(skip(state, multipart))]
pub async fn import_grades(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ImportOutcome>, AppError> {
    let form = ImportForm::read(multipart).await?;
    let scope = form.scope()?;
    let file = form
        .file
        .ok_or_else(|| AppError::bad_request(anyhow!("No file uploaded")))?;

    if file.is_empty() {
        return Err(AppError::bad_request(anyhow!("Uploaded file is empty")));
    }

    let store = PgGradeExchangeStore::new(state.db.clone());
    let outcome = GradeExchangeService::import_grades(&store, scope, file).await?;

    Ok(Json(outcome))
}

/// Final scores recomputed from stored grades
#[utoipa::path(
    get,
    path = "/api/grades/final-scores",
    summary = "Get final scores",
    params(GradeScope),
    responses(
        (status = 200, description = "Final score per enrolled student", body = FinalScoresResponse),
        (status = 400, description = "Missing or malformed identifiers", body = ErrorResponse),
        (status = 404, description = "Subject, class or term not found", body = ErrorResponse)
    ),
    tag = "Grades"
)]
#[instrument(skip(state))]
pub async fn get_final_scores(
    State(state): State<AppState>,
    Query(scope): Query<GradeScope>,
) -> Result<Json<FinalScoresResponse>, AppError> {
    let store = PgGradeExchangeStore::new(state.db.clone());
    let scores = GradeExchangeService::final_scores(&store, scope).await?;
    Ok(Json(scores))
}

/// Raw multipart fields of an import request.
#[derive(Debug, Default)]
struct ImportForm {
    file: Option<Vec<u8>>,
    teacher_id: Option<String>,
    subject_id: Option<String>,
    class_id: Option<String>,
    academic_term_id: Option<String>,
}

impl ImportForm {
    async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = ImportForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.file = Some(bytes.to_vec());
                }
                "teacher_id" => form.teacher_id = Some(text(field).await?),
                "subject_id" => form.subject_id = Some(text(field).await?),
                "class_id" => form.class_id = Some(text(field).await?),
                "academic_term_id" => form.academic_term_id = Some(text(field).await?),
                _ => {}
            }
        }

        Ok(form)
    }

    fn scope(&self) -> Result<GradeScope, AppError> {
        Ok(GradeScope {
            teacher_id: required::<TeacherId>("teacher_id", &self.teacher_id)?,
            subject_id: required::<SubjectId>("subject_id", &self.subject_id)?,
            class_id: required::<ClassId>("class_id", &self.class_id)?,
            academic_term_id: required::<AcademicTermId>(
                "academic_term_id",
                &self.academic_term_id,
            )?,
        })
    }
}

async fn text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field.text().await.map_err(multipart_error)
}

fn required<T: FromStr>(name: &str, value: &Option<String>) -> Result<T, AppError> {
    let value = value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(anyhow!("Missing required field '{}'", name)))?;

    value
        .parse()
        .map_err(|_| AppError::bad_request(anyhow!("Field '{}' is not a valid id", name)))
}

fn multipart_error(err: MultipartError) -> AppError {
    AppError::new(err.status(), anyhow!(err.body_text()))
}
