use utoipa::OpenApi;

use crate::modules::grade_exchange::model::{
    ErrorResponse, FinalScoresResponse, GradeScope, ImportGradesForm, ImportOutcome,
    ObjectiveScore, StudentFinalScore,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::grade_exchange::controller::download_template,
        crate::modules::grade_exchange::controller::import_grades,
        crate::modules::grade_exchange::controller::get_final_scores,
    ),
    components(
        schemas(
            GradeScope,
            ImportGradesForm,
            ImportOutcome,
            ObjectiveScore,
            StudentFinalScore,
            FinalScoresResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Grades", description = "Grade template export, import and final scores")
    ),
    info(
        title = "Rapor API",
        version = "0.1.0",
        description = "Spreadsheet-based grade exchange for school report cards.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;
