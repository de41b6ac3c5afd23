use std::collections::HashMap;

use anyhow::anyhow;
use rapor_core::AppError;
use rapor_models::{
    ClassContext, FinalScoresResponse, GradeRecord, GradeScope, GradeSlot, GradeWrite,
    ImportOutcome, ObjectiveScore, StudentFinalScore, final_score,
};
use tracing::{info, instrument, warn};

use crate::metrics::{track_grade_import, track_template_exported};
use crate::modules::grade_exchange::cell::{CellVerdict, RawCell, validate_cell};
use crate::modules::grade_exchange::curriculum::CurriculumResolver;
use crate::modules::grade_exchange::filename::compose_filename;
use crate::modules::grade_exchange::outcome::{
    CellFailure, CellResult, CellSuccess, ImportAggregator,
};
use crate::modules::grade_exchange::parser::{ParsedRow, parse_workbook};
use crate::modules::grade_exchange::store::GradeExchangeStore;
use crate::modules::grade_exchange::template::{TemplateError, build_template};

/// Note attached to every grade written by an import.
pub const IMPORT_NOTE: &str = "Imported from grade template";

/// Rendered template ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct GradeExchangeService;

impl GradeExchangeService {
    /// Builds the grade-entry workbook for a class.
    #[instrument(skip(store, resolver))]
    pub async fn export_template<S>(
        store: &S,
        resolver: &CurriculumResolver,
        scope: GradeScope,
    ) -> Result<TemplateFile, AppError>
    where
        S: GradeExchangeStore,
    {
        let context = Self::class_context(store, &scope).await?;

        let students = store.enrolled_students(scope.class_id).await?;
        if students.is_empty() {
            return Err(AppError::not_found(anyhow!(
                "No students enrolled in class {}",
                context.class_name
            )));
        }

        let objectives = resolver.resolve(store, &context).await;

        let bytes = build_template(&context, &students, &objectives.descriptions).map_err(
            |e| match e {
                TemplateError::NoStudents(class) => {
                    AppError::not_found(anyhow!("No students enrolled in class {}", class))
                }
                TemplateError::Xlsx(e) => AppError::internal(e),
            },
        )?;

        let filename = compose_filename(
            &context.subject_name,
            &context.class_name,
            &context.term_label,
            &context.academic_year,
        );

        track_template_exported(objectives.descriptions.len(), objectives.fallback);
        info!(
            filename = %filename,
            students = students.len(),
            objectives = objectives.descriptions.len(),
            fallback = objectives.fallback,
            "Grade template exported"
        );

        Ok(TemplateFile { filename, bytes })
    }

    /// Applies a filled-in template to the store.
    ///
    /// Unreadable workbooks and missing anchors reject the whole upload with
    /// nothing written. Past that point every grade cell is handled on its
    /// own: blanks are skipped, invalid values and failed writes are reported,
    /// and the rest are upserted in row order.
    #[instrument(skip(store, bytes), fields(size = bytes.len()))]
    pub async fn import_grades<S>(
        store: &S,
        scope: GradeScope,
        bytes: Vec<u8>,
    ) -> Result<ImportOutcome, AppError>
    where
        S: GradeExchangeStore,
    {
        let parsed = tokio::task::spawn_blocking(move || parse_workbook(&bytes))
            .await
            .map_err(AppError::internal)?;

        let sheet = match parsed {
            Ok(sheet) => sheet,
            Err(e) => {
                warn!(error = %e, "Rejected grade upload");
                track_grade_import(0, 0, true);
                return Err(AppError::bad_request(e));
            }
        };

        let mut aggregator = ImportAggregator::new();
        for row in &sheet.rows {
            Self::import_row(store, &scope, row, &mut aggregator).await;
        }

        let outcome = aggregator.finish();
        track_grade_import(outcome.success, outcome.failed, false);
        info!(
            rows = sheet.rows.len(),
            objectives = sheet.schema.objective_count(),
            success = outcome.success,
            failed = outcome.failed,
            "Grade import finished"
        );

        Ok(outcome)
    }

    async fn import_row<S>(
        store: &S,
        scope: &GradeScope,
        row: &ParsedRow,
        aggregator: &mut ImportAggregator,
    ) where
        S: GradeExchangeStore,
    {
        for (slot, raw) in &row.cells {
            let value = match validate_cell(raw) {
                CellVerdict::Skip => continue,
                CellVerdict::Valid(value) => value,
                CellVerdict::Invalid(reason) => {
                    aggregator.record(Err(CellFailure::Invalid {
                        student_id: row.student_id.clone(),
                        slot: *slot,
                        raw: raw.to_string(),
                        reason,
                    }));
                    continue;
                }
            };

            let result =
                Self::write_cell(store, scope, &row.student_id, *slot, raw, value).await;
            aggregator.record(result);
        }
    }

    async fn write_cell<S>(
        store: &S,
        scope: &GradeScope,
        student_id: &str,
        slot: GradeSlot,
        raw: &RawCell,
        value: f64,
    ) -> CellResult
    where
        S: GradeExchangeStore,
    {
        let write = GradeWrite {
            scope: *scope,
            student_id: student_id.to_string(),
            slot,
            value,
            note: Some(IMPORT_NOTE.to_string()),
        };

        match store.upsert_grade(&write).await {
            Ok(()) => Ok(CellSuccess {
                student_id: write.student_id,
                slot,
                value,
            }),
            Err(e) => {
                warn!(student_id, %slot, error = %e, "Failed to save grade");
                Err(CellFailure::Persistence {
                    student_id: write.student_id,
                    slot,
                    raw: raw.to_string(),
                    reason: persistence_reason(&e),
                })
            }
        }
    }

    /// Final scores of every enrolled student, recomputed from stored grades.
    #[instrument(skip(store))]
    pub async fn final_scores<S>(
        store: &S,
        scope: GradeScope,
    ) -> Result<FinalScoresResponse, AppError>
    where
        S: GradeExchangeStore,
    {
        Self::class_context(store, &scope).await?;

        let students = store.enrolled_students(scope.class_id).await?;
        let records = store.grades_for_scope(&scope).await?;

        let mut by_student: HashMap<&str, Vec<&GradeRecord>> = HashMap::new();
        for record in &records {
            by_student
                .entry(record.student_id.as_str())
                .or_default()
                .push(record);
        }

        let data = students
            .into_iter()
            .map(|student| {
                let records = by_student
                    .get(student.student_id.as_str())
                    .map(Vec::as_slice)
                    .unwrap_or_default();

                let mut objectives: Vec<ObjectiveScore> = Vec::new();
                let mut exam = None;
                for record in records {
                    match record.slot() {
                        Some(GradeSlot::Objective(ordinal)) => objectives.push(ObjectiveScore {
                            ordinal,
                            value: record.value,
                        }),
                        Some(GradeSlot::Exam) => exam = Some(record.value),
                        None => {}
                    }
                }
                objectives.sort_by_key(|o| o.ordinal);

                let values: Vec<f64> = objectives.iter().map(|o| o.value).collect();
                StudentFinalScore {
                    student_id: student.student_id,
                    name: student.name,
                    final_score: final_score(&values, exam),
                    objectives,
                    exam,
                }
            })
            .collect();

        Ok(FinalScoresResponse { data })
    }

    async fn class_context<S>(store: &S, scope: &GradeScope) -> Result<ClassContext, AppError>
    where
        S: GradeExchangeStore,
    {
        store
            .class_context(scope.subject_id, scope.class_id, scope.academic_term_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found(anyhow!("Subject, class or academic term not found"))
            })
    }
}

/// Client-facing reason for a failed write. Constraint violations name the
/// constraint; anything else is reported generically and logged in full.
fn persistence_reason(error: &sqlx::Error) -> String {
    match error {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
            "student, subject, class or term is not registered".to_string()
        }
        sqlx::Error::Database(db) if db.is_check_violation() => {
            "value rejected by the database".to_string()
        }
        _ => "database error".to_string(),
    }
}
