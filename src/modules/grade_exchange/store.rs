//! Relational store access for the grade exchange.
//!
//! Everything the pipeline reads or writes goes through [`GradeExchangeStore`]
//! so the service can run against PostgreSQL in production and an in-memory
//! store in tests.

use std::future::Future;

use rapor_models::ids::{AcademicTermId, ClassId, SubjectId};
use rapor_models::{ClassContext, GradeRecord, GradeScope, GradeWrite, Student};
use sqlx::PgPool;
use tracing::instrument;

use crate::modules::grade_exchange::curriculum::Phase;

pub trait GradeExchangeStore: Send + Sync {
    /// Subject, class and academic term resolved together. `None` if any is missing.
    fn class_context(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
        academic_term_id: AcademicTermId,
    ) -> impl Future<Output = Result<Option<ClassContext>, sqlx::Error>> + Send;

    /// Students enrolled in the class, in display order.
    fn enrolled_students(
        &self,
        class_id: ClassId,
    ) -> impl Future<Output = Result<Vec<Student>, sqlx::Error>> + Send;

    /// Stored path of the curriculum workbook for (subject, phase).
    fn curriculum_document(
        &self,
        subject_id: SubjectId,
        phase: Phase,
    ) -> impl Future<Output = Result<Option<String>, sqlx::Error>> + Send;

    /// Insert-or-update keyed by the full grade identity tuple.
    fn upsert_grade(
        &self,
        write: &GradeWrite,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;

    fn grades_for_scope(
        &self,
        scope: &GradeScope,
    ) -> impl Future<Output = Result<Vec<GradeRecord>, sqlx::Error>> + Send;
}

#[derive(Clone, Debug)]
pub struct PgGradeExchangeStore {
    db: PgPool,
}

impl PgGradeExchangeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl GradeExchangeStore for PgGradeExchangeStore {
    #[instrument(skip(self))]
    async fn class_context(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
        academic_term_id: AcademicTermId,
    ) -> Result<Option<ClassContext>, sqlx::Error> {
        sqlx::query_as::<_, ClassContext>(
            r#"SELECT
                s.id AS subject_id,
                s.name AS subject_name,
                c.id AS class_id,
                c.name AS class_name,
                t.id AS academic_term_id,
                t.academic_year,
                t.term_label
               FROM subjects s
               CROSS JOIN classes c
               CROSS JOIN academic_terms t
               WHERE s.id = $1 AND c.id = $2 AND t.id = $3"#,
        )
        .bind(subject_id)
        .bind(class_id)
        .bind(academic_term_id)
        .fetch_optional(&self.db)
        .await
    }

    #[instrument(skip(self))]
    async fn enrolled_students(&self, class_id: ClassId) -> Result<Vec<Student>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            r#"SELECT student_id, name
               FROM students
               WHERE class_id = $1
               ORDER BY name ASC, student_id ASC"#,
        )
        .bind(class_id)
        .fetch_all(&self.db)
        .await
    }

    #[instrument(skip(self))]
    async fn curriculum_document(
        &self,
        subject_id: SubjectId,
        phase: Phase,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            "SELECT file_path FROM curriculum_documents WHERE subject_id = $1 AND phase = $2",
        )
        .bind(subject_id)
        .bind(phase.as_str())
        .fetch_optional(&self.db)
        .await
    }

    #[instrument(skip(self, write), fields(student_id = %write.student_id, slot = %write.slot))]
    async fn upsert_grade(&self, write: &GradeWrite) -> Result<(), sqlx::Error> {
        let ordinal = write.slot.objective_ordinal().map(|o| o as i32);

        sqlx::query(
            r#"INSERT INTO grades
                (student_id, teacher_id, subject_id, class_id, academic_term_id, kind, objective_ordinal, value, note, recorded_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW())
               ON CONFLICT (student_id, teacher_id, subject_id, class_id, academic_term_id, kind, (COALESCE(objective_ordinal, 0)))
               DO UPDATE SET value = EXCLUDED.value, note = EXCLUDED.note, recorded_at = EXCLUDED.recorded_at"#,
        )
        .bind(&write.student_id)
        .bind(write.scope.teacher_id)
        .bind(write.scope.subject_id)
        .bind(write.scope.class_id)
        .bind(write.scope.academic_term_id)
        .bind(write.slot.kind().as_str())
        .bind(ordinal)
        .bind(write.value)
        .bind(&write.note)
        .execute(&self.db)
        .await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn grades_for_scope(&self, scope: &GradeScope) -> Result<Vec<GradeRecord>, sqlx::Error> {
        sqlx::query_as::<_, GradeRecord>(
            r#"SELECT id, student_id, teacher_id, subject_id, class_id, academic_term_id, kind, objective_ordinal, value, note, recorded_at
               FROM grades
               WHERE teacher_id = $1 AND subject_id = $2 AND class_id = $3 AND academic_term_id = $4
               ORDER BY student_id ASC, kind DESC, objective_ordinal ASC"#,
        )
        .bind(scope.teacher_id)
        .bind(scope.subject_id)
        .bind(scope.class_id)
        .bind(scope.academic_term_id)
        .fetch_all(&self.db)
        .await
    }
}
