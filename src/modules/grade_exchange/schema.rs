//! Column schema of the grade-entry workbook.
//!
//! The same [`GradeSchema`] type describes both sides of the exchange:
//!
//! - export: [`GradeSchema::derive`] lays columns out contiguously from the
//!   objective count produced by the curriculum resolver;
//! - import: [`GradeSchema::discover`] rebuilds it from the header row of the
//!   uploaded sheet.
//!
//! The two are derived independently. Only objective ordinals survive the
//! round trip; descriptions are never read back, so a curriculum edit between
//! export and import goes unnoticed as long as the header anchors are intact.

use rapor_models::GradeSlot;
use thiserror::Error;

/// Sheet holding the grade table. Must be present on import.
pub const TEMPLATE_SHEET: &str = "Template Nilai";
/// Reference sheet listing objective descriptions. Never parsed on import.
pub const DESCRIPTION_SHEET: &str = "Deskripsi TP";

/// Informational rows above the table (title, subject, class, term).
pub const METADATA_ROWS: u32 = 4;
/// Zero-based header row; one spacer row separates it from the metadata.
pub const HEADER_ROW: u32 = METADATA_ROWS + 1;
pub const DATA_START_ROW: u32 = HEADER_ROW + 1;

pub const STUDENT_ID_LABEL: &str = "Student ID";
pub const STUDENT_NAME_LABEL: &str = "Student Name";
pub const OBJECTIVE_LABEL_PREFIX: &str = "Objective";
pub const EXAM_LABEL: &str = "Exam Score";
pub const FINAL_LABEL: &str = "Final Score";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    StudentId,
    StudentName,
    /// 1-based objective ordinal
    Objective(u32),
    ExamScore,
    FinalScore,
}

impl ColumnKind {
    pub fn label(&self) -> String {
        match self {
            ColumnKind::StudentId => STUDENT_ID_LABEL.to_string(),
            ColumnKind::StudentName => STUDENT_NAME_LABEL.to_string(),
            ColumnKind::Objective(ordinal) => objective_label(*ordinal),
            ColumnKind::ExamScore => EXAM_LABEL.to_string(),
            ColumnKind::FinalScore => FINAL_LABEL.to_string(),
        }
    }

    /// Grade slot fed by this column, if it is an input column.
    pub fn slot(&self) -> Option<GradeSlot> {
        match self {
            ColumnKind::Objective(ordinal) => Some(GradeSlot::Objective(*ordinal)),
            ColumnKind::ExamScore => Some(GradeSlot::Exam),
            _ => None,
        }
    }
}

pub fn objective_label(ordinal: u32) -> String {
    format!("{} {}", OBJECTIVE_LABEL_PREFIX, ordinal)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaColumn {
    /// Zero-based worksheet column
    pub index: u16,
    pub kind: ColumnKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Uploaded file is not a readable xlsx workbook: {0}")]
    UnreadableWorkbook(String),
    #[error("Sheet '{0}' not found in the uploaded workbook")]
    MissingSheet(String),
    #[error("Header row {0} is empty")]
    MissingHeaderRow(u32),
    #[error("Required column '{0}' not found in the header row")]
    MissingColumn(String),
    #[error("Column '{exam}' must come after '{first_objective}'")]
    ExamBeforeObjectives {
        exam: String,
        first_objective: String,
    },
}

/// Ordered, typed column layout of the grade table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradeSchema {
    columns: Vec<SchemaColumn>,
}

impl GradeSchema {
    /// `[StudentId, StudentName, Objective 1..=N, ExamScore, FinalScore]`
    pub fn derive(objective_count: usize) -> Self {
        let kinds = [ColumnKind::StudentId, ColumnKind::StudentName]
            .into_iter()
            .chain((1..=objective_count as u32).map(ColumnKind::Objective))
            .chain([ColumnKind::ExamScore, ColumnKind::FinalScore]);

        let columns = kinds
            .enumerate()
            .map(|(index, kind)| SchemaColumn {
                index: index as u16,
                kind,
            })
            .collect();

        Self { columns }
    }

    /// Rebuilds the schema from header labels.
    ///
    /// `Student ID`, `Objective 1` and `Exam Score` are required anchors
    /// (exact match after trimming). Every column from `Objective 1` up to the
    /// exam column counts as an objective, numbered by position.
    pub fn discover(headers: &[String]) -> Result<Self, SchemaError> {
        let find = |label: &str| headers.iter().position(|h| h.trim() == label);
        let required = |label: String| find(label.as_str()).ok_or(SchemaError::MissingColumn(label));

        let first_objective_label = objective_label(1);
        let student_id = required(STUDENT_ID_LABEL.to_string())?;
        let first_objective = required(first_objective_label.clone())?;
        let exam = required(EXAM_LABEL.to_string())?;

        if exam <= first_objective {
            return Err(SchemaError::ExamBeforeObjectives {
                exam: EXAM_LABEL.to_string(),
                first_objective: first_objective_label,
            });
        }

        let mut columns = vec![SchemaColumn {
            index: student_id as u16,
            kind: ColumnKind::StudentId,
        }];

        if let Some(name) = find(STUDENT_NAME_LABEL) {
            columns.push(SchemaColumn {
                index: name as u16,
                kind: ColumnKind::StudentName,
            });
        }

        columns.extend(
            (first_objective..exam)
                .enumerate()
                .map(|(offset, index)| SchemaColumn {
                    index: index as u16,
                    kind: ColumnKind::Objective(offset as u32 + 1),
                }),
        );

        columns.push(SchemaColumn {
            index: exam as u16,
            kind: ColumnKind::ExamScore,
        });

        if let Some(final_col) = find(FINAL_LABEL) {
            columns.push(SchemaColumn {
                index: final_col as u16,
                kind: ColumnKind::FinalScore,
            });
        }

        columns.sort_by_key(|c| c.index);
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[SchemaColumn] {
        &self.columns
    }

    pub fn index_of(&self, kind: ColumnKind) -> Option<u16> {
        self.columns
            .iter()
            .find(|c| c.kind == kind)
            .map(|c| c.index)
    }

    pub fn objective_count(&self) -> usize {
        self.objective_columns().count()
    }

    /// (column index, ordinal) of every objective column, left to right.
    pub fn objective_columns(&self) -> impl Iterator<Item = (u16, u32)> + '_ {
        self.columns.iter().filter_map(|c| match c.kind {
            ColumnKind::Objective(ordinal) => Some((c.index, ordinal)),
            _ => None,
        })
    }

    /// Input columns (objectives then exam) in worksheet order.
    pub fn grade_columns(&self) -> impl Iterator<Item = (u16, GradeSlot)> + '_ {
        self.columns
            .iter()
            .filter_map(|c| c.kind.slot().map(|slot| (c.index, slot)))
    }

    pub fn labels(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.kind.label()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_derive_lays_out_columns_in_order() {
        let schema = GradeSchema::derive(3);
        assert_eq!(
            schema.labels(),
            vec![
                "Student ID",
                "Student Name",
                "Objective 1",
                "Objective 2",
                "Objective 3",
                "Exam Score",
                "Final Score"
            ]
        );
        assert_eq!(schema.index_of(ColumnKind::ExamScore), Some(5));
        assert_eq!(schema.index_of(ColumnKind::FinalScore), Some(6));
        assert_eq!(schema.objective_count(), 3);
    }

    #[test]
    fn test_layout_constants() {
        assert_eq!(HEADER_ROW, 5);
        assert_eq!(DATA_START_ROW, 6);
    }

    #[test]
    fn test_discover_matches_derived_schema() {
        let derived = GradeSchema::derive(4);
        let discovered = GradeSchema::discover(&derived.labels()).unwrap();
        assert_eq!(discovered, derived);
    }

    #[test]
    fn test_discover_counts_objectives_between_anchors() {
        let schema = GradeSchema::discover(&headers(&[
            "Student ID",
            "Student Name",
            "Objective 1",
            "Objective 2",
            "Objective 3",
            "Objective 4",
            "Objective 5",
            "Exam Score",
            "Final Score",
        ]))
        .unwrap();

        let objectives: Vec<_> = schema.objective_columns().collect();
        assert_eq!(objectives, vec![(2, 1), (3, 2), (4, 3), (5, 4), (6, 5)]);
        assert_eq!(schema.grade_columns().last(), Some((7, GradeSlot::Exam)));
    }

    #[test]
    fn test_discover_tolerates_relabelled_and_shifted_columns() {
        let schema = GradeSchema::discover(&headers(&[
            "No",
            " Student ID ",
            "Objective 1",
            "TP Tambahan",
            "Exam Score",
        ]))
        .unwrap();

        assert_eq!(schema.index_of(ColumnKind::StudentId), Some(1));
        assert_eq!(schema.index_of(ColumnKind::StudentName), None);
        assert_eq!(
            schema.objective_columns().collect::<Vec<_>>(),
            vec![(2, 1), (3, 2)]
        );
    }

    #[test]
    fn test_discover_requires_anchors() {
        let missing_exam = GradeSchema::discover(&headers(&["Student ID", "Objective 1"]));
        assert_eq!(
            missing_exam,
            Err(SchemaError::MissingColumn("Exam Score".to_string()))
        );

        let missing_id = GradeSchema::discover(&headers(&["NIS", "Objective 1", "Exam Score"]));
        assert_eq!(
            missing_id,
            Err(SchemaError::MissingColumn("Student ID".to_string()))
        );

        let missing_objective = GradeSchema::discover(&headers(&["Student ID", "Exam Score"]));
        assert_eq!(
            missing_objective,
            Err(SchemaError::MissingColumn("Objective 1".to_string()))
        );
    }

    #[test]
    fn test_discover_rejects_exam_before_objectives() {
        let result =
            GradeSchema::discover(&headers(&["Student ID", "Exam Score", "Objective 1"]));
        assert!(matches!(
            result,
            Err(SchemaError::ExamBeforeObjectives { .. })
        ));
    }
}
