//! Grade domain models and DTOs.
//!
//! A grade record is identified by the full tuple
//! (student, teacher, subject, class, academic term, kind, objective ordinal).
//! Writes are upserts on that tuple, so replaying an import leaves the store
//! unchanged.

use std::fmt;
use std::str::FromStr;

use crate::ids::{AcademicTermId, ClassId, GradeId, SubjectId, TeacherId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

pub const MIN_GRADE: f64 = 0.0;
pub const MAX_GRADE: f64 = 100.0;
pub const OBJECTIVE_WEIGHT: f64 = 0.7;
pub const EXAM_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum GradeKind {
    /// Learning objective (TP) score
    Objective,
    /// End-of-term exam (UAS) score
    Exam,
}

impl GradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeKind::Objective => "objective",
            GradeKind::Exam => "exam",
        }
    }
}

impl fmt::Display for GradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "objective" => Ok(GradeKind::Objective),
            "exam" => Ok(GradeKind::Exam),
            other => Err(format!("Unknown grade kind: {}", other)),
        }
    }
}

impl TryFrom<String> for GradeKind {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Which grade of a student a value belongs to.
///
/// Objective slots always carry a 1-based ordinal; the exam slot never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GradeSlot {
    Objective(u32),
    Exam,
}

impl GradeSlot {
    pub fn kind(&self) -> GradeKind {
        match self {
            GradeSlot::Objective(_) => GradeKind::Objective,
            GradeSlot::Exam => GradeKind::Exam,
        }
    }

    pub fn objective_ordinal(&self) -> Option<u32> {
        match self {
            GradeSlot::Objective(ordinal) => Some(*ordinal),
            GradeSlot::Exam => None,
        }
    }
}

impl fmt::Display for GradeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GradeSlot::Objective(ordinal) => write!(f, "Objective {}", ordinal),
            GradeSlot::Exam => f.write_str("Exam"),
        }
    }
}

/// Identity parameters shared by export, import and reporting requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct GradeScope {
    /// Teacher issuing the grades
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    pub academic_term_id: AcademicTermId,
}

/// One validated grade ready to be upserted.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeWrite {
    pub scope: GradeScope,
    pub student_id: String,
    pub slot: GradeSlot,
    pub value: f64,
    pub note: Option<String>,
}

/// Persisted grade record.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct GradeRecord {
    pub id: GradeId,
    pub student_id: String,
    pub teacher_id: TeacherId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
    pub academic_term_id: AcademicTermId,
    #[sqlx(try_from = "String")]
    pub kind: GradeKind,
    pub objective_ordinal: Option<i32>,
    pub value: f64,
    pub note: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl GradeRecord {
    pub fn slot(&self) -> Option<GradeSlot> {
        match (self.kind, self.objective_ordinal) {
            (GradeKind::Objective, Some(ordinal)) if ordinal >= 1 => {
                Some(GradeSlot::Objective(ordinal as u32))
            }
            (GradeKind::Exam, None) => Some(GradeSlot::Exam),
            _ => None,
        }
    }
}

/// Summary returned by the grade import endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportOutcome {
    pub message: String,
    /// Number of grade cells written
    pub success: usize,
    /// Number of grade cells rejected or not written
    pub failed: usize,
    /// One human-readable entry per failed cell, in row-major order
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ObjectiveScore {
    pub ordinal: u32,
    pub value: f64,
}

/// Recomputed final score for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StudentFinalScore {
    pub student_id: String,
    pub name: String,
    pub objectives: Vec<ObjectiveScore>,
    pub exam: Option<f64>,
    /// `null` when the exam or every objective score is missing
    pub final_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinalScoresResponse {
    pub data: Vec<StudentFinalScore>,
}

/// `round(0.7 * mean(objectives) + 0.3 * exam, 2)`.
///
/// Undefined when the exam is missing or no objective has a value. The
/// template's final-score formula computes the same thing in the workbook.
pub fn final_score(objectives: &[f64], exam: Option<f64>) -> Option<f64> {
    let exam = exam?;
    if objectives.is_empty() {
        return None;
    }

    let mean = objectives.iter().sum::<f64>() / objectives.len() as f64;
    let raw = mean * OBJECTIVE_WEIGHT + exam * EXAM_WEIGHT;
    Some((raw * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_score_weights_objectives_and_exam() {
        assert_eq!(final_score(&[80.0, 90.0, 70.0], Some(85.0)), Some(81.5));
    }

    #[test]
    fn test_final_score_rounds_to_two_decimals() {
        // mean 77.6667 * 0.7 = 54.3667 + 27 = 81.3667
        assert_eq!(final_score(&[80.0, 78.0, 75.0], Some(90.0)), Some(81.37));
    }

    #[test]
    fn test_final_score_undefined_without_exam_or_objectives() {
        assert_eq!(final_score(&[80.0], None), None);
        assert_eq!(final_score(&[], Some(90.0)), None);
    }

    #[test]
    fn test_slot_kind_and_ordinal() {
        assert_eq!(GradeSlot::Objective(3).kind(), GradeKind::Objective);
        assert_eq!(GradeSlot::Objective(3).objective_ordinal(), Some(3));
        assert_eq!(GradeSlot::Exam.kind(), GradeKind::Exam);
        assert_eq!(GradeSlot::Exam.objective_ordinal(), None);
    }

    #[test]
    fn test_grade_kind_parse() {
        assert_eq!("exam".parse::<GradeKind>(), Ok(GradeKind::Exam));
        assert!("EXAM".parse::<GradeKind>().is_err());
    }
}
