//! Per-cell results of an import and their aggregation into the summary
//! returned to the client.

use rapor_models::{GradeSlot, ImportOutcome};
use thiserror::Error;

use crate::modules::grade_exchange::cell::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct CellSuccess {
    pub student_id: String,
    pub slot: GradeSlot,
    pub value: f64,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CellFailure {
    #[error("Student {student_id}, {slot}: value '{raw}' {reason}")]
    Invalid {
        student_id: String,
        slot: GradeSlot,
        raw: String,
        reason: ValidationError,
    },
    #[error("Student {student_id}, {slot}: value '{raw}' could not be saved ({reason})")]
    Persistence {
        student_id: String,
        slot: GradeSlot,
        raw: String,
        reason: String,
    },
}

pub type CellResult = Result<CellSuccess, CellFailure>;

/// Folds cell results into counters and readable error lines, in the order
/// they were produced.
#[derive(Debug, Default)]
pub struct ImportAggregator {
    success: usize,
    errors: Vec<String>,
}

impl ImportAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: CellResult) {
        match result {
            Ok(_) => self.success += 1,
            Err(failure) => self.errors.push(failure.to_string()),
        }
    }

    pub fn finish(self) -> ImportOutcome {
        let failed = self.errors.len();
        let message = if failed == 0 {
            format!("Imported {} grades", self.success)
        } else {
            format!(
                "Imported {} grades with {} errors",
                self.success, failed
            )
        };

        ImportOutcome {
            message,
            success: self.success,
            failed,
            errors: self.errors,
        }
    }
}
