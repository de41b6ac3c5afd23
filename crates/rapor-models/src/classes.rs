//! Class context models.
//!
//! A [`ClassContext`] is the (subject, class, academic term) triple that scopes
//! every template export and grade import. It is read from the relational
//! store once per request and never mutated.

use crate::ids::{AcademicTermId, ClassId, SubjectId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Label of the first semester. Any other label maps to term 2.
pub const FIRST_TERM_LABEL: &str = "Ganjil";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassContext {
    pub subject_id: SubjectId,
    pub subject_name: String,
    pub class_id: ClassId,
    /// Class name; its leading digits are the grade level (e.g. "5A" -> 5)
    pub class_name: String,
    pub academic_term_id: AcademicTermId,
    /// Academic year as stored, e.g. "2024/2025"
    pub academic_year: String,
    /// Semester label, e.g. "Ganjil" or "Genap"
    pub term_label: String,
}

impl ClassContext {
    pub fn term_number(&self) -> u8 {
        term_number(&self.term_label)
    }

    pub fn grade_level(&self) -> Option<u32> {
        parse_grade_level(&self.class_name)
    }
}

/// Maps a semester label to 1 or 2.
pub fn term_number(label: &str) -> u8 {
    if label.trim().eq_ignore_ascii_case(FIRST_TERM_LABEL) {
        1
    } else {
        2
    }
}

/// Parses the grade level from the leading digits of a class name.
pub fn parse_grade_level(class_name: &str) -> Option<u32> {
    let digits: String = class_name
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();

    digits.parse().ok()
}

/// Student enrolled in a class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Student {
    /// Stable external identifier (NIS), also the student's login key
    pub student_id: String,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_term_number_is_case_insensitive() {
        assert_eq!(term_number("Ganjil"), 1);
        assert_eq!(term_number("  GANJIL "), 1);
        assert_eq!(term_number("Genap"), 2);
        assert_eq!(term_number(""), 2);
    }

    #[test]
    fn test_parse_grade_level() {
        assert_eq!(parse_grade_level("5A"), Some(5));
        assert_eq!(parse_grade_level(" 12 IPA 1"), Some(12));
        assert_eq!(parse_grade_level("Kelas 3"), None);
        assert_eq!(parse_grade_level(""), None);
    }
}
