//! # Rapor Models
//!
//! Domain models and DTOs for the Rapor API.
//!
//! # Modules
//!
//! - [`ids`]: Strongly-typed UUID newtypes
//! - [`classes`]: Class context and enrolled students
//! - [`grades`]: Grade records, write requests, import summaries
//!
//! # Example
//!
//! ```ignore
//! use rapor_models::grades::{final_score, GradeSlot};
//!
//! assert_eq!(final_score(&[80.0, 90.0, 70.0], Some(85.0)), Some(81.5));
//! ```

pub mod classes;
pub mod grades;
pub mod ids;

pub use classes::{ClassContext, FIRST_TERM_LABEL, Student, parse_grade_level, term_number};
pub use grades::{
    FinalScoresResponse, GradeKind, GradeRecord, GradeScope, GradeSlot, GradeWrite,
    ImportOutcome, ObjectiveScore, StudentFinalScore, final_score,
};
