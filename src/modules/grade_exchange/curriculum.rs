//! Curriculum (ATP) resolution.
//!
//! Learning objectives for a template come from an externally maintained
//! workbook per (subject, phase). Each workbook has one sheet per subject and
//! phase, named `"<prefix> <subject> Fase <phase>"`, whose rows list an
//! objective together with the class level and semester it is taught in.
//!
//! Resolution never fails: any problem is logged and the template falls back
//! to [`default_objectives`].

use std::fmt;
use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};
use rapor_config::CurriculumConfig;
use rapor_models::ClassContext;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::metrics::track_curriculum_fallback;
use crate::modules::grade_exchange::schema::objective_label;
use crate::modules::grade_exchange::store::GradeExchangeStore;

pub const DEFAULT_OBJECTIVE_COUNT: usize = 3;

/// Curriculum phase spanning one to three grade levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Phase {
    pub fn for_grade_level(level: u32) -> Option<Phase> {
        match level {
            1..=2 => Some(Phase::A),
            3..=4 => Some(Phase::B),
            5..=6 => Some(Phase::C),
            7..=9 => Some(Phase::D),
            10 => Some(Phase::E),
            11..=12 => Some(Phase::F),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::A => "A",
            Phase::B => "B",
            Phase::C => "C",
            Phase::D => "D",
            Phase::E => "E",
            Phase::F => "F",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum CurriculumError {
    #[error("class name '{0}' does not start with a grade level")]
    NoGradeLevel(String),
    #[error("grade level {0} has no curriculum phase")]
    NoPhase(u32),
    #[error("no curriculum document registered for phase {0}")]
    NoDocument(Phase),
    #[error("curriculum lookup failed: {0}")]
    Lookup(String),
    #[error("cannot read curriculum workbook: {0}")]
    Unreadable(String),
    #[error("sheet '{0}' not found in curriculum workbook")]
    MissingSheet(String),
    #[error("column '{0}' not found in curriculum header row")]
    MissingColumn(&'static str),
}

impl CurriculumError {
    fn reason(&self) -> &'static str {
        match self {
            CurriculumError::NoGradeLevel(_) | CurriculumError::NoPhase(_) => "no_phase",
            CurriculumError::NoDocument(_) => "no_document",
            CurriculumError::Lookup(_) => "lookup_failed",
            CurriculumError::Unreadable(_) => "unreadable",
            CurriculumError::MissingSheet(_) | CurriculumError::MissingColumn(_) => "bad_layout",
        }
    }
}

/// Placeholder objectives used whenever the curriculum cannot be read.
pub fn default_objectives() -> Vec<String> {
    (1..=DEFAULT_OBJECTIVE_COUNT as u32)
        .map(objective_label)
        .collect()
}

/// Objectives resolved for a template and whether they are the placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedObjectives {
    pub descriptions: Vec<String>,
    pub fallback: bool,
}

impl ResolvedObjectives {
    fn fallback() -> Self {
        Self {
            descriptions: default_objectives(),
            fallback: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CurriculumResolver {
    config: CurriculumConfig,
}

impl CurriculumResolver {
    pub fn new(config: CurriculumConfig) -> Self {
        Self { config }
    }

    pub fn sheet_name(&self, subject_name: &str, phase: Phase) -> String {
        format!(
            "{} {} Fase {}",
            self.config.sheet_prefix,
            subject_name.trim(),
            phase
        )
    }

    /// Ordered objective descriptions for the class context.
    #[instrument(skip(self, store, context), fields(subject = %context.subject_name, class = %context.class_name))]
    pub async fn resolve<S>(&self, store: &S, context: &ClassContext) -> ResolvedObjectives
    where
        S: GradeExchangeStore,
    {
        match self.try_resolve(store, context).await {
            Ok(descriptions) if !descriptions.is_empty() => {
                debug!(count = descriptions.len(), "Resolved curriculum objectives");
                ResolvedObjectives {
                    descriptions,
                    fallback: false,
                }
            }
            Ok(_) => {
                warn!("Curriculum has no objectives for this level and term, using defaults");
                track_curriculum_fallback("empty");
                ResolvedObjectives::fallback()
            }
            Err(e) => {
                warn!(error = %e, "Curriculum unavailable, using default objectives");
                track_curriculum_fallback(e.reason());
                ResolvedObjectives::fallback()
            }
        }
    }

    async fn try_resolve<S>(
        &self,
        store: &S,
        context: &ClassContext,
    ) -> Result<Vec<String>, CurriculumError>
    where
        S: GradeExchangeStore,
    {
        let level = context
            .grade_level()
            .ok_or_else(|| CurriculumError::NoGradeLevel(context.class_name.clone()))?;
        let phase = Phase::for_grade_level(level).ok_or(CurriculumError::NoPhase(level))?;

        let stored_path = store
            .curriculum_document(context.subject_id, phase)
            .await
            .map_err(|e| CurriculumError::Lookup(e.to_string()))?
            .ok_or(CurriculumError::NoDocument(phase))?;

        let path = self.config.resolve_path(&stored_path);
        let sheet_name = self.sheet_name(&context.subject_name, phase);
        let header_row = self.config.header_row;
        let term = context.term_number();

        tokio::task::spawn_blocking(move || {
            read_objectives(&path, &sheet_name, header_row, level, term)
        })
        .await
        .map_err(|e| CurriculumError::Unreadable(e.to_string()))?
    }
}

/// Reads objectives for one grade level and term from a curriculum workbook.
pub fn read_objectives(
    path: &Path,
    sheet_name: &str,
    header_row: u32,
    grade_level: u32,
    term: u8,
) -> Result<Vec<String>, CurriculumError> {
    let mut workbook =
        open_workbook_auto(path).map_err(|e| CurriculumError::Unreadable(e.to_string()))?;

    let actual_name = workbook
        .sheet_names()
        .into_iter()
        .find(|name| name.trim().eq_ignore_ascii_case(sheet_name.trim()))
        .ok_or_else(|| CurriculumError::MissingSheet(sheet_name.to_string()))?;

    let range = workbook
        .worksheet_range(&actual_name)
        .map_err(|e| CurriculumError::Unreadable(e.to_string()))?;

    extract_objectives(&range, header_row, grade_level, term)
}

/// Filters curriculum rows by class level and term, keeping row order.
pub fn extract_objectives(
    range: &Range<Data>,
    header_row: u32,
    grade_level: u32,
    term: u8,
) -> Result<Vec<String>, CurriculumError> {
    let Some((end_row, end_col)) = range.end() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = (0..=end_col)
        .map(|col| cell_text(range.get_value((header_row, col))).to_lowercase())
        .collect();

    let objective_col = find_column(&headers, &["learning objective", "tujuan pembelajaran"])
        .ok_or(CurriculumError::MissingColumn("learning objective"))?;
    let level_col = find_column(&headers, &["class level", "kelas"])
        .ok_or(CurriculumError::MissingColumn("class level"))?;
    let term_col = headers
        .iter()
        .position(|h| h == "term" || h == "semester")
        .map(|i| i as u32)
        .or_else(|| find_column(&headers, &["term", "semester"]))
        .ok_or(CurriculumError::MissingColumn("term"))?;

    let objectives = ((header_row + 1)..=end_row)
        .filter(|&row| cell_number(range.get_value((row, level_col))) == Some(grade_level))
        .filter(|&row| cell_term(range.get_value((row, term_col))) == Some(term))
        .map(|row| cell_text(range.get_value((row, objective_col))))
        .filter(|text| !text.is_empty())
        .collect();

    Ok(objectives)
}

fn find_column(headers: &[String], needles: &[&str]) -> Option<u32> {
    headers
        .iter()
        .position(|h| needles.iter().any(|needle| h.contains(needle)))
        .map(|i| i as u32)
}

fn cell_text(data: Option<&Data>) -> String {
    match data {
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) => crate::modules::grade_exchange::cell::format_number(*f),
        Some(Data::Int(i)) => i.to_string(),
        _ => String::new(),
    }
}

fn cell_number(data: Option<&Data>) -> Option<u32> {
    match data? {
        Data::Int(i) => u32::try_from(*i).ok(),
        Data::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as u32),
        Data::String(s) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

fn cell_term(data: Option<&Data>) -> Option<u8> {
    if let Some(Data::String(s)) = data {
        let label = s.trim().to_lowercase();
        if label.contains("ganjil") {
            return Some(1);
        }
        if label.contains("genap") {
            return Some(2);
        }
    }

    cell_number(data).and_then(|n| u8::try_from(n).ok())
}
