#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rapor::modules::grade_exchange::curriculum::Phase;
use rapor::modules::grade_exchange::schema::{
    DATA_START_ROW, EXAM_LABEL, FINAL_LABEL, HEADER_ROW, STUDENT_ID_LABEL, STUDENT_NAME_LABEL,
    TEMPLATE_SHEET, objective_label,
};
use rapor::modules::grade_exchange::store::GradeExchangeStore;
use rapor_models::ids::{AcademicTermId, ClassId, GradeId, SubjectId, TeacherId};
use rapor_models::{ClassContext, GradeRecord, GradeScope, GradeSlot, GradeWrite, Student};
use rust_xlsxwriter::Workbook;

/// Grade store backed by memory, with the same upsert identity as the
/// `grades` table. Writes for students outside the roster fail the way a
/// foreign key violation would.
pub struct InMemoryStore {
    pub context: Option<ClassContext>,
    pub students: Vec<Student>,
    pub curriculum_path: Option<String>,
    grades: Mutex<Vec<GradeWrite>>,
    failing_students: HashSet<String>,
    upsert_calls: Mutex<usize>,
}

impl InMemoryStore {
    pub fn new(context: ClassContext, students: Vec<Student>) -> Self {
        Self {
            context: Some(context),
            students,
            curriculum_path: None,
            grades: Mutex::new(Vec::new()),
            failing_students: HashSet::new(),
            upsert_calls: Mutex::new(0),
        }
    }

    pub fn without_context() -> Self {
        Self {
            context: None,
            ..Self::new(class_context(), students())
        }
    }

    pub fn with_curriculum(mut self, path: &str) -> Self {
        self.curriculum_path = Some(path.to_string());
        self
    }

    /// Every write for this student fails with a database error.
    pub fn failing_for(mut self, student_id: &str) -> Self {
        self.failing_students.insert(student_id.to_string());
        self
    }

    pub fn grade(&self, student_id: &str, slot: GradeSlot) -> Option<f64> {
        self.grades
            .lock()
            .unwrap()
            .iter()
            .find(|g| g.student_id == student_id && g.slot == slot)
            .map(|g| g.value)
    }

    pub fn stored(&self) -> Vec<GradeWrite> {
        self.grades.lock().unwrap().clone()
    }

    pub fn grade_count(&self) -> usize {
        self.grades.lock().unwrap().len()
    }

    pub fn upsert_calls(&self) -> usize {
        *self.upsert_calls.lock().unwrap()
    }
}

impl GradeExchangeStore for InMemoryStore {
    async fn class_context(
        &self,
        subject_id: SubjectId,
        class_id: ClassId,
        academic_term_id: AcademicTermId,
    ) -> Result<Option<ClassContext>, sqlx::Error> {
        Ok(self.context.clone().filter(|c| {
            c.subject_id == subject_id
                && c.class_id == class_id
                && c.academic_term_id == academic_term_id
        }))
    }

    async fn enrolled_students(&self, class_id: ClassId) -> Result<Vec<Student>, sqlx::Error> {
        match &self.context {
            Some(c) if c.class_id == class_id => Ok(self.students.clone()),
            _ => Ok(Vec::new()),
        }
    }

    async fn curriculum_document(
        &self,
        _subject_id: SubjectId,
        _phase: Phase,
    ) -> Result<Option<String>, sqlx::Error> {
        Ok(self.curriculum_path.clone())
    }

    async fn upsert_grade(&self, write: &GradeWrite) -> Result<(), sqlx::Error> {
        *self.upsert_calls.lock().unwrap() += 1;

        if self.failing_students.contains(&write.student_id) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        if !self.students.iter().any(|s| s.student_id == write.student_id) {
            return Err(sqlx::Error::RowNotFound);
        }

        let mut grades = self.grades.lock().unwrap();
        match grades
            .iter_mut()
            .find(|g| g.scope == write.scope && g.student_id == write.student_id && g.slot == write.slot)
        {
            Some(existing) => {
                existing.value = write.value;
                existing.note = write.note.clone();
            }
            None => grades.push(write.clone()),
        }
        Ok(())
    }

    async fn grades_for_scope(&self, scope: &GradeScope) -> Result<Vec<GradeRecord>, sqlx::Error> {
        let grades = self.grades.lock().unwrap();
        Ok(grades
            .iter()
            .filter(|g| g.scope == *scope)
            .map(|g| GradeRecord {
                id: GradeId::new(),
                student_id: g.student_id.clone(),
                teacher_id: g.scope.teacher_id,
                subject_id: g.scope.subject_id,
                class_id: g.scope.class_id,
                academic_term_id: g.scope.academic_term_id,
                kind: g.slot.kind(),
                objective_ordinal: g.slot.objective_ordinal().map(|o| o as i32),
                value: g.value,
                note: g.note.clone(),
                recorded_at: Utc::now(),
            })
            .collect())
    }
}

pub fn class_context() -> ClassContext {
    ClassContext {
        subject_id: SubjectId::new(),
        subject_name: "IPAS".to_string(),
        class_id: ClassId::new(),
        class_name: "3A".to_string(),
        academic_term_id: AcademicTermId::new(),
        academic_year: "2024/2025".to_string(),
        term_label: "Ganjil".to_string(),
    }
}

pub fn students() -> Vec<Student> {
    vec![
        Student {
            student_id: "0012".to_string(),
            name: "Ani Lestari".to_string(),
        },
        Student {
            student_id: "0013".to_string(),
            name: "Budi Santoso".to_string(),
        },
        Student {
            student_id: "0014".to_string(),
            name: "Citra Dewi".to_string(),
        },
    ]
}

pub fn scope_for(context: &ClassContext) -> GradeScope {
    GradeScope {
        teacher_id: TeacherId::new(),
        subject_id: context.subject_id,
        class_id: context.class_id,
        academic_term_id: context.academic_term_id,
    }
}

/// Value typed into a grade cell.
#[derive(Debug, Clone)]
pub enum Entry {
    Blank,
    Number(f64),
    Text(&'static str),
}

/// One student row of a filled-in template: id, then objective entries,
/// then the exam entry.
pub struct FilledRow {
    pub student_id: &'static str,
    pub objectives: Vec<Entry>,
    pub exam: Entry,
}

/// Writes a filled-in grade workbook the way a teacher would return it.
pub fn filled_workbook(objective_count: u32, rows: &[FilledRow]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET).unwrap();

    sheet.write_string(0, 0, "GRADE ENTRY TEMPLATE").unwrap();
    sheet.write_string(1, 0, "Subject").unwrap();
    sheet.write_string(1, 1, "IPAS").unwrap();

    let exam_col = 2 + objective_count as u16;
    sheet.write_string(HEADER_ROW, 0, STUDENT_ID_LABEL).unwrap();
    sheet.write_string(HEADER_ROW, 1, STUDENT_NAME_LABEL).unwrap();
    for ordinal in 1..=objective_count {
        sheet
            .write_string(HEADER_ROW, 1 + ordinal as u16, objective_label(ordinal))
            .unwrap();
    }
    sheet.write_string(HEADER_ROW, exam_col, EXAM_LABEL).unwrap();
    sheet.write_string(HEADER_ROW, exam_col + 1, FINAL_LABEL).unwrap();

    for (offset, row) in rows.iter().enumerate() {
        let r = DATA_START_ROW + offset as u32;
        if !row.student_id.is_empty() {
            sheet.write_string(r, 0, row.student_id).unwrap();
        }
        sheet.write_string(r, 1, format!("Student {}", row.student_id)).unwrap();

        let entries = row.objectives.iter().chain(std::iter::once(&row.exam));
        for (i, entry) in entries.enumerate() {
            let col = 2 + i as u16;
            match entry {
                Entry::Blank => {}
                Entry::Number(n) => {
                    sheet.write_number(r, col, *n).unwrap();
                }
                Entry::Text(t) => {
                    sheet.write_string(r, col, *t).unwrap();
                }
            }
        }
    }

    workbook.save_to_buffer().unwrap()
}

/// Workbook whose only sheet has the wrong name.
pub fn workbook_without_template_sheet() -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sheet1").unwrap();
    sheet.write_string(HEADER_ROW, 0, STUDENT_ID_LABEL).unwrap();
    workbook.save_to_buffer().unwrap()
}

/// Curriculum workbook with one sheet named `ATP <subject> Fase <phase>`.
pub fn write_curriculum(path: &Path, sheet_name: &str, rows: &[(&str, u32, &str)]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).unwrap();
    sheet.write_string(0, 0, "No").unwrap();
    sheet.write_string(0, 1, "Learning Objective").unwrap();
    sheet.write_string(0, 2, "Class Level").unwrap();
    sheet.write_string(0, 3, "Term").unwrap();

    for (i, (objective, level, term)) in rows.iter().enumerate() {
        let r = i as u32 + 1;
        sheet.write_number(r, 0, (i + 1) as f64).unwrap();
        sheet.write_string(r, 1, *objective).unwrap();
        sheet.write_number(r, 2, *level as f64).unwrap();
        sheet.write_string(r, 3, *term).unwrap();
    }

    workbook.save(path).unwrap();
}
