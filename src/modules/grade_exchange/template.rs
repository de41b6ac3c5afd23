//! Grade-entry workbook builder.
//!
//! Layout of the `Template Nilai` sheet (zero-based rows):
//!
//! ```text
//! 0  GRADE ENTRY TEMPLATE
//! 1  Subject | <subject>
//! 2  Class   | <class>
//! 3  Term    | <term label> <academic year>
//! 4  (blank)
//! 5  Student ID | Student Name | Objective 1 .. N | Exam Score | Final Score
//! 6+ one row per student
//! ```
//!
//! The final-score cell of every student row holds a formula; objective and
//! exam cells are left empty for the teacher to fill in.

use rapor_models::{ClassContext, Student};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, XlsxError};
use thiserror::Error;

use crate::modules::grade_exchange::curriculum::default_objectives;
use crate::modules::grade_exchange::schema::{
    ColumnKind, DATA_START_ROW, DESCRIPTION_SHEET, GradeSchema, HEADER_ROW, TEMPLATE_SHEET,
    objective_label,
};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const TITLE: &str = "GRADE ENTRY TEMPLATE";

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("no students enrolled in class {0}")]
    NoStudents(String),
    #[error(transparent)]
    Xlsx(#[from] XlsxError),
}

/// Spreadsheet column letters for a zero-based index (0 -> A, 26 -> AA).
pub fn column_name(index: u16) -> String {
    let mut n = index as u32 + 1;
    let mut name = Vec::new();
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        name.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Final-score formula for a zero-based worksheet row.
///
/// Blank when the exam or every objective cell is blank, otherwise
/// `ROUND(AVERAGE(objectives) * 0.7 + exam * 0.3, 2)`.
pub fn final_score_formula(schema: &GradeSchema, row: u32) -> String {
    let excel_row = row + 1;
    let mut objectives = schema.objective_columns().map(|(col, _)| col);
    let first = objectives.next();
    let last = objectives.last().or(first);

    let (Some(first), Some(last), Some(exam)) =
        (first, last, schema.index_of(ColumnKind::ExamScore))
    else {
        return "=\"\"".to_string();
    };

    let range = format!(
        "{}{}:{}{}",
        column_name(first),
        excel_row,
        column_name(last),
        excel_row
    );
    let exam = format!("{}{}", column_name(exam), excel_row);

    format!(
        "=IF(OR({exam}=\"\",COUNT({range})=0),\"\",ROUND(AVERAGE({range})*0.7+{exam}*0.3,2))"
    )
}

/// Renders the template workbook and returns its bytes.
///
/// An empty objective list falls back to the default placeholders.
pub fn build_template(
    context: &ClassContext,
    students: &[Student],
    objectives: &[String],
) -> Result<Vec<u8>, TemplateError> {
    if students.is_empty() {
        return Err(TemplateError::NoStudents(context.class_name.clone()));
    }

    let fallback;
    let objectives = if objectives.is_empty() {
        fallback = default_objectives();
        fallback.as_slice()
    } else {
        objectives
    };

    let schema = GradeSchema::derive(objectives.len());
    let mut workbook = Workbook::new();

    write_grade_sheet(&mut workbook, context, students, &schema)?;
    write_description_sheet(&mut workbook, &schema, objectives)?;

    Ok(workbook.save_to_buffer()?)
}

fn write_grade_sheet(
    workbook: &mut Workbook,
    context: &ClassContext,
    students: &[Student],
    schema: &GradeSchema,
) -> Result<(), XlsxError> {
    let bold = Format::new().set_bold();
    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_border(FormatBorder::Thin)
        .set_background_color(0xD9E1F2);
    let cell = Format::new().set_border(FormatBorder::Thin);
    let score = Format::new()
        .set_border(FormatBorder::Thin)
        .set_align(FormatAlign::Center)
        .set_num_format("0.00");

    let sheet = workbook.add_worksheet();
    sheet.set_name(TEMPLATE_SHEET)?;

    sheet.write_string_with_format(0, 0, TITLE, &bold)?;
    sheet.write_string_with_format(1, 0, "Subject", &bold)?;
    sheet.write_string(1, 1, &context.subject_name)?;
    sheet.write_string_with_format(2, 0, "Class", &bold)?;
    sheet.write_string(2, 1, &context.class_name)?;
    sheet.write_string_with_format(3, 0, "Term", &bold)?;
    sheet.write_string(
        3,
        1,
        format!("{} {}", context.term_label, context.academic_year),
    )?;

    for column in schema.columns() {
        sheet.write_string_with_format(HEADER_ROW, column.index, column.kind.label(), &header)?;
        let width = match column.kind {
            ColumnKind::StudentId => 15.0,
            ColumnKind::StudentName => 32.0,
            _ => 13.0,
        };
        sheet.set_column_width(column.index, width)?;
    }

    let id_col = schema.index_of(ColumnKind::StudentId).unwrap_or(0);
    let name_col = schema.index_of(ColumnKind::StudentName).unwrap_or(1);
    let final_col = schema.index_of(ColumnKind::FinalScore);

    for (offset, student) in students.iter().enumerate() {
        let row = DATA_START_ROW + offset as u32;
        sheet.write_string_with_format(row, id_col, &student.student_id, &cell)?;
        sheet.write_string_with_format(row, name_col, &student.name, &cell)?;

        for (col, _) in schema.grade_columns() {
            sheet.write_blank(row, col, &score)?;
        }

        if let Some(final_col) = final_col {
            sheet.write_formula_with_format(
                row,
                final_col,
                final_score_formula(schema, row).as_str(),
                &score,
            )?;
        }
    }

    sheet.set_freeze_panes(DATA_START_ROW, 2)?;
    Ok(())
}

fn write_description_sheet(
    workbook: &mut Workbook,
    schema: &GradeSchema,
    objectives: &[String],
) -> Result<(), XlsxError> {
    let header = Format::new().set_bold().set_border(FormatBorder::Thin);
    let wrap = Format::new().set_text_wrap();

    let sheet = workbook.add_worksheet();
    sheet.set_name(DESCRIPTION_SHEET)?;

    sheet.write_string_with_format(0, 0, "Objective", &header)?;
    sheet.write_string_with_format(0, 1, "Column", &header)?;
    sheet.write_string_with_format(0, 2, "Description", &header)?;
    sheet.set_column_width(0, 14.0)?;
    sheet.set_column_width(1, 10.0)?;
    sheet.set_column_width(2, 80.0)?;

    for ((col, ordinal), description) in schema.objective_columns().zip(objectives) {
        let row = ordinal;
        sheet.write_string(row, 0, objective_label(ordinal))?;
        sheet.write_string(row, 1, column_name(col))?;
        sheet.write_string_with_format(row, 2, description, &wrap)?;
    }

    Ok(())
}
