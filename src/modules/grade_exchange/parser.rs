//! Reads a filled-in template back into per-student grade cells.

use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx, open_workbook_from_rs};
use rapor_models::GradeSlot;

use crate::modules::grade_exchange::cell::{RawCell, format_number};
use crate::modules::grade_exchange::schema::{
    ColumnKind, DATA_START_ROW, GradeSchema, HEADER_ROW, SchemaError, TEMPLATE_SHEET,
};

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRow {
    /// Zero-based worksheet row
    pub row: u32,
    pub student_id: String,
    /// One entry per grade column, in worksheet order
    pub cells: Vec<(GradeSlot, RawCell)>,
}

#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub schema: GradeSchema,
    pub rows: Vec<ParsedRow>,
}

/// Parses an uploaded workbook.
///
/// Fails as a whole only when the workbook, the grade sheet or the header
/// anchors cannot be read. Rows with a blank student id are dropped here;
/// cell values are left unvalidated.
pub fn parse_workbook(bytes: &[u8]) -> Result<ParsedSheet, SchemaError> {
    let mut workbook = open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes.to_vec()))
        .map_err(|e| SchemaError::UnreadableWorkbook(e.to_string()))?;

    let sheet_name = workbook
        .sheet_names()
        .into_iter()
        .find(|name| name.trim().eq_ignore_ascii_case(TEMPLATE_SHEET))
        .ok_or_else(|| SchemaError::MissingSheet(TEMPLATE_SHEET.to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| SchemaError::UnreadableWorkbook(e.to_string()))?;

    parse_range(&range)
}

pub fn parse_range(range: &Range<Data>) -> Result<ParsedSheet, SchemaError> {
    let headers = header_labels(range);
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SchemaError::MissingHeaderRow(HEADER_ROW));
    }

    let schema = GradeSchema::discover(&headers)?;
    let id_col = schema
        .index_of(ColumnKind::StudentId)
        .ok_or_else(|| SchemaError::MissingColumn(ColumnKind::StudentId.label()))?;

    let last_row = range.end().map(|(row, _)| row).unwrap_or(0);
    let mut rows = Vec::new();

    for row in DATA_START_ROW..=last_row {
        let Some(student_id) = student_id(range.get_value((row, id_col as u32))) else {
            continue;
        };

        let cells = schema
            .grade_columns()
            .map(|(col, slot)| (slot, RawCell::from(range.get_value((row, col as u32)))))
            .collect();

        rows.push(ParsedRow {
            row,
            student_id,
            cells,
        });
    }

    Ok(ParsedSheet { schema, rows })
}

fn header_labels(range: &Range<Data>) -> Vec<String> {
    let last_col = range.end().map(|(_, col)| col).unwrap_or(0);
    (0..=last_col)
        .map(|col| match range.get_value((HEADER_ROW, col)) {
            Some(Data::String(s)) => s.trim().to_string(),
            Some(Data::Empty) | None => String::new(),
            Some(other) => other.to_string(),
        })
        .collect()
}

/// Student id as text. Spreadsheet tools often turn numeric ids into numbers,
/// so `12.0` reads back as `"12"`.
fn student_id(cell: Option<&Data>) -> Option<String> {
    let id = match cell? {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format_number(*f),
        Data::Int(i) => i.to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    };

    (!id.is_empty()).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(rows: &[&[Data]]) -> Range<Data> {
        let height = rows.len().max(1) as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(1).max(1) as u32;
        let mut range = Range::new((0, 0), (height - 1, width - 1));
        for (r, cells) in rows.iter().enumerate() {
            for (c, cell) in cells.iter().enumerate() {
                range.set_value((r as u32, c as u32), cell.clone());
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn header() -> Vec<Data> {
        vec![
            s("Student ID"),
            s("Student Name"),
            s("Objective 1"),
            s("Objective 2"),
            s("Exam Score"),
            s("Final Score"),
        ]
    }

    fn with_metadata(data: Vec<Vec<Data>>) -> Vec<Vec<Data>> {
        let mut rows = vec![
            vec![s("GRADE ENTRY TEMPLATE")],
            vec![s("Subject"), s("Matematika")],
            vec![s("Class"), s("5A")],
            vec![s("Term"), s("Ganjil 2024/2025")],
            vec![],
            header(),
        ];
        rows.extend(data);
        rows
    }

    fn parse(rows: Vec<Vec<Data>>) -> Result<ParsedSheet, SchemaError> {
        let refs: Vec<&[Data]> = rows.iter().map(|r| r.as_slice()).collect();
        parse_range(&sheet(&refs))
    }

    #[test]
    fn test_parses_rows_in_grade_column_order() {
        let parsed = parse(with_metadata(vec![vec![
            s("0012"),
            s("Ani"),
            Data::Float(80.0),
            Data::Int(90),
            Data::Float(75.0),
            Data::Empty,
        ]]))
        .unwrap();

        assert_eq!(parsed.schema.objective_count(), 2);
        assert_eq!(
            parsed.rows,
            vec![ParsedRow {
                row: 6,
                student_id: "0012".to_string(),
                cells: vec![
                    (GradeSlot::Objective(1), RawCell::Number(80.0)),
                    (GradeSlot::Objective(2), RawCell::Number(90.0)),
                    (GradeSlot::Exam, RawCell::Number(75.0)),
                ],
            }]
        );
    }

    #[test]
    fn test_blank_student_ids_are_skipped() {
        let parsed = parse(with_metadata(vec![
            vec![s(""), s("Ghost"), Data::Float(80.0)],
            vec![Data::Empty],
            vec![s("0013"), s("Budi"), s("85,5")],
        ]))
        .unwrap();

        assert_eq!(parsed.rows.len(), 1);
        assert_eq!(parsed.rows[0].student_id, "0013");
        assert_eq!(parsed.rows[0].row, 8);
        assert_eq!(
            parsed.rows[0].cells[0],
            (GradeSlot::Objective(1), RawCell::Text("85,5".to_string()))
        );
        assert_eq!(parsed.rows[0].cells[2], (GradeSlot::Exam, RawCell::Blank));
    }

    #[test]
    fn test_numeric_student_ids_lose_trailing_zero() {
        let parsed = parse(with_metadata(vec![vec![Data::Float(12.0), s("Ani")]])).unwrap();
        assert_eq!(parsed.rows[0].student_id, "12");
    }

    #[test]
    fn test_missing_header_row() {
        let rows = vec![vec![s("GRADE ENTRY TEMPLATE")]];
        assert!(matches!(
            parse(rows),
            Err(SchemaError::MissingHeaderRow(5))
        ));
    }

    #[test]
    fn test_missing_anchor_column() {
        let mut rows = with_metadata(vec![]);
        rows[HEADER_ROW as usize] = vec![s("Student ID"), s("Objective 1"), s("UAS")];
        assert_eq!(
            parse(rows).unwrap_err(),
            SchemaError::MissingColumn("Exam Score".to_string())
        );
    }

    #[test]
    fn test_parse_workbook_from_saved_bytes() {
        use rust_xlsxwriter::Workbook;

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("template nilai").unwrap();
        sheet.write_string(0, 0, "GRADE ENTRY TEMPLATE").unwrap();
        for (col, label) in ["Student ID", "Student Name", "Objective 1", "Exam Score", "Final Score"]
            .into_iter()
            .enumerate()
        {
            sheet.write_string(HEADER_ROW, col as u16, label).unwrap();
        }
        sheet.write_string(DATA_START_ROW, 0, "0012").unwrap();
        sheet.write_string(DATA_START_ROW, 1, "Ani").unwrap();
        sheet.write_number(DATA_START_ROW, 2, 80.0).unwrap();
        sheet.write_number(DATA_START_ROW, 3, 90.0).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let parsed = parse_workbook(&bytes).unwrap();
        assert_eq!(
            parsed.rows,
            vec![ParsedRow {
                row: DATA_START_ROW,
                student_id: "0012".to_string(),
                cells: vec![
                    (GradeSlot::Objective(1), RawCell::Number(80.0)),
                    (GradeSlot::Exam, RawCell::Number(90.0)),
                ],
            }]
        );
    }

    #[test]
    fn test_unreadable_bytes() {
        assert!(matches!(
            parse_workbook(b"not a workbook"),
            Err(SchemaError::UnreadableWorkbook(_))
        ));
    }
}
