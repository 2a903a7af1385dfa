//! Workbook reader — turns a delivered xlsx file into two typed sheets.
//!
//! Anything that keeps the workbook from being read is an error here.
//! An unreadable file must never look like a file with no issues.

use std::path::Path;

use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::error::{Result, WorkbookError};
use crate::validation::Sheet;

/// Worksheet names of an event delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub parts: String,
    pub general: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            parts: "Events_Parts".to_string(),
            general: "General_Events".to_string(),
        }
    }
}

/// The two sheets of a delivery.
#[derive(Debug, Clone)]
pub struct EventWorkbook {
    pub parts: Sheet,
    pub general: Sheet,
}

/// Open `path` and build both sheets.
pub fn read_workbook(path: &Path, names: &SheetNames) -> Result<EventWorkbook> {
    let mut workbook = open_workbook::<Xlsx<_>, _>(path).map_err(|e| WorkbookError::Open {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let parts = read_sheet(&mut workbook, &names.parts)?;
    let general = read_sheet(&mut workbook, &names.general)?;

    info!(
        path = %path.display(),
        parts_rows = parts.len(),
        general_rows = general.len(),
        "Workbook loaded"
    );
    Ok(EventWorkbook { parts, general })
}

fn read_sheet<R>(workbook: &mut Xlsx<R>, name: &str) -> Result<Sheet>
where
    R: std::io::Read + std::io::Seek,
{
    if !workbook.sheet_names().iter().any(|n| n == name) {
        return Err(WorkbookError::MissingSheet {
            name: name.to_string(),
        }
        .into());
    }

    let range = workbook
        .worksheet_range(name)
        .map_err(|e| WorkbookError::Unreadable {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

    sheet_from_range(name, &range)
}

/// First row is the header; every following row is a record.
fn sheet_from_range(name: &str, range: &Range<Data>) -> Result<Sheet> {
    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| WorkbookError::Unreadable {
            name: name.to_string(),
            reason: "no header row".into(),
        })?
        .iter()
        .map(cell_text)
        .collect();

    debug!(sheet = %name, columns = headers.len(), "Read header row");

    let records = rows.map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    Ok(Sheet::from_rows(name, &headers, records)?)
}

/// Render one cell the way the validators expect to see it.
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => float_text(*f),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.date().format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| float_text(dt.as_f64())),
        Data::DateTimeIso(s) => iso_date_prefix(s).unwrap_or_else(|| s.clone()),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

fn float_text(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

fn iso_date_prefix(s: &str) -> Option<String> {
    let head = s.get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ValidationError};
    use crate::validation::Column;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

    fn write_delivery(path: &Path, drop_column: Option<&str>, with_general: bool) {
        let mut wb = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        let mut names = vec!["Events_Parts"];
        if with_general {
            names.push("General_Events");
        }

        for name in names {
            let ws = wb.add_worksheet().set_name(name).unwrap();
            let headers: Vec<&str> = Column::ALL
                .iter()
                .map(|c| c.as_str())
                .filter(|h| Some(*h) != drop_column)
                .collect();
            for (col, header) in headers.iter().enumerate() {
                ws.write_string(0, col as u16, *header).unwrap();
                let col = col as u16;
                match *header {
                    "Site Type" => ws.write_string(1, col, "Final Test Site").map(|_| ()),
                    "Impact Status" => ws.write_string(1, col, "Not Impacted").map(|_| ()),
                    "Event News URL" => ws.write_string(1, col, "http://x").map(|_| ()),
                    "Event News Date" => {
                        let dt = ExcelDateTime::from_ymd(2024, 3, 9).unwrap();
                        ws.write_datetime_with_format(1, col, &dt, &date_format)
                            .map(|_| ())
                    }
                    "Event Start Date" => ws.write_string(1, col, "2024-03-08").map(|_| ()),
                    "Event End Date" => ws.write_string(1, col, "TBD").map(|_| ()),
                    "Event Threat Level" => ws.write_string(1, col, "Minor").map(|_| ()),
                    "Event Type" => ws.write_string(1, col, "Floods").map(|_| ()),
                    "Event Scope" => ws.write_string(1, col, "Region").map(|_| ()),
                    _ => ws.write_number(1, col, 1042.0).map(|_| ()),
                }
                .unwrap();
            }
        }
        wb.save(path).unwrap();
    }

    #[test]
    fn reads_both_sheets_with_typed_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.xlsx");
        write_delivery(&path, None, true);

        let book = read_workbook(&path, &SheetNames::default()).unwrap();
        assert_eq!(book.parts.len(), 1);
        assert_eq!(book.general.len(), 1);

        let record = &book.parts.records()[0];
        assert_eq!(record.site_type, "Final Test Site");
        assert_eq!(record.event_news_date, "2024-03-09");
        assert_eq!(record.join_key, "1042");
    }

    #[test]
    fn missing_worksheet_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.xlsx");
        write_delivery(&path, None, false);

        let err = read_workbook(&path, &SheetNames::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Workbook(WorkbookError::MissingSheet { ref name }) if name == "General_Events"
        ));
    }

    #[test]
    fn missing_column_is_missing_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.xlsx");
        write_delivery(&path, Some("Event Type"), true);

        let err = read_workbook(&path, &SheetNames::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Validation(ValidationError::MissingField { ref column, .. }) if column == "Event Type"
        ));
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("delivery.xlsx");
        std::fs::write(&path, b"not a zip archive").unwrap();

        let err = read_workbook(&path, &SheetNames::default()).unwrap_err();
        assert!(matches!(err, Error::Workbook(WorkbookError::Open { .. })));
    }

    #[test]
    fn cell_text_rendering() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String(" Minor ".into())), " Minor ");
        assert_eq!(cell_text(&Data::Float(12.0)), "12");
        assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
        assert_eq!(cell_text(&Data::Int(-3)), "-3");
        assert_eq!(cell_text(&Data::Bool(true)), "TRUE");
        assert_eq!(
            cell_text(&Data::DateTimeIso("2024-05-01T00:00:00".into())),
            "2024-05-01"
        );
    }
}
