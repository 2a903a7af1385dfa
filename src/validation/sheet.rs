//! Sheets of typed event records.
//!
//! Column lookup by name happens here, once per sheet. A missing column
//! is a `MissingField` error for the whole sheet; validators downstream
//! only ever see complete records.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::validation::record::{Column, EventRecord};

/// An ordered, read-only sequence of event records.
#[derive(Debug, Clone)]
pub struct Sheet {
    name: String,
    records: Vec<EventRecord>,
}

impl Sheet {
    /// Wrap already-typed records.
    pub fn new(name: impl Into<String>, records: Vec<EventRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }

    /// Build a sheet from a header row and cell rows.
    ///
    /// Extra columns are ignored. Rows shorter than the header are padded
    /// with empty values, matching how a spreadsheet reads blank cells.
    pub fn from_rows(
        name: impl Into<String>,
        headers: &[String],
        rows: impl IntoIterator<Item = Vec<String>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();

        let mut positions = Vec::with_capacity(Column::ALL.len());
        for column in Column::ALL {
            let idx = headers
                .iter()
                .position(|h| h == column.as_str())
                .ok_or_else(|| ValidationError::MissingField {
                    sheet: name.clone(),
                    row: None,
                    column: column.as_str().to_string(),
                })?;
            positions.push((column, idx));
        }

        let records = rows
            .into_iter()
            .map(|mut cells| {
                let mut record = EventRecord::default();
                for &(column, idx) in &positions {
                    let value = cells.get_mut(idx).map(std::mem::take).unwrap_or_default();
                    record.set(column, value);
                }
                record
            })
            .collect();

        Ok(Self { name, records })
    }

    /// Build a sheet from per-row maps of column name to value.
    ///
    /// Every row must carry every column; the first gap is reported with
    /// its row index.
    pub fn from_maps(
        name: impl Into<String>,
        rows: impl IntoIterator<Item = HashMap<String, String>>,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        let mut records = Vec::new();

        for (row, mut cells) in rows.into_iter().enumerate() {
            let mut record = EventRecord::default();
            for column in Column::ALL {
                let value =
                    cells
                        .remove(column.as_str())
                        .ok_or_else(|| ValidationError::MissingField {
                            sheet: name.clone(),
                            row: Some(row),
                            column: column.as_str().to_string(),
                        })?;
                record.set(column, value);
            }
            records.push(record);
        }

        Ok(Self { name, records })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        Column::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }

    #[test]
    fn from_rows_maps_headers_by_name() {
        let mut hdr = headers();
        hdr.reverse();
        hdr.insert(0, "Notes".into());
        let mut row: Vec<String> = Column::ALL.iter().map(|c| format!("{c}!")).collect();
        row.reverse();
        row.insert(0, "ignored".into());

        let sheet = Sheet::from_rows("Events_Parts", &hdr, vec![row]).unwrap();
        assert_eq!(sheet.len(), 1);
        let record = &sheet.records()[0];
        assert_eq!(record.site_type, "Site Type!");
        assert_eq!(record.join_key, "AL!");
    }

    #[test]
    fn from_rows_pads_short_rows() {
        let sheet = Sheet::from_rows("General_Events", &headers(), vec![vec!["Assembly Site".into()]])
            .unwrap();
        let record = &sheet.records()[0];
        assert_eq!(record.site_type, "Assembly Site");
        assert_eq!(record.event_scope, "");
    }

    #[test]
    fn from_rows_missing_header_is_fatal() {
        let hdr: Vec<String> = headers()
            .into_iter()
            .filter(|h| h != "Event Scope")
            .collect();
        let err = Sheet::from_rows("Events_Parts", &hdr, Vec::new()).unwrap_err();
        let ValidationError::MissingField { sheet, row, column } = err;
        assert_eq!(sheet, "Events_Parts");
        assert_eq!(row, None);
        assert_eq!(column, "Event Scope");
    }

    #[test]
    fn from_maps_reports_row_of_gap() {
        let full: HashMap<String, String> = Column::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), String::new()))
            .collect();
        let mut partial = full.clone();
        partial.remove("AL");

        let err = Sheet::from_maps("General_Events", vec![full, partial]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Sheet General_Events is missing column AL at row 1"
        );
    }

    #[test]
    fn empty_sheet_is_valid() {
        let sheet = Sheet::from_rows("Events_Parts", &headers(), Vec::new()).unwrap();
        assert!(sheet.is_empty());
        assert_eq!(sheet.name(), "Events_Parts");
    }
}
