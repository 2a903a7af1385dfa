//! Issue report — `suspected_issues_YYYYMMDD.xlsx` with one `Issues` sheet.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rust_xlsxwriter::{Format, Workbook};
use tracing::info;

use crate::error::ReportError;
use crate::validation::Issue;

pub const REPORT_SHEET: &str = "Issues";
pub const REPORT_HEADERS: [&str; 3] = ["Row", "Column", "Value"];

/// Report path for a given day.
pub fn report_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("suspected_issues_{}.xlsx", date.format("%Y%m%d")))
}

/// Write `issues` to the day's report file, replacing an earlier one.
pub fn write_report(dir: &Path, date: NaiveDate, issues: &[Issue]) -> Result<PathBuf, ReportError> {
    std::fs::create_dir_all(dir)?;
    let path = report_path(dir, date);

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let sheet = workbook.add_worksheet().set_name(REPORT_SHEET)?;

    for (col, header) in REPORT_HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, issue) in issues.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_number(row, 0, issue.row as f64)?;
        sheet.write_string(row, 1, issue.column.as_str())?;
        sheet.write_string(row, 2, &issue.value)?;
    }

    workbook.save(&path)?;
    info!(path = %path.display(), issues = issues.len(), "Issue report written");
    Ok(path)
}

/// One line per column with its issue count, for logs.
pub fn summarize(issues: &[Issue]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.column.as_str()).or_default() += 1;
    }
    counts
        .iter()
        .map(|(column, n)| format!("{column}: {n}"))
        .collect::<Vec<_>>()
        .join(", ")
}
