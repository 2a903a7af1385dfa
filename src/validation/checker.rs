//! Record checker — applies the field-spec table to every row of a sheet.

use tracing::debug;

use crate::validation::Issue;
use crate::validation::record::FIELD_SPECS;
use crate::validation::sheet::Sheet;

/// Check every record of `sheet`, in row order, against every field spec.
///
/// A record failing three specs yields three issues.
pub fn check_sheet(sheet: &Sheet) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (row, record) in sheet.records().iter().enumerate() {
        for spec in &FIELD_SPECS {
            if !spec.accepts(record) {
                issues.push(Issue::new(row, spec.column, record.value(spec.column)));
            }
        }
    }

    debug!(
        sheet = %sheet.name(),
        rows = sheet.len(),
        issues = issues.len(),
        "Checked sheet"
    );
    issues
}
