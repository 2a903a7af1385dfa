//! Record validation engine.
//!
//! Field validators → record checker → cross-sheet check → one ordered
//! issue list. Validation only reads sheets; it never alters them.

pub mod checker;
pub mod cross_sheet;
pub mod fields;
pub mod record;
pub mod sheet;

use serde::Serialize;
use tracing::info;

pub use checker::check_sheet;
pub use cross_sheet::check_join_keys;
pub use record::{Column, EventRecord, FIELD_SPECS, FieldSpec};
pub use sheet::Sheet;

/// A single field-level or cross-sheet failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    /// 0-based data row index within its sheet.
    pub row: usize,
    pub column: Column,
    /// The offending value, verbatim.
    pub value: String,
}

impl Issue {
    pub fn new(row: usize, column: Column, value: impl Into<String>) -> Self {
        Self {
            row,
            column,
            value: value.into(),
        }
    }
}

/// Outcome of validating a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Approved,
    Rejected(Vec<Issue>),
}

impl Verdict {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        if issues.is_empty() {
            Verdict::Approved
        } else {
            Verdict::Rejected(issues)
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, Verdict::Approved)
    }

    pub fn issues(&self) -> &[Issue] {
        match self {
            Verdict::Approved => &[],
            Verdict::Rejected(issues) => issues,
        }
    }
}

/// Validate both sheets and the join between them.
///
/// Order: parts-events issues, then general-events issues, then
/// cross-sheet issues.
pub fn validate_sheets(parts: &Sheet, general: &Sheet) -> Vec<Issue> {
    let mut issues = check_sheet(parts);
    issues.extend(check_sheet(general));
    issues.extend(check_join_keys(parts, general));

    info!(
        parts_rows = parts.len(),
        general_rows = general.len(),
        issues = issues.len(),
        "Validation finished"
    );
    issues
}

/// Validate and fold the result into a verdict.
pub fn verdict(parts: &Sheet, general: &Sheet) -> Verdict {
    Verdict::from_issues(validate_sheets(parts, general))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::EventRecord;

    /// A record that passes every field rule.
    pub(crate) fn clean_record(key: &str) -> EventRecord {
        EventRecord {
            site_type: "Assembly Site".into(),
            impact_status: "Impacted".into(),
            event_news_url: "http://news.example.com/fire".into(),
            event_news_date: "2024-01-15".into(),
            event_start_date: "2024-01-14".into(),
            event_end_date: "TBD".into(),
            event_threat_level: "Moderate".into(),
            event_type: "Factory Fires".into(),
            event_scope: "Facility".into(),
            join_key: key.into(),
        }
    }
}
