//! Typed event records and the fixed field-spec table.

use std::fmt;

use serde::Serialize;

use super::fields;

/// Every column an event sheet must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Column {
    SiteType,
    ImpactStatus,
    EventNewsUrl,
    EventNewsDate,
    EventStartDate,
    EventEndDate,
    EventThreatLevel,
    EventType,
    EventScope,
    /// Join key between the two sheets.
    JoinKey,
}

impl Column {
    /// All columns, in the order they are resolved from a header row.
    pub const ALL: [Column; 10] = [
        Column::SiteType,
        Column::ImpactStatus,
        Column::EventNewsUrl,
        Column::EventNewsDate,
        Column::EventStartDate,
        Column::EventEndDate,
        Column::EventThreatLevel,
        Column::EventType,
        Column::EventScope,
        Column::JoinKey,
    ];

    /// Header text as it appears in the workbook.
    pub fn as_str(self) -> &'static str {
        match self {
            Column::SiteType => "Site Type",
            Column::ImpactStatus => "Impact Status",
            Column::EventNewsUrl => "Event News URL",
            Column::EventNewsDate => "Event News Date",
            Column::EventStartDate => "Event Start Date",
            Column::EventEndDate => "Event End Date",
            Column::EventThreatLevel => "Event Threat Level",
            Column::EventType => "Event Type",
            Column::EventScope => "Event Scope",
            Column::JoinKey => "AL",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of an event sheet. Values are kept exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    pub site_type: String,
    pub impact_status: String,
    pub event_news_url: String,
    pub event_news_date: String,
    pub event_start_date: String,
    pub event_end_date: String,
    pub event_threat_level: String,
    pub event_type: String,
    pub event_scope: String,
    pub join_key: String,
}

impl EventRecord {
    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::SiteType => &self.site_type,
            Column::ImpactStatus => &self.impact_status,
            Column::EventNewsUrl => &self.event_news_url,
            Column::EventNewsDate => &self.event_news_date,
            Column::EventStartDate => &self.event_start_date,
            Column::EventEndDate => &self.event_end_date,
            Column::EventThreatLevel => &self.event_threat_level,
            Column::EventType => &self.event_type,
            Column::EventScope => &self.event_scope,
            Column::JoinKey => &self.join_key,
        }
    }

    pub(crate) fn set(&mut self, column: Column, value: String) {
        let slot = match column {
            Column::SiteType => &mut self.site_type,
            Column::ImpactStatus => &mut self.impact_status,
            Column::EventNewsUrl => &mut self.event_news_url,
            Column::EventNewsDate => &mut self.event_news_date,
            Column::EventStartDate => &mut self.event_start_date,
            Column::EventEndDate => &mut self.event_end_date,
            Column::EventThreatLevel => &mut self.event_threat_level,
            Column::EventType => &mut self.event_type,
            Column::EventScope => &mut self.event_scope,
            Column::JoinKey => &mut self.join_key,
        };
        *slot = value;
    }
}

/// A column paired with the rule its values must satisfy.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub column: Column,
    pub validator: fn(&str) -> bool,
}

impl FieldSpec {
    pub fn accepts(&self, record: &EventRecord) -> bool {
        (self.validator)(record.value(self.column))
    }
}

/// Field specs in evaluation order. Shared by both sheets.
pub const FIELD_SPECS: [FieldSpec; 9] = [
    FieldSpec {
        column: Column::SiteType,
        validator: fields::validate_site_type,
    },
    FieldSpec {
        column: Column::ImpactStatus,
        validator: fields::validate_impact_status,
    },
    FieldSpec {
        column: Column::EventNewsUrl,
        validator: fields::validate_url,
    },
    FieldSpec {
        column: Column::EventNewsDate,
        validator: fields::validate_date,
    },
    FieldSpec {
        column: Column::EventStartDate,
        validator: fields::validate_date,
    },
    FieldSpec {
        column: Column::EventEndDate,
        validator: fields::validate_date,
    },
    FieldSpec {
        column: Column::EventThreatLevel,
        validator: fields::validate_threat_level,
    },
    FieldSpec {
        column: Column::EventType,
        validator: fields::validate_event_type,
    },
    FieldSpec {
        column: Column::EventScope,
        validator: fields::validate_event_scope,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_key_header_is_al() {
        assert_eq!(Column::JoinKey.as_str(), "AL");
        assert_eq!(Column::EventThreatLevel.to_string(), "Event Threat Level");
    }

    #[test]
    fn field_specs_skip_join_key() {
        assert!(FIELD_SPECS.iter().all(|s| s.column != Column::JoinKey));
        assert_eq!(FIELD_SPECS[0].column, Column::SiteType);
        assert_eq!(FIELD_SPECS[8].column, Column::EventScope);
    }

    #[test]
    fn set_and_value_address_the_same_field() {
        let mut record = EventRecord::default();
        for (i, column) in Column::ALL.into_iter().enumerate() {
            record.set(column, format!("v{i}"));
        }
        for (i, column) in Column::ALL.into_iter().enumerate() {
            assert_eq!(record.value(column), format!("v{i}"));
        }
    }

    #[test]
    fn spec_applies_its_validator_to_its_column() {
        let record = EventRecord {
            event_threat_level: "Severe".into(),
            site_type: "Assembly Site".into(),
            ..Default::default()
        };
        let threat = FIELD_SPECS
            .iter()
            .find(|s| s.column == Column::EventThreatLevel)
            .unwrap();
        assert!(!threat.accepts(&record));
        assert!(FIELD_SPECS[0].accepts(&record));
    }
}
