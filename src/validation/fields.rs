//! Field validators — one pure predicate per domain field.
//!
//! Every enumeration is closed and matched exactly: no case folding,
//! no trimming. A value with a trailing space is a different value.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Sentinel accepted by every date field.
pub const DATE_TBD: &str = "TBD";

/// The only accepted URL prefix.
pub const URL_SCHEME: &str = "http://";

pub const SITE_TYPES: &[&str] = &[
    "Assembly Site",
    "Fabrication Site",
    "Material Location",
    "Final Test Site",
    "-",
    "Shipping Site",
];

pub const IMPACT_STATUSES: &[&str] = &[
    "Possible Impacted",
    "Impacted",
    "Impact is being evaluated",
    "Not Impacted",
];

pub const THREAT_LEVELS: &[&str] = &["Minor", "Moderate", "Critical"];

pub const EVENT_TYPES: &[&str] = &[
    "Market Insights",
    "Earthquakes",
    "Factory Fires",
    "Business Withdrawal/Closure",
    "Tariffs and Customs",
    "Typhoons",
    "Floods",
    "Droughts",
    "Power Outages",
    "Economic",
    "Social",
    "Political Situations",
    "Global Pandemic",
    "Ports Disruptions",
    "Business Expansions",
    "Cyber Attacks",
    "Civil Unrests",
    "Industrial Disputes",
    "Wildfires",
    "Product Shortages",
    "Cyclones",
    "Price Fluctuations",
    "Mergers and Acquisitions",
    "Air Pollutions",
    "Raw Material Shortages",
    "Factory Explosions",
    "Mines Shut Down",
    "Volcanoes",
    "Health and Safety",
    "Lead Time Variability",
    "Storms",
    "Management Board updates",
    "Chemical Accidents",
    "Sanctions",
    "Military Disputes",
    "Extreme Weather",
    "Avalanches",
    "Diseases",
    "Shortages and Allocation",
    "Stock Status/Forecasting",
    "Lawsuits",
    "Dam burst",
    "Supply/Demand Statement",
    "Employees Layoff",
    "Terrorist Acts",
    "Business Relocation",
    "Partnerships",
    "Patents and Copyrights",
    "Explosions",
    "Shipping Disruption",
    "Landslides",
    "Bankruptcy",
    "Spin Off",
    "Product failure",
    "Cyber Risks",
    "Product Recall",
    "Tsunamis",
    "Infrastructure Disruptions",
];

pub const EVENT_SCOPES: &[&str] = &[
    "City",
    "Technical Feature",
    "Technology node",
    "Wafer Size",
    "Process Technology",
    "Supplier",
    "Region",
    "State",
    "Facility",
    "Country",
    "Raw Material",
    "Series",
    "Product line",
    "Technical Features",
    "Site Type",
    "Wafer Material",
    "Company",
];

/// Four-digit year, two-digit month, two-digit day. Calendar validity is
/// checked separately by chrono.
static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("static date regex"));

fn one_of(allowed: &[&str], value: &str) -> bool {
    allowed.contains(&value)
}

pub fn validate_site_type(value: &str) -> bool {
    one_of(SITE_TYPES, value)
}

/// Impact status of the affected site.
pub fn validate_impact_status(value: &str) -> bool {
    one_of(IMPACT_STATUSES, value)
}

/// Only a plain `http://` prefix is checked; `https://` is rejected.
pub fn validate_url(value: &str) -> bool {
    value.starts_with(URL_SCHEME)
}

/// Accepts `TBD` or a real calendar date written as `YYYY-MM-DD`.
pub fn validate_date(value: &str) -> bool {
    if value == DATE_TBD {
        return true;
    }
    DATE_SHAPE.is_match(value) && NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

pub fn validate_threat_level(value: &str) -> bool {
    one_of(THREAT_LEVELS, value)
}

pub fn validate_event_type(value: &str) -> bool {
    one_of(EVENT_TYPES, value)
}

pub fn validate_event_scope(value: &str) -> bool {
    one_of(EVENT_SCOPES, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Enumerations ────────────────────────────────────────────────

    #[test]
    fn enumeration_sizes() {
        assert_eq!(SITE_TYPES.len(), 6);
        assert_eq!(IMPACT_STATUSES.len(), 4);
        assert_eq!(THREAT_LEVELS.len(), 3);
        assert_eq!(EVENT_TYPES.len(), 58);
        assert_eq!(EVENT_SCOPES.len(), 17);
    }

    #[test]
    fn every_member_is_accepted() {
        assert!(SITE_TYPES.iter().all(|v| validate_site_type(v)));
        assert!(IMPACT_STATUSES.iter().all(|v| validate_impact_status(v)));
        assert!(THREAT_LEVELS.iter().all(|v| validate_threat_level(v)));
        assert!(EVENT_TYPES.iter().all(|v| validate_event_type(v)));
        assert!(EVENT_SCOPES.iter().all(|v| validate_event_scope(v)));
    }

    #[test]
    fn site_type_rejects_outsiders() {
        assert!(!validate_site_type("Warehouse"));
        assert!(!validate_site_type("assembly site"));
        assert!(!validate_site_type(" Assembly Site"));
        assert!(!validate_site_type(""));
    }

    #[test]
    fn impact_status_rejects_outsiders() {
        assert!(!validate_impact_status("Possibly Impacted"));
        assert!(!validate_impact_status("impacted"));
        assert!(!validate_impact_status("Egypt"));
    }

    #[test]
    fn threat_level_rejects_severe() {
        assert!(!validate_threat_level("Severe"));
        assert!(!validate_threat_level("minor"));
        assert!(!validate_threat_level("Critical "));
    }

    #[test]
    fn event_type_is_case_sensitive() {
        assert!(validate_event_type("Dam burst"));
        assert!(!validate_event_type("Dam Burst"));
        assert!(!validate_event_type("Meteor Strike"));
    }

    #[test]
    fn event_scope_keeps_both_feature_spellings() {
        assert!(validate_event_scope("Technical Feature"));
        assert!(validate_event_scope("Technical Features"));
        assert!(!validate_event_scope("technology node"));
        assert!(!validate_event_scope("Continent"));
    }

    // ── URL ─────────────────────────────────────────────────────────

    #[test]
    fn url_requires_plain_http() {
        assert!(validate_url("http://x"));
        assert!(validate_url("http://news.example.com/article?id=1"));
        assert!(!validate_url("https://x"));
        assert!(!validate_url("ftp://x"));
        assert!(!validate_url("HTTP://x"));
        assert!(!validate_url(" http://x"));
        assert!(!validate_url(""));
    }

    // ── Dates ───────────────────────────────────────────────────────

    #[test]
    fn date_accepts_tbd_and_iso_dates() {
        assert!(validate_date("TBD"));
        assert!(validate_date("2024-01-15"));
        assert!(validate_date("2024-02-29"));
    }

    #[test]
    fn date_rejects_malformed_values() {
        assert!(!validate_date("2024-13-40"));
        assert!(!validate_date("01/15/2024"));
        assert!(!validate_date("2023-02-29"));
        assert!(!validate_date("2024-1-5"));
        assert!(!validate_date("tbd"));
        assert!(!validate_date("2024-01-15 10:00:00"));
        assert!(!validate_date(""));
    }
}
