//! Cross-sheet consistency: every parts-events key must exist in
//! general-events.

use std::collections::HashSet;

use tracing::debug;

use crate::validation::Issue;
use crate::validation::record::Column;
use crate::validation::sheet::Sheet;

/// Emit an issue for each parts-events record whose join key has no
/// counterpart in general-events. Empty keys never match.
pub fn check_join_keys(parts: &Sheet, general: &Sheet) -> Vec<Issue> {
    let known: HashSet<&str> = general
        .records()
        .iter()
        .map(|r| r.join_key.as_str())
        .filter(|k| !k.is_empty())
        .collect();

    let issues: Vec<Issue> = parts
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| !known.contains(r.join_key.as_str()))
        .map(|(row, r)| Issue::new(row, Column::JoinKey, &r.join_key))
        .collect();

    debug!(
        keys = known.len(),
        unmatched = issues.len(),
        "Checked join keys"
    );
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::testing::clean_record;

    #[test]
    fn missing_key_yields_one_issue() {
        let parts = Sheet::new("Events_Parts", vec![clean_record("X1")]);
        let general = Sheet::new("General_Events", vec![clean_record("Y9")]);
        assert_eq!(
            check_join_keys(&parts, &general),
            vec![Issue::new(0, Column::JoinKey, "X1")]
        );
    }

    #[test]
    fn present_key_yields_nothing() {
        let parts = Sheet::new("Events_Parts", vec![clean_record("X1")]);
        let general = Sheet::new(
            "General_Events",
            vec![clean_record("Y9"), clean_record("X1")],
        );
        assert!(check_join_keys(&parts, &general).is_empty());
    }

    #[test]
    fn keys_compare_exactly() {
        let parts = Sheet::new("Events_Parts", vec![clean_record("x1"), clean_record("X1 ")]);
        let general = Sheet::new("General_Events", vec![clean_record("X1")]);
        let rows: Vec<usize> = check_join_keys(&parts, &general)
            .iter()
            .map(|i| i.row)
            .collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn empty_key_never_matches() {
        let parts = Sheet::new("Events_Parts", vec![clean_record("")]);
        let general = Sheet::new("General_Events", vec![clean_record("")]);
        assert_eq!(
            check_join_keys(&parts, &general),
            vec![Issue::new(0, Column::JoinKey, "")]
        );
    }

    #[test]
    fn general_only_keys_are_fine() {
        let parts = Sheet::new("Events_Parts", Vec::new());
        let general = Sheet::new("General_Events", vec![clean_record("Z")]);
        assert!(check_join_keys(&parts, &general).is_empty());
    }
}
