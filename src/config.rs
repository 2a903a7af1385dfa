//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::workbook::SheetNames;

/// Audit configuration.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Subject substring that marks a delivery (matched case-sensitively).
    pub subject_keyword: String,
    /// Where attachments, reports and the processed log live.
    pub download_dir: PathBuf,
    /// CC recipients of the approval reply.
    pub approval_cc: Vec<String>,
    /// Signature lines appended to the approval reply.
    pub signature: Vec<String>,
    /// Worksheet names inside a delivery.
    pub sheets: SheetNames,
    /// Poll on this interval; `None` runs once.
    pub poll_interval: Option<Duration>,
    /// Directory for a daily-rotated log file.
    pub log_dir: Option<PathBuf>,
}

impl AuditConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };

        let subject_keyword = required("AUDIT_SUBJECT_KEYWORD")?;
        let download_dir = PathBuf::from(required("AUDIT_DOWNLOAD_DIR")?);

        let approval_cc = split_list(&lookup("AUDIT_APPROVAL_CC").unwrap_or_default(), ',');

        let signature = lookup("AUDIT_APPROVAL_SIGNATURE")
            .map(|s| split_list(&s, '|'))
            .filter(|lines| !lines.is_empty())
            .unwrap_or_else(|| vec!["Quality Department".to_string()]);

        let defaults = SheetNames::default();
        let sheets = SheetNames {
            parts: lookup("AUDIT_PARTS_SHEET").unwrap_or(defaults.parts),
            general: lookup("AUDIT_GENERAL_SHEET").unwrap_or(defaults.general),
        };

        let poll_interval = match lookup("AUDIT_POLL_INTERVAL_SECS") {
            None => None,
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "AUDIT_POLL_INTERVAL_SECS".into(),
                    message: format!("expected whole seconds, got {raw:?}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "AUDIT_POLL_INTERVAL_SECS".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
        };

        let log_dir = lookup("AUDIT_LOG_DIR").map(PathBuf::from);

        Ok(Self {
            subject_keyword,
            download_dir,
            approval_cc,
            signature,
            sheets,
            poll_interval,
            log_dir,
        })
    }

    /// Plain-text body of the approval reply.
    pub fn approval_body(&self) -> String {
        format!(
            "Dear,\n\nFile approved with no issues.\n\nThanks,\n{}\n",
            self.signature.join("\n")
        )
    }
}

/// Split on `sep`, trimming entries and dropping empty ones.
pub(crate) fn split_list(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
