//! One audit run: fetch → save attachment → validate → approve or report.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tokio::fs;
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

use crate::channels::{ApprovalReply, Attachment, Delivery, Mailbox};
use crate::config::AuditConfig;
use crate::error::{Error, Result, WorkbookError};
use crate::report;
use crate::state::ProcessedLog;
use crate::validation::{self, Verdict};
use crate::workbook;

/// Name used when an attachment's declared name is unusable.
const FALLBACK_FILE_NAME: &str = "delivery.xlsx";

/// What a single run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// No message with the keyword, or the newest one had no workbook.
    NoDelivery,
    /// The newest delivery was audited by an earlier run.
    AlreadyProcessed { key: String },
    /// No issues; the approval reply was sent.
    Approved { key: String },
    /// Issues found; the report was written.
    Rejected {
        key: String,
        report: PathBuf,
        issues: usize,
    },
}

/// Runs audits against a mailbox.
pub struct Auditor {
    config: AuditConfig,
    mailbox: Arc<dyn Mailbox>,
}

impl Auditor {
    pub fn new(config: AuditConfig, mailbox: Arc<dyn Mailbox>) -> Self {
        Self { config, mailbox }
    }

    /// Run one audit.
    ///
    /// Any failure (mailbox, unreadable workbook, missing column, report
    /// write) is returned as an error; it never turns into an approval, and
    /// the delivery is not recorded as processed.
    pub async fn run_once(&self) -> Result<AuditOutcome> {
        let run = Uuid::new_v4();
        self.run_inner()
            .instrument(info_span!("audit", %run))
            .await
    }

    async fn run_inner(&self) -> Result<AuditOutcome> {
        let cfg = &self.config;

        let Some(delivery) = self.mailbox.latest_delivery(&cfg.subject_keyword).await? else {
            info!(keyword = %cfg.subject_keyword, "No delivery found");
            return Ok(AuditOutcome::NoDelivery);
        };

        let key = delivery.key();
        let mut log = ProcessedLog::load(&cfg.download_dir).await?;
        if log.contains(&key) {
            info!(key = %key, "Delivery already audited");
            return Ok(AuditOutcome::AlreadyProcessed { key });
        }

        info!(
            key = %key,
            received = %delivery.received_at.format("%Y-%m-%d %H:%M UTC"),
            "Auditing delivery"
        );
        let path = save_attachment(&cfg.download_dir, &delivery.attachment).await?;
        info!(path = %path.display(), "Attachment saved");

        let sheets = cfg.sheets.clone();
        let verdict = tokio::task::spawn_blocking(move || -> Result<Verdict> {
            let book = workbook::read_workbook(&path, &sheets)?;
            Ok(validation::verdict(&book.parts, &book.general))
        })
        .await
        .map_err(|e| Error::Task(e.to_string()))??;

        let outcome = match verdict {
            Verdict::Approved => {
                self.approve(&delivery).await?;
                AuditOutcome::Approved { key: key.clone() }
            }
            Verdict::Rejected(issues) => {
                let count = issues.len();
                warn!(
                    issues = count,
                    summary = %report::summarize(&issues),
                    "Delivery has issues"
                );
                let dir = cfg.download_dir.clone();
                let today = Local::now().date_naive();
                let report = tokio::task::spawn_blocking(move || {
                    report::write_report(&dir, today, &issues)
                })
                .await
                .map_err(|e| Error::Task(e.to_string()))??;
                AuditOutcome::Rejected {
                    key: key.clone(),
                    report,
                    issues: count,
                }
            }
        };

        if let Err(e) = log.record(&key).await {
            if matches!(outcome, AuditOutcome::Approved { .. }) {
                error!(
                    key = %key,
                    "Approval was sent but the delivery could not be recorded; \
                     the next run will audit and approve it again: {e}"
                );
            }
            return Err(e.into());
        }
        Ok(outcome)
    }

    async fn approve(&self, delivery: &Delivery) -> Result<()> {
        let reply = ApprovalReply {
            cc: self.config.approval_cc.clone(),
            body: self.config.approval_body(),
        };
        self.mailbox.send_reply(delivery, &reply).await?;
        info!(mailbox = self.mailbox.name(), "File approved with no issues");
        Ok(())
    }
}

/// Final path component of a declared attachment name.
pub fn safe_file_name(declared: &str) -> String {
    let name = declared.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        FALLBACK_FILE_NAME.to_string()
    } else {
        name.to_string()
    }
}

/// Save `attachment` into `dir`, replacing an earlier copy.
pub async fn save_attachment(dir: &Path, attachment: &Attachment) -> Result<PathBuf> {
    fs::create_dir_all(dir).await.map_err(WorkbookError::Io)?;
    let path = dir.join(safe_file_name(&attachment.file_name));
    fs::write(&path, &attachment.contents)
        .await
        .map_err(WorkbookError::Io)?;
    Ok(path)
}
