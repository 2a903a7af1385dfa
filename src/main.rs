use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use delivery_audit::audit::Auditor;
use delivery_audit::channels::{EmailChannel, EmailConfig, Mailbox};
use delivery_audit::config::AuditConfig;
use delivery_audit::logging::init_tracing;
use delivery_audit::poller::{log_outcome, spawn_audit_poller};

/// How long Ctrl-C waits for an audit in progress to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(120);

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let audit_config = AuditConfig::from_env().context("audit configuration")?;
    let _log_guard =
        init_tracing(audit_config.log_dir.as_deref()).context("log directory")?;

    let email_config = EmailConfig::from_env().context("email configuration")?;

    eprintln!("📋 Delivery Audit v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Subject keyword: {}", audit_config.subject_keyword);
    eprintln!("   Download dir: {}", audit_config.download_dir.display());
    eprintln!(
        "   Sheets: {} / {}",
        audit_config.sheets.parts, audit_config.sheets.general
    );
    eprintln!(
        "   Email: IMAP {}:{}, SMTP {}:{}",
        email_config.imap_host,
        email_config.imap_port,
        email_config.smtp_host,
        email_config.smtp_port
    );
    eprintln!(
        "   Approval CC: {}",
        if audit_config.approval_cc.is_empty() {
            "none".to_string()
        } else {
            audit_config.approval_cc.join(", ")
        }
    );

    let mailbox: Arc<dyn Mailbox> = Arc::new(EmailChannel::new(email_config));
    if let Err(e) = mailbox.health_check().await {
        tracing::warn!("{e}");
    }

    let poll_interval = audit_config.poll_interval;
    let auditor = Arc::new(Auditor::new(audit_config, mailbox));

    match poll_interval {
        None => {
            eprintln!("   Mode: single run\n");
            let outcome = auditor.run_once().await?;
            log_outcome(&outcome);
        }
        Some(interval) => {
            eprintln!("   Mode: polling every {}s (Ctrl-C to stop)\n", interval.as_secs());
            let poller = spawn_audit_poller(Arc::clone(&auditor), interval);
            tokio::signal::ctrl_c()
                .await
                .context("waiting for Ctrl-C")?;
            tracing::info!("Ctrl-C received, finishing the current audit");
            poller.stop(SHUTDOWN_GRACE).await;
            tracing::info!("Stopped");
        }
    }

    Ok(())
}
