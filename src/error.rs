//! Error types for the delivery audit.

/// Top-level error type for an audit run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Workbook error: {0}")]
    Workbook(#[from] WorkbookError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Background task failed: {0}")]
    Task(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Mailbox errors (IMAP inbound, SMTP outbound).
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Failed to connect to {host}: {reason}")]
    ConnectFailed { host: String, reason: String },

    #[error("Authentication failed for {username}")]
    AuthFailed { username: String },

    #[error("Failed to fetch messages: {0}")]
    FetchFailed(String),

    #[error("Failed to send reply: {0}")]
    SendFailed(String),

    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    #[error("Mail server health check failed: {host}")]
    HealthCheckFailed { host: String },
}

/// The workbook could not be turned into sheets.
#[derive(Debug, thiserror::Error)]
pub enum WorkbookError {
    #[error("Cannot open workbook {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Worksheet {name} not found in workbook")]
    MissingSheet { name: String },

    #[error("Worksheet {name} is unreadable: {reason}")]
    Unreadable { name: String, reason: String },

    #[error("Failed to save attachment: {0}")]
    Io(#[from] std::io::Error),
}

/// Structural problems found while building typed sheets.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Sheet {sheet} is missing column {column}{}", row_suffix(.row))]
    MissingField {
        sheet: String,
        row: Option<usize>,
        column: String,
    },
}

fn row_suffix(row: &Option<usize>) -> String {
    row.map(|r| format!(" at row {r}")).unwrap_or_default()
}

/// Issue report could not be written.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Spreadsheet writer failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Processed-message log errors.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt processed log: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Result type alias for the audit.
pub type Result<T> = std::result::Result<T, Error>;
