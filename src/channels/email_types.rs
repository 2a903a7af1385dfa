//! Email-specific types — deliveries, attachments, replies, address extraction.

use chrono::{DateTime, Utc};
use mail_parser::{MessageParser, MimeHeaders};

/// File extension that marks the delivered workbook.
pub const WORKBOOK_EXTENSION: &str = ".xlsx";

/// A spreadsheet attached to a delivery.
#[derive(Clone)]
pub struct Attachment {
    /// File name as declared by the sender.
    pub file_name: String,
    pub contents: Vec<u8>,
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("bytes", &self.contents.len())
            .finish()
    }
}

/// The newest inbox message carrying the subject keyword and a workbook.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// IMAP UID inside INBOX.
    pub uid: u32,
    /// Message-ID header, without angle brackets.
    pub message_id: Option<String>,
    /// Where replies go: Reply-To if present, otherwise From.
    pub reply_to: String,
    pub subject: String,
    pub received_at: DateTime<Utc>,
    pub attachment: Attachment,
}

impl Delivery {
    /// Stable identity used to remember processed deliveries.
    pub fn key(&self) -> String {
        self.message_id
            .clone()
            .unwrap_or_else(|| format!("uid-{}", self.uid))
    }
}

/// Approval reply content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalReply {
    pub cc: Vec<String>,
    pub body: String,
}

/// What a fetched message turned out to be.
#[derive(Debug)]
pub enum Candidate {
    /// Subject does not contain the keyword (IMAP search is case-insensitive).
    NotMatching,
    /// Subject matches but no workbook is attached.
    NoWorkbook { subject: String },
    Delivery(Delivery),
}

/// Classify one raw RFC 822 message against `keyword`.
pub fn parse_candidate(uid: u32, raw: &[u8], keyword: &str) -> Option<Candidate> {
    let parsed = MessageParser::default().parse(raw)?;
    let subject = parsed.subject().unwrap_or_default().to_string();
    if !subject.contains(keyword) {
        return Some(Candidate::NotMatching);
    }

    let attachment = parsed.attachments().find_map(|part| {
        let name = MimeHeaders::attachment_name(part)?;
        name.ends_with(WORKBOOK_EXTENSION).then(|| Attachment {
            file_name: name.to_string(),
            contents: part.contents().to_vec(),
        })
    });

    let Some(attachment) = attachment else {
        return Some(Candidate::NoWorkbook { subject });
    };

    let reply_to = extract_addresses(parsed.reply_to())
        .into_iter()
        .next()
        .or_else(|| extract_addresses(parsed.from()).into_iter().next())
        .unwrap_or_default();

    let received_at = parsed
        .date()
        .and_then(|d| DateTime::from_timestamp(d.to_timestamp(), 0))
        .unwrap_or_else(Utc::now);

    Some(Candidate::Delivery(Delivery {
        uid,
        message_id: parsed.message_id().map(|s| s.to_string()),
        reply_to,
        subject,
        received_at,
        attachment,
    }))
}

/// Extract email addresses from an optional mail_parser Address field.
///
/// Returns an empty vec if the address is None.
pub fn extract_addresses(addr: Option<&mail_parser::Address>) -> Vec<String> {
    let Some(addr) = addr else {
        return Vec::new();
    };
    match addr {
        mail_parser::Address::List(addrs) => addrs
            .iter()
            .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            .collect(),
        mail_parser::Address::Group(groups) => groups
            .iter()
            .flat_map(|g| {
                g.addresses
                    .iter()
                    .filter_map(|a| a.address.as_ref().map(|s| s.to_string()))
            })
            .collect(),
    }
}
