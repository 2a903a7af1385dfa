//! Email mailbox — IMAP over TLS for deliveries, SMTP via lettre for replies.

use std::io::{BufRead, BufReader, Read, Write as IoWrite};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox as Address;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use rustls_pki_types::ServerName;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::channels::Mailbox;
use crate::channels::email_types::{ApprovalReply, Candidate, Delivery, parse_candidate};
use crate::error::{ChannelError, ConfigError};

// ── Configuration ───────────────────────────────────────────────────

/// Email configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub imap_host: String,
    pub imap_port: u16,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
}

impl EmailConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
        };
        let port = |key: &str, default: u16| -> Result<u16, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected a port number, got {raw:?}"),
                }),
            }
        };

        let imap_host = required("EMAIL_IMAP_HOST")?;
        let imap_port = port("EMAIL_IMAP_PORT", 993)?;
        let smtp_host = lookup("EMAIL_SMTP_HOST").unwrap_or_else(|| imap_host.replace("imap", "smtp"));
        let smtp_port = port("EMAIL_SMTP_PORT", 587)?;
        let username = required("EMAIL_USERNAME")?;
        let password = SecretString::from(required("EMAIL_PASSWORD")?);
        let from_address = lookup("EMAIL_FROM_ADDRESS").unwrap_or_else(|| username.clone());

        Ok(Self {
            imap_host,
            imap_port,
            smtp_host,
            smtp_port,
            username,
            password,
            from_address,
        })
    }
}

// ── Channel ─────────────────────────────────────────────────────────

/// IMAP/SMTP mailbox.
pub struct EmailChannel {
    config: EmailConfig,
}

impl EmailChannel {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    /// Send the approval reply via SMTP.
    fn send_email(&self, email: &Message) -> Result<(), ChannelError> {
        let creds = Credentials::new(
            self.config.username.clone(),
            self.config.password.expose_secret().to_string(),
        );

        let builder = if self.config.smtp_port == 465 {
            SmtpTransport::relay(&self.config.smtp_host)
        } else {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
        };
        let transport = builder
            .map_err(|e| ChannelError::SendFailed(format!("SMTP relay error: {e}")))?
            .port(self.config.smtp_port)
            .credentials(creds)
            .build();

        transport
            .send(email)
            .map_err(|e| ChannelError::SendFailed(format!("SMTP send failed: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl Mailbox for EmailChannel {
    fn name(&self) -> &str {
        "email"
    }

    async fn latest_delivery(&self, keyword: &str) -> Result<Option<Delivery>, ChannelError> {
        let cfg = self.config.clone();
        let keyword = keyword.to_string();
        tokio::task::spawn_blocking(move || fetch_latest_delivery(&cfg, &keyword))
            .await
            .map_err(|e| ChannelError::FetchFailed(format!("IMAP task panicked: {e}")))?
    }

    async fn send_reply(
        &self,
        delivery: &Delivery,
        reply: &ApprovalReply,
    ) -> Result<(), ChannelError> {
        let email = build_reply(&self.config.from_address, delivery, reply)?;
        let channel = EmailChannel::new(self.config.clone());
        tokio::task::spawn_blocking(move || channel.send_email(&email))
            .await
            .map_err(|e| ChannelError::SendFailed(format!("SMTP task panicked: {e}")))??;

        info!(to = %delivery.reply_to, cc = reply.cc.len(), "Approval reply sent");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let cfg = self.config.clone();
        let ok = tokio::task::spawn_blocking(move || {
            TcpStream::connect((&*cfg.imap_host, cfg.imap_port)).is_ok()
        })
        .await
        .unwrap_or(false);

        if ok {
            Ok(())
        } else {
            Err(ChannelError::HealthCheckFailed {
                host: self.config.imap_host.clone(),
            })
        }
    }
}

// ── Helpers (public for testing) ────────────────────────────────────

/// Build the threaded approval reply to `delivery`.
pub fn build_reply(
    from: &str,
    delivery: &Delivery,
    reply: &ApprovalReply,
) -> Result<Message, ChannelError> {
    let parse = |addr: &str| -> Result<Address, ChannelError> {
        addr.parse()
            .map_err(|e| ChannelError::SendFailed(format!("Invalid address {addr:?}: {e}")))
    };

    let mut builder = Message::builder()
        .from(parse(from)?)
        .to(parse(&delivery.reply_to)?)
        .subject(format!("Re: {}", delivery.subject));

    for cc in &reply.cc {
        builder = builder.cc(parse(cc)?);
    }

    if let Some(id) = &delivery.message_id {
        builder = builder
            .in_reply_to(format!("<{id}>"))
            .references(format!("<{id}>"));
    }

    builder
        .header(ContentType::TEXT_PLAIN)
        .body(reply.body.clone())
        .map_err(|e| ChannelError::SendFailed(format!("Failed to build email: {e}")))
}

/// Size of an IMAP literal announced at the end of a response line (`{123}`).
pub fn literal_len(line: &str) -> Option<usize> {
    let line = line.trim_end_matches(['\r', '\n']);
    let body = line.strip_suffix('}')?;
    let open = body.rfind('{')?;
    body[open + 1..].parse().ok()
}

/// UIDs listed in `* SEARCH` response lines.
pub fn parse_search(lines: &[String]) -> Vec<u32> {
    lines
        .iter()
        .filter_map(|l| l.strip_prefix("* SEARCH"))
        .flat_map(|rest| rest.split_whitespace().filter_map(|n| n.parse().ok()))
        .collect()
}

/// Quote a string for an IMAP command.
pub fn imap_quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Subject search, split for keywords that cannot travel in a quoted string.
#[derive(Debug, PartialEq, Eq)]
pub enum SearchCommand {
    /// Whole command; the keyword is 7-bit and quoted inline.
    Quoted(String),
    /// Command prefix, then the UTF-8 keyword sent as a literal.
    Literal { prefix: String, keyword: Vec<u8> },
}

/// Build the `UID SEARCH SUBJECT` command for `keyword`.
pub fn search_command(keyword: &str) -> SearchCommand {
    if keyword.is_ascii() {
        SearchCommand::Quoted(format!("UID SEARCH SUBJECT {}", imap_quote(keyword)))
    } else {
        SearchCommand::Literal {
            prefix: "UID SEARCH CHARSET UTF-8 SUBJECT".into(),
            keyword: keyword.as_bytes().to_vec(),
        }
    }
}

// ── IMAP session ────────────────────────────────────────────────────

type TlsStream = rustls::StreamOwned<rustls::ClientConnection, TcpStream>;

/// Tagged response to one IMAP command.
struct ImapResponse {
    lines: Vec<String>,
    literals: Vec<Vec<u8>>,
    ok: bool,
}

/// Minimal blocking IMAP client. Run inside spawn_blocking.
struct ImapSession {
    reader: BufReader<TlsStream>,
    next_tag: u32,
}

impl ImapSession {
    fn connect(config: &EmailConfig) -> Result<Self, ChannelError> {
        let connect_err = |reason: String| ChannelError::ConnectFailed {
            host: config.imap_host.clone(),
            reason,
        };

        let tcp = TcpStream::connect((&*config.imap_host, config.imap_port))
            .map_err(|e| connect_err(e.to_string()))?;
        tcp.set_read_timeout(Some(Duration::from_secs(30)))
            .map_err(|e| connect_err(e.to_string()))?;

        let mut root_store = rustls::RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        let tls_config = Arc::new(
            rustls::ClientConfig::builder()
                .with_root_certificates(root_store)
                .with_no_client_auth(),
        );
        let server_name = ServerName::try_from(config.imap_host.clone())
            .map_err(|e| connect_err(e.to_string()))?;
        let conn = rustls::ClientConnection::new(tls_config, server_name)
            .map_err(|e| connect_err(e.to_string()))?;

        let mut session = Self {
            reader: BufReader::new(rustls::StreamOwned::new(conn, tcp)),
            next_tag: 1,
        };

        let greeting = session.read_line()?;
        debug!(greeting = %greeting.trim_end(), "IMAP connected");
        Ok(session)
    }

    fn read_line(&mut self) -> Result<String, ChannelError> {
        let mut buf = Vec::new();
        let n = self
            .reader
            .read_until(b'\n', &mut buf)
            .map_err(|e| ChannelError::FetchFailed(e.to_string()))?;
        if n == 0 {
            return Err(ChannelError::FetchFailed("IMAP connection closed".into()));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    fn command(&mut self, cmd: &str) -> Result<ImapResponse, ChannelError> {
        let tag = self.next_tag();
        self.write(format!("{tag} {cmd}\r\n").as_bytes())?;
        self.read_response(&tag)
    }

    /// Send `cmd` followed by `literal` as a synchronizing literal.
    fn command_with_literal(
        &mut self,
        cmd: &str,
        literal: &[u8],
    ) -> Result<ImapResponse, ChannelError> {
        let tag = self.next_tag();
        self.write(format!("{tag} {cmd} {{{}}}\r\n", literal.len()).as_bytes())?;

        let ready = self.read_line()?;
        if !ready.starts_with('+') {
            return Err(ChannelError::FetchFailed(format!(
                "server refused literal: {}",
                ready.trim_end()
            )));
        }

        let mut rest = literal.to_vec();
        rest.extend_from_slice(b"\r\n");
        self.write(&rest)?;
        self.read_response(&tag)
    }

    fn next_tag(&mut self) -> String {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;
        tag
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        let stream = self.reader.get_mut();
        stream
            .write_all(bytes)
            .and_then(|_| stream.flush())
            .map_err(|e| ChannelError::FetchFailed(e.to_string()))
    }

    fn read_response(&mut self, tag: &str) -> Result<ImapResponse, ChannelError> {
        let mut response = ImapResponse {
            lines: Vec::new(),
            literals: Vec::new(),
            ok: false,
        };
        let done_prefix = format!("{tag} ");

        loop {
            let line = self.read_line()?;
            if let Some(len) = literal_len(&line) {
                let mut literal = vec![0u8; len];
                self.reader
                    .read_exact(&mut literal)
                    .map_err(|e| ChannelError::FetchFailed(e.to_string()))?;
                response.literals.push(literal);
            }
            if let Some(status) = line.strip_prefix(&done_prefix) {
                response.ok = status.starts_with("OK");
                response.lines.push(line);
                return Ok(response);
            }
            response.lines.push(line);
        }
    }
}

/// Find the newest delivery in INBOX (blocking, run in spawn_blocking).
///
/// Only the newest message whose subject contains `keyword` counts. If it
/// carries no workbook there is no delivery; older messages are not tried.
fn fetch_latest_delivery(
    config: &EmailConfig,
    keyword: &str,
) -> Result<Option<Delivery>, ChannelError> {
    let mut session = ImapSession::connect(config)?;

    let login = session.command(&format!(
        "LOGIN {} {}",
        imap_quote(&config.username),
        imap_quote(config.password.expose_secret())
    ))?;
    if !login.ok {
        return Err(ChannelError::AuthFailed {
            username: config.username.clone(),
        });
    }

    // EXAMINE keeps the mailbox read-only, so nothing is marked \Seen.
    if !session.command("EXAMINE \"INBOX\"")?.ok {
        return Err(ChannelError::FetchFailed("cannot open INBOX".into()));
    }

    let search = match search_command(keyword) {
        SearchCommand::Quoted(cmd) => session.command(&cmd)?,
        SearchCommand::Literal { prefix, keyword } => {
            session.command_with_literal(&prefix, &keyword)?
        }
    };
    if !search.ok {
        return Err(ChannelError::FetchFailed("SEARCH rejected".into()));
    }

    let mut uids = parse_search(&search.lines);
    uids.sort_unstable_by(|a, b| b.cmp(a));
    debug!(candidates = uids.len(), "Subject search finished");

    let mut found = None;
    for uid in uids {
        let fetch = session.command(&format!("UID FETCH {uid} BODY.PEEK[]"))?;
        let Some(raw) = fetch.literals.into_iter().next() else {
            warn!(uid, "FETCH returned no message body");
            continue;
        };

        match parse_candidate(uid, &raw, keyword) {
            None => {
                return Err(ChannelError::InvalidMessage(format!(
                    "message UID {uid} could not be parsed"
                )));
            }
            Some(Candidate::NotMatching) => continue,
            Some(Candidate::NoWorkbook { subject }) => {
                info!(uid, subject = %subject, "Newest matching message has no workbook attached");
                break;
            }
            Some(Candidate::Delivery(delivery)) => {
                info!(
                    uid,
                    subject = %delivery.subject,
                    attachment = %delivery.attachment.file_name,
                    received = %delivery.received_at,
                    "Found delivery"
                );
                found = Some(delivery);
                break;
            }
        }
    }

    if let Err(e) = session.command("LOGOUT") {
        debug!("IMAP logout failed: {e}");
    }
    Ok(found)
}

// ── Tests ───────────────────────────────────────────────────────────
