//! Report mail: MIME rendering, a minimal SMTP client and the retry policy.

use std::fs;
use std::io::{self, BufRead, BufReader, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use base64::{Engine as _, engine::general_purpose};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Subject prefix of the fallback message.
pub const FALLBACK_SUBJECT_PREFIX: &str = "[ERROR] ";

/// Body of the fallback message sent when the full report could not be mailed.
pub const FALLBACK_BODY: &str = "The validation report could not be sent by mail.\n\
Reports are available in the campaign destination directory.\n";

const BASE64_LINE: usize = 76;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MailError {
    #[error("failed to connect to {server}: {source}")]
    Connect {
        server: String,
        #[source]
        source: io::Error,
    },

    #[error("SMTP I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("SMTP server rejected `{command}`: {reply}")]
    Rejected { command: String, reply: String },

    #[error("failed to read attachment {path}: {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no recipients")]
    NoRecipients,
}

/// SMTP server and sender address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailSettings {
    pub server: String,
    pub port: u16,
    pub from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            server: "localhost".to_string(),
            port: 25,
            from: "autovnv@localhost".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

impl MailMessage {
    /// Degraded copy: error subject, fixed body, no attachments.
    #[must_use]
    pub fn fallback(&self) -> Self {
        Self {
            from: self.from.clone(),
            to: self.to.clone(),
            subject: format!("{FALLBACK_SUBJECT_PREFIX}{}", self.subject),
            body: FALLBACK_BODY.to_string(),
            attachments: Vec::new(),
        }
    }
}

/// Render a multipart/mixed message with CRLF line endings.
///
/// Attachments are read from disk and base64 encoded.
pub fn render_message(
    message: &MailMessage,
    date: &str,
    boundary: &str,
) -> Result<String, MailError> {
    let mut out = String::new();
    push_line(&mut out, &format!("From: {}", message.from));
    push_line(&mut out, &format!("To: {}", message.to.join(", ")));
    push_line(&mut out, &format!("Date: {date}"));
    push_line(&mut out, &format!("Subject: {}", message.subject));
    push_line(&mut out, "MIME-Version: 1.0");
    push_line(
        &mut out,
        &format!("Content-Type: multipart/mixed; boundary=\"{boundary}\""),
    );
    push_line(&mut out, "");

    push_line(&mut out, &format!("--{boundary}"));
    push_line(&mut out, "Content-Type: text/plain; charset=utf-8");
    push_line(&mut out, "Content-Transfer-Encoding: 8bit");
    push_line(&mut out, "");
    for line in message.body.lines() {
        push_line(&mut out, line);
    }

    for path in &message.attachments {
        let bytes = fs::read(path).map_err(|source| MailError::Attachment {
            path: path.clone(),
            source,
        })?;
        let name = attachment_name(path);
        push_line(&mut out, &format!("--{boundary}"));
        push_line(&mut out, "Content-Type: application/octet-stream");
        push_line(&mut out, "Content-Transfer-Encoding: base64");
        push_line(
            &mut out,
            &format!("Content-Disposition: attachment; filename=\"{name}\""),
        );
        push_line(&mut out, "");
        let encoded = general_purpose::STANDARD.encode(&bytes);
        for chunk in encoded.as_bytes().chunks(BASE64_LINE) {
            push_line(&mut out, &String::from_utf8_lossy(chunk));
        }
    }
    push_line(&mut out, &format!("--{boundary}--"));
    Ok(out)
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push_str("\r\n");
}

fn attachment_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string())
}

/// Sends one message.
pub trait MailTransport {
    fn send(&mut self, message: &MailMessage) -> Result<(), MailError>;
}

/// Plain SMTP client: one connection per message, no authentication.
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    settings: MailSettings,
    helo: String,
}

impl SmtpTransport {
    #[must_use]
    pub fn new(settings: MailSettings, helo: impl Into<String>) -> Self {
        Self {
            settings,
            helo: helo.into(),
        }
    }

    fn server(&self) -> String {
        format!("{}:{}", self.settings.server, self.settings.port)
    }
}

impl MailTransport for SmtpTransport {
    fn send(&mut self, message: &MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }
        let date = chrono::Local::now().to_rfc2822();
        let boundary = format!(
            "casekit-{}-{}",
            std::process::id(),
            chrono::Utc::now().timestamp_micros()
        );
        let payload = render_message(message, &date, &boundary)?;

        let server = self.server();
        let stream = TcpStream::connect(&server).map_err(|source| MailError::Connect {
            server: server.clone(),
            source,
        })?;
        let mut session = SmtpSession {
            reader: BufReader::new(stream.try_clone()?),
            writer: stream,
        };

        session.expect("connect", &[220])?;
        session.command(&format!("HELO {}", self.helo), &[250])?;
        session.command(&format!("MAIL FROM:<{}>", message.from), &[250])?;
        for recipient in &message.to {
            session.command(&format!("RCPT TO:<{recipient}>"), &[250, 251])?;
        }
        session.command("DATA", &[354])?;
        session.data(&payload)?;
        session.command("QUIT", &[221])?;
        info!(server = %server, recipients = message.to.len(), "report mail sent");
        Ok(())
    }
}

struct SmtpSession {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl SmtpSession {
    fn command(&mut self, line: &str, accepted: &[u16]) -> Result<String, MailError> {
        debug!(command = line, "smtp");
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\r\n")?;
        self.writer.flush()?;
        self.expect(line, accepted)
    }

    fn data(&mut self, payload: &str) -> Result<String, MailError> {
        for line in payload.split("\r\n") {
            if line.starts_with('.') {
                self.writer.write_all(b".")?;
            }
            self.writer.write_all(line.as_bytes())?;
            self.writer.write_all(b"\r\n")?;
        }
        self.writer.write_all(b".\r\n")?;
        self.writer.flush()?;
        self.expect("end of data", &[250])
    }

    /// Read a possibly multi-line reply and check its code.
    fn expect(&mut self, command: &str, accepted: &[u16]) -> Result<String, MailError> {
        // Continuation lines look like `250-...`; the last one is `250 ...`.
        let reply = loop {
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Err(MailError::Rejected {
                    command: command.to_string(),
                    reply: "connection closed".to_string(),
                });
            }
            let line = line.trim_end();
            if line.as_bytes().get(3) != Some(&b'-') {
                break line.to_string();
            }
        };
        let code = reply.get(..3).and_then(|code| code.parse::<u16>().ok());
        match code {
            Some(code) if accepted.contains(&code) => Ok(reply),
            _ => Err(MailError::Rejected {
                command: command.to_string(),
                reply,
            }),
        }
    }
}

/// How the report ended up being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MailDelivery {
    Sent,
    /// The full message failed; the fallback message was accepted.
    SentFallback { first_error: String },
}

/// Send the full report, then the fallback message if that fails.
///
/// # Errors
///
/// Returns the fallback failure when both attempts fail.
pub fn send_report(
    transport: &mut dyn MailTransport,
    message: &MailMessage,
) -> Result<MailDelivery, MailError> {
    match transport.send(message) {
        Ok(()) => Ok(MailDelivery::Sent),
        Err(first) => {
            warn!(error = %first, "report mail failed, sending fallback message");
            transport.send(&message.fallback())?;
            Ok(MailDelivery::SentFallback {
                first_error: first.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(attachments: Vec<PathBuf>) -> MailMessage {
        MailMessage {
            from: "autovnv@localhost".to_string(),
            to: vec!["a@example.org".to_string(), "b@example.org".to_string()],
            subject: "Code_Saturne. Auto V&V 2026-10-18".to_string(),
            body: "line one\nline two\n".to_string(),
            attachments,
        }
    }

    #[test]
    fn render_includes_headers_body_and_attachment() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("report_global.txt");
        fs::write(&report, "hello").expect("write report");

        let text = render_message(&message(vec![report]), "Sun, 18 Oct 2026 10:00:00 +0000", "XYZ")
            .expect("render");

        assert!(text.contains("To: a@example.org, b@example.org\r\n"));
        assert!(text.contains("Content-Type: multipart/mixed; boundary=\"XYZ\"\r\n"));
        assert!(text.contains("line one\r\nline two\r\n"));
        assert!(text.contains("Content-Disposition: attachment; filename=\"report_global.txt\""));
        assert!(text.contains("aGVsbG8=\r\n"));
        assert!(text.ends_with("--XYZ--\r\n"));
    }

    #[test]
    fn render_fails_on_missing_attachment() {
        let err = render_message(&message(vec![PathBuf::from("/nonexistent/r.txt")]), "d", "b")
            .expect_err("missing attachment");
        assert!(matches!(err, MailError::Attachment { .. }));
    }

    #[test]
    fn long_attachments_wrap_at_76_columns() {
        let dir = tempfile::tempdir().expect("temp dir");
        let report = dir.path().join("big.txt");
        fs::write(&report, vec![b'x'; 300]).expect("write");
        let text = render_message(&message(vec![report]), "d", "b").expect("render");
        assert!(text.split("\r\n").all(|line| line.len() <= 76 || line.starts_with("Content-")));
    }

    #[test]
    fn fallback_drops_attachments_and_prefixes_subject() {
        let fallback = message(vec![PathBuf::from("r.txt")]).fallback();
        assert_eq!(fallback.subject, "[ERROR] Code_Saturne. Auto V&V 2026-10-18");
        assert_eq!(fallback.body, FALLBACK_BODY);
        assert!(fallback.attachments.is_empty());
    }
}
