//! Server side of the contact form: validates a JSON submission and turns it into an HTML mail.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;

use anyhow::Context as _;
use serde_json::{Value, json};

use crate::contact::form::is_valid_email;
use crate::contact::html::{escape_html, nl2br, strip_tags};
use crate::foundation::error::{FolioError, FolioResult};

/// Incoming request as far as the relay cares.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayRequest {
    pub method: String,
    pub body: String,
}

impl RelayRequest {
    pub fn new(method: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            body: body.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct RelayResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RelayResponse {
    fn new(status: u16) -> Self {
        Self {
            status,
            headers: vec![
                ("Access-Control-Allow-Origin".to_owned(), "*".to_owned()),
                (
                    "Content-Type".to_owned(),
                    "application/json; charset=UTF-8".to_owned(),
                ),
            ],
            body: None,
        }
    }

    fn json(status: u16, value: &Value) -> Self {
        let mut response = Self::new(status);
        response.body = Some(value.to_string());
        response
    }

    fn error(status: u16, message: impl std::fmt::Display) -> Self {
        Self::json(status, &json!({ "error": message.to_string() }))
    }

    fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Client view of the response: a 2xx with a JSON body is success, anything else an error.
    pub fn into_result(self) -> FolioResult<Value> {
        let parsed = self
            .body
            .as_deref()
            .map(serde_json::from_str::<Value>)
            .transpose();
        match (self.is_success(), parsed) {
            (true, Ok(Some(value))) => Ok(value),
            (true, Ok(None)) => Err(FolioError::transport(format!(
                "status {} without a body",
                self.status
            ))),
            (true, Err(err)) => Err(FolioError::transport(format!(
                "status {} with a non-JSON body: {err}",
                self.status
            ))),
            (false, parsed) => {
                let detail = parsed
                    .ok()
                    .flatten()
                    .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_owned))
                    .unwrap_or_else(|| "no details".to_owned());
                Err(FolioError::transport(format!(
                    "relay answered {}: {detail}",
                    self.status
                )))
            }
        }
    }
}

/// Mail ready for delivery.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub from: String,
    pub reply_to: String,
    pub subject: String,
    pub html_body: String,
}

impl OutgoingMail {
    /// RFC 5322 style header block.
    pub fn header_block(&self) -> String {
        [
            "MIME-Version: 1.0".to_owned(),
            "Content-type: text/html; charset=utf-8".to_owned(),
            format!("To: {}", self.to),
            format!("From: {}", self.from),
            format!("Reply-To: {}", self.reply_to),
            format!("Subject: {}", self.subject),
        ]
        .join("\r\n")
    }
}

pub trait Mailer {
    fn deliver(&self, mail: &OutgoingMail) -> FolioResult<()>;
}

/// Keeps delivered mail in memory.
#[derive(Debug, Default)]
pub struct MemoryMailer {
    sent: RefCell<Vec<OutgoingMail>>,
    failing: Cell<bool>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every delivery while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.borrow().clone()
    }
}

impl Mailer for MemoryMailer {
    fn deliver(&self, mail: &OutgoingMail) -> FolioResult<()> {
        if self.failing.get() {
            return Err(FolioError::transport("mail could not be sent"));
        }
        self.sent.borrow_mut().push(mail.clone());
        Ok(())
    }
}

/// Writes each mail as an `.eml`-like HTML file into a directory.
#[derive(Debug)]
pub struct OutboxMailer {
    dir: PathBuf,
    counter: Cell<u64>,
}

impl OutboxMailer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            counter: Cell::new(0),
        }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }
}

impl Mailer for OutboxMailer {
    fn deliver(&self, mail: &OutgoingMail) -> FolioResult<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create outbox dir {}", self.dir.display()))?;
        let n = self.counter.get() + 1;
        self.counter.set(n);
        let path = self.dir.join(format!("mail-{n:04}.html"));
        let contents = format!("{}\r\n\r\n{}", mail.header_block(), mail.html_body);
        std::fs::write(&path, contents)
            .with_context(|| format!("write outbox mail {}", path.display()))?;
        tracing::info!(path = %path.display(), "mail written to outbox");
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RelaySettings {
    pub recipient: String,
    pub sender: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            recipient: "contact@example.com".to_owned(),
            sender: "noreply@example.com".to_owned(),
        }
    }
}

/// Handles contact requests and hands valid ones to a [`Mailer`].
#[derive(Debug)]
pub struct MailRelay<M> {
    settings: RelaySettings,
    mailer: M,
}

impl<M: Mailer> MailRelay<M> {
    pub fn new(settings: RelaySettings, mailer: M) -> Self {
        Self { settings, mailer }
    }

    pub fn mailer(&self) -> &M {
        &self.mailer
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    #[tracing::instrument(level = "debug", skip_all, fields(method = %request.method))]
    pub fn handle(&self, request: &RelayRequest) -> RelayResponse {
        let response = match request.method.to_ascii_uppercase().as_str() {
            "OPTIONS" => RelayResponse::new(200)
                .with_header("Access-Control-Allow-Methods", "POST, OPTIONS")
                .with_header("Access-Control-Allow-Headers", "Content-Type"),
            "POST" => self.handle_post(&request.body),
            _ => RelayResponse::error(405, "method not allowed").with_header("Allow", "POST"),
        };
        tracing::debug!(status = response.status, "relay response");
        response
    }

    fn handle_post(&self, body: &str) -> RelayResponse {
        if body.trim().is_empty() {
            return RelayResponse::error(400, "no data received");
        }
        let params: Value = match serde_json::from_str(body) {
            Ok(v) => v,
            Err(err) => return RelayResponse::error(400, format!("invalid JSON: {err}")),
        };
        if params.get("website").is_some_and(is_filled) {
            tracing::info!("honeypot filled; rejecting");
            return RelayResponse::error(400, "spam detected: honeypot field is filled");
        }

        let email = text_field(&params, "email").filter(|e| is_valid_email(e));
        let name = text_field(&params, "name").map(str::trim).filter(|s| !s.is_empty());
        let message = text_field(&params, "message").map(str::trim).filter(|s| !s.is_empty());
        let agreed = params.get("agreedToTerms") == Some(&Value::Bool(true));
        let (Some(email), Some(name), Some(message), true) = (email, name, message, agreed) else {
            return RelayResponse::error(400, "invalid input or consent not given");
        };

        let mail = self.compose(email.trim(), name, message);
        match self.mailer.deliver(&mail) {
            Ok(()) => RelayResponse::json(200, &json!({ "success": true })),
            Err(err) => {
                tracing::warn!(error = %err, "mail delivery failed");
                RelayResponse::error(500, "mail could not be sent")
            }
        }
    }

    fn compose(&self, email: &str, name: &str, message: &str) -> OutgoingMail {
        let email = escape_html(email);
        let name = escape_html(name);
        let message = nl2br(&escape_html(&strip_tags(message)));
        let html_body = format!(
            "<html>\n  <body>\n    <p><strong>From:</strong> {name} &lt;{email}&gt;</p>\n    \
             <p><strong>Message:</strong><br>{message}</p>\n    \
             <p><strong>Privacy policy accepted:</strong> yes</p>\n  </body>\n</html>\n"
        );
        OutgoingMail {
            to: self.settings.recipient.clone(),
            from: self.settings.sender.clone(),
            reply_to: email,
            subject: format!("New contact request from {}", header_safe(&name)),
            html_body,
        }
    }
}

/// Replaces control characters with spaces so a value cannot break out of its header line.
fn header_safe(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

fn text_field<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(Value::as_str)
}

/// Whether a honeypot value counts as filled in (empty strings, `"0"`, `false`, `0`, `null`
/// and empty collections do not).
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/contact/relay.rs"]
mod tests;
