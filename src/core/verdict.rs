//! Check outcomes.
//!
//! A `Verdict` is produced exactly once per check invocation and never mutated
//! afterwards; the builder methods consume `self`.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Warn,
    Fail,
}

impl Status {
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Status::Pass => "✅",
            Status::Warn => "⚠️",
            Status::Fail => "❌",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Verdict {
    pub check: String,
    pub title: String,
    pub status: Status,
    pub messages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<JsonValue>,
}

impl Verdict {
    fn new(check: &str, title: &str, status: Status, messages: Vec<String>) -> Self {
        Verdict {
            check: check.to_string(),
            title: title.to_string(),
            status,
            messages,
            payload: None,
        }
    }

    pub fn pass(check: &str, title: &str, message: impl Into<String>) -> Self {
        Self::new(check, title, Status::Pass, vec![message.into()])
    }

    pub fn warn(check: &str, title: &str, messages: Vec<String>) -> Self {
        Self::new(check, title, Status::Warn, messages)
    }

    pub fn fail(check: &str, title: &str, messages: Vec<String>) -> Self {
        Self::new(check, title, Status::Fail, messages)
    }

    /// Build a verdict from findings that each carry their own severity.
    ///
    /// The verdict takes the worst finding status; with no findings it passes
    /// with `ok_message`.
    pub fn from_findings(
        check: &str,
        title: &str,
        findings: Vec<(Status, String)>,
        ok_message: &str,
    ) -> Self {
        if findings.is_empty() {
            return Self::pass(check, title, ok_message);
        }
        let status = findings
            .iter()
            .map(|(s, _)| *s)
            .max()
            .unwrap_or(Status::Pass);
        let messages = findings.into_iter().map(|(_, m)| m).collect();
        Self::new(check, title, status, messages)
    }

    pub fn with_payload(mut self, payload: JsonValue) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn is_fail(&self) -> bool {
        self.status == Status::Fail
    }

    pub fn is_warn(&self) -> bool {
        self.status == Status::Warn
    }
}
