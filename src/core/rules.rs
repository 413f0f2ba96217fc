//! Data-driven pattern rules.
//!
//! Rule tables come from configuration as `{name, pattern, severity, message}`
//! and are compiled once per check run. Every rule is evaluated independently,
//! so one text can trip several rules.

use crate::core::error::DeployCheckError;
use crate::core::verdict::Status;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warn,
    Fail,
}

impl Severity {
    pub fn status(self) -> Status {
        match self {
            Severity::Warn => Status::Warn,
            Severity::Fail => Status::Fail,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PatternRule {
    pub name: String,
    pub pattern: String,
    pub severity: Severity,
    pub message: String,
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str, severity: Severity, message: &str) -> Self {
        PatternRule {
            name: name.to_string(),
            pattern: pattern.to_string(),
            severity,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub regex: Regex,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleMatch<'r> {
    pub rule: &'r str,
    pub matched: String,
    pub severity: Severity,
    pub message: &'r str,
}

pub fn compile_rules(rules: &[PatternRule]) -> Result<Vec<CompiledRule>, DeployCheckError> {
    rules
        .iter()
        .map(|r| {
            let regex = Regex::new(&r.pattern).map_err(|e| {
                DeployCheckError::ConfigError(format!("rule '{}' has invalid pattern: {}", r.name, e))
            })?;
            Ok(CompiledRule {
                name: r.name.clone(),
                regex,
                severity: r.severity,
                message: r.message.clone(),
            })
        })
        .collect()
}

/// Evaluate every rule against `text`; one match per rule (the first
/// occurrence), in rule order.
pub fn match_rules<'r>(rules: &'r [CompiledRule], text: &str) -> Vec<RuleMatch<'r>> {
    rules
        .iter()
        .filter_map(|rule| {
            rule.regex.find(text).map(|m| RuleMatch {
                rule: &rule.name,
                matched: m.as_str().to_string(),
                severity: rule.severity,
                message: &rule.message,
            })
        })
        .collect()
}
