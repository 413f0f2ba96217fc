//! Package manifest sanity: required fields and tracked dependency versions.

use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::verdict::{Status, Verdict};
use serde_json::{Map, Value as JsonValue};
use std::fs;

/// Resolve a dotted path such as `engines.node`.
fn lookup<'a>(doc: &'a JsonValue, dotted: &str) -> Option<&'a JsonValue> {
    dotted
        .split('.')
        .try_fold(doc, |node, key| node.as_object()?.get(key))
}

fn declared_version<'a>(doc: &'a JsonValue, dependency: &str) -> Option<&'a str> {
    ["dependencies", "devDependencies", "peerDependencies"]
        .iter()
        .filter_map(|section| doc.get(section)?.get(dependency)?.as_str())
        .next()
}

pub struct ManifestCheck;

impl Check for ManifestCheck {
    fn name(&self) -> &'static str {
        "manifest"
    }

    fn title(&self) -> &'static str {
        "Package manifest"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.manifest;
        let path = ctx.path(&cfg.file);
        let content = fs::read_to_string(&path).map_err(|e| DeployCheckError::access(&path, e))?;
        let doc: JsonValue =
            serde_json::from_str(&content).map_err(|e| DeployCheckError::parse(&path, e))?;

        let mut findings: Vec<(Status, String)> = cfg
            .required_fields
            .iter()
            .filter(|f| lookup(&doc, f).is_none())
            .map(|f| (Status::Warn, format!("`{}` is not declared in {}", f, cfg.file)))
            .collect();

        let mut versions = Map::new();
        let mut notes = Vec::new();
        for dep in &cfg.tracked_dependencies {
            if let Some(version) = declared_version(&doc, dep) {
                notes.push(format!("{} {}", dep, version));
                versions.insert(dep.clone(), JsonValue::String(version.to_string()));
            }
        }

        let verdict = if findings.is_empty() {
            let mut v = Verdict::pass(self.name(), self.title(), format!("{} is complete", cfg.file));
            for note in notes {
                v = v.with_message(note);
            }
            v
        } else {
            findings.extend(notes.into_iter().map(|n| (Status::Pass, n)));
            Verdict::from_findings(self.name(), self.title(), findings, "")
        };
        Ok(verdict.with_payload(JsonValue::Object(versions)))
    }
}
