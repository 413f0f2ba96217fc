//! Source-level scans: leftover log statements and content guards.

use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::output;
use crate::core::rules::{self, Severity};
use crate::core::scan::Scanner;
use crate::core::verdict::{Status, Verdict};
use serde::Serialize;
use std::fs;

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct LogFinding {
    pub file: String,
    pub line: usize,
    pub rule: String,
    pub content: String,
    #[serde(skip)]
    pub severity: Severity,
}

fn is_comment(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("//") || t.starts_with("/*") || t.starts_with('*')
}

pub struct LogStatementsCheck;

/// Findings plus the configured roots that did not exist.
#[derive(Debug, Default)]
pub struct LogScan {
    pub findings: Vec<LogFinding>,
    pub skipped_roots: Vec<String>,
}

impl LogStatementsCheck {
    pub fn scan(&self, ctx: &CheckContext) -> Result<LogScan, DeployCheckError> {
        let project = &ctx.config.project;
        let scan = &ctx.config.log_scan;
        let compiled = rules::compile_rules(&scan.rules)?;
        let mut out = LogScan::default();

        for root in &scan.roots {
            let dir = ctx.path(root);
            if !dir.is_dir() {
                out.skipped_roots.push(root.clone());
                continue;
            }
            let scanner = Scanner::new(&dir)
                .exclude(&project.exclude_dirs)
                .extensions(&project.source_extensions)
                .relative_to(&ctx.root);
            for record in scanner.iter()? {
                let record = record?;
                let bytes = fs::read(&record.path)?;
                let text = String::from_utf8_lossy(&bytes);
                for (idx, line) in text.lines().enumerate() {
                    if is_comment(line) {
                        continue;
                    }
                    for m in rules::match_rules(&compiled, line) {
                        out.findings.push(LogFinding {
                            file: record.relative.clone(),
                            line: idx + 1,
                            rule: m.rule.to_string(),
                            content: line.trim().to_string(),
                            severity: m.severity,
                        });
                    }
                }
            }
        }

        if !scan.roots.is_empty() && out.skipped_roots.len() == scan.roots.len() {
            return Err(DeployCheckError::access(
                &ctx.root,
                format!("none of the log scan roots exist: {}", scan.roots.join(", ")),
            ));
        }
        Ok(out)
    }
}

impl Check for LogStatementsCheck {
    fn name(&self) -> &'static str {
        "log-statements"
    }

    fn title(&self) -> &'static str {
        "Leftover log statements"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let scan = &ctx.config.log_scan;
        let LogScan {
            findings,
            skipped_roots,
        } = self.scan(ctx)?;
        let skipped: Vec<(Status, String)> = skipped_roots
            .iter()
            .map(|root| (Status::Warn, format!("log scan root {} not found", root)))
            .collect();

        if findings.is_empty() {
            return Ok(Verdict::from_findings(
                self.name(),
                self.title(),
                skipped,
                "no log statements found",
            ));
        }

        let mut listed = vec![format!("{} log statement(s) found:", findings.len())];
        listed.extend(findings.iter().take(scan.max_reported).map(|f| {
            format!(
                "{}:{}: {}",
                f.file,
                f.line,
                output::truncate_chars(&f.content, scan.max_line_chars)
            )
        }));
        if findings.len() > scan.max_reported {
            listed.push(format!("... and {} more", findings.len() - scan.max_reported));
        }

        let worst = findings
            .iter()
            .map(|f| f.severity.status())
            .max()
            .unwrap_or(Status::Warn)
            .max(Status::Warn);
        let mut entries: Vec<(Status, String)> =
            listed.into_iter().map(|m| (worst, m)).collect();
        entries.extend(skipped);

        let payload = serde_json::to_value(&findings)?;
        Ok(Verdict::from_findings(self.name(), self.title(), entries, "").with_payload(payload))
    }
}

pub struct ContentGuardsCheck;

impl Check for ContentGuardsCheck {
    fn name(&self) -> &'static str {
        "content-guards"
    }

    fn title(&self) -> &'static str {
        "Content guards"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let mut findings = Vec::new();
        let mut skipped = Vec::new();

        for guard in &ctx.config.guards {
            let path = ctx.path(&guard.file);
            if !path.is_file() {
                skipped.push(format!("[{}] {} not found, skipped", guard.name, guard.file));
                continue;
            }
            let content = fs::read_to_string(&path)?;
            let triggered = content.contains(guard.when_contains.as_str())
                && !guard
                    .unless_contains
                    .iter()
                    .any(|marker| content.contains(marker.as_str()));
            if triggered {
                findings.push((
                    guard.severity.status(),
                    format!("[{}] {}: {}", guard.name, guard.file, guard.message),
                ));
            }
        }

        let mut verdict = Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("{} guard(s) satisfied", ctx.config.guards.len() - skipped.len()),
        );
        for note in skipped {
            verdict = verdict.with_message(note);
        }
        Ok(verdict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, GuardRule};
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str, body: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, body).unwrap();
    }

    #[test]
    fn comment_lines_are_ignored() {
        assert!(is_comment("  // console.log(x)"));
        assert!(is_comment(" * console.log(x)"));
        assert!(is_comment("/* console.log */"));
        assert!(!is_comment("foo(); // console.log"));
    }

    #[test]
    fn reports_file_and_line_with_cap() {
        let tmp = tempdir().unwrap();
        let body: String = (0..7).map(|i| format!("console.log({});\n", i)).collect();
        touch(tmp.path(), "components/Noisy.jsx", &body);
        touch(tmp.path(), "node_modules/pkg/index.js", "console.log('vendor')");
        let ctx = CheckContext::new(tmp.path(), Config::default());

        let v = LogStatementsCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Warn);
        assert_eq!(v.messages[0], "7 log statement(s) found:");
        assert_eq!(v.messages[1], "components/Noisy.jsx:1: console.log(0);");
        assert_eq!(v.messages.last().unwrap(), "... and 2 more");
        assert_eq!(v.payload.unwrap().as_array().unwrap().len(), 7);
    }

    #[test]
    fn long_lines_are_truncated() {
        let tmp = tempdir().unwrap();
        let line = format!("console.warn('{}')", "x".repeat(100));
        touch(tmp.path(), "app/page.js", &line);
        let ctx = CheckContext::new(tmp.path(), Config::default());

        let v = LogStatementsCheck.run(&ctx).unwrap();
        let listed = v.messages[1].trim_start_matches("app/page.js:1: ");
        assert!(listed.chars().count() <= 63);
    }

    #[test]
    fn clean_sources_pass() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "app/page.js", "// console.log('debug')\nexport default 1;\n");
        let ctx = CheckContext::new(tmp.path(), Config::default());
        assert_eq!(LogStatementsCheck.run(&ctx).unwrap().status, Status::Pass);
    }

    #[test]
    fn missing_log_root_is_noted_as_warning() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "app/page.js", "export default 1;\n");
        let mut config = Config::default();
        config.log_scan.roots = vec!["app".to_string(), "src".to_string()];
        let ctx = CheckContext::new(tmp.path(), config);

        let v = LogStatementsCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Warn);
        assert_eq!(v.messages, vec!["log scan root src not found"]);
    }

    #[test]
    fn missing_log_root_is_listed_after_findings() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "app/page.js", "console.log(1);\n");
        let mut config = Config::default();
        config.log_scan.roots = vec!["app".to_string(), "lib".to_string()];
        let ctx = CheckContext::new(tmp.path(), config);

        let v = LogStatementsCheck.run(&ctx).unwrap();
        assert_eq!(v.status, Status::Warn);
        assert_eq!(v.messages[0], "1 log statement(s) found:");
        assert_eq!(v.messages.last().unwrap(), "log scan root lib not found");
    }

    #[test]
    fn all_log_roots_missing_is_access_error() {
        let tmp = tempdir().unwrap();
        let mut config = Config::default();
        config.log_scan.roots = vec!["src".to_string(), "lib".to_string()];
        let err = LogStatementsCheck
            .run(&CheckContext::new(tmp.path(), config))
            .unwrap_err();
        assert!(matches!(err, DeployCheckError::AccessError { .. }));
        assert!(err.to_string().contains("none of the log scan roots exist: src, lib"));
    }

    fn canvas_guard() -> GuardRule {
        GuardRule {
            name: "canvas-ssr".to_string(),
            file: "components/Scene.jsx".to_string(),
            when_contains: "<Canvas".to_string(),
            unless_contains: vec!["'use client'".to_string(), "\"use client\"".to_string()],
            message: "3D canvas must render on the client".to_string(),
            severity: Severity::Warn,
        }
    }

    #[test]
    fn guard_triggers_without_unless_marker() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "components/Scene.jsx", "return <Canvas />");
        let mut config = Config::default();
        config.guards.push(canvas_guard());
        let v = ContentGuardsCheck
            .run(&CheckContext::new(tmp.path(), config))
            .unwrap();
        assert_eq!(v.status, Status::Warn);
        assert!(v.messages[0].starts_with("[canvas-ssr]"));
    }

    #[test]
    fn guard_is_satisfied_by_marker_and_skips_absent_files() {
        let tmp = tempdir().unwrap();
        touch(tmp.path(), "components/Scene.jsx", "'use client'\nreturn <Canvas />");
        let mut config = Config::default();
        config.guards.push(canvas_guard());
        let mut absent = canvas_guard();
        absent.file = "components/Missing.jsx".to_string();
        config.guards.push(absent);

        let v = ContentGuardsCheck
            .run(&CheckContext::new(tmp.path(), config))
            .unwrap();
        assert_eq!(v.status, Status::Pass);
        assert_eq!(v.messages.len(), 2);
        assert!(v.messages[1].contains("skipped"));
    }
}
