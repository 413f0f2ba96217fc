//! Asset audit and critical-asset presence.
//!
//! The audit scans the configured source directories for asset references,
//! lists the physical image inventory and reconciles the two. Its report is
//! overwritten on every run at `<report_dir>/asset-audit-report.json`.

use crate::core::config::Config;
use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::inventory::{AssetClass, AssetInventory};
use crate::core::reconcile::{self, MissingAsset};
use crate::core::refs::{ReferenceExtractor, ReferenceIndex};
use crate::core::report;
use crate::core::scan::Scanner;
use crate::core::verdict::{Status, Verdict};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const AUDIT_REPORT_FILE: &str = "asset-audit-report.json";

const MAX_LISTED: usize = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub total_references: usize,
    pub total_assets: usize,
    pub missing: usize,
    pub unused: usize,
    pub found: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnusedAsset {
    pub path: String,
    pub size_bytes: u64,
    pub class: AssetClass,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub summary: AuditSummary,
    pub inventory_dir: String,
    pub inventory_found: bool,
    pub scanned_files: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped_source_dirs: Vec<String>,
    pub missing_assets: Vec<MissingAsset>,
    pub unused_assets: Vec<UnusedAsset>,
    pub found_assets: Vec<String>,
    pub references_by_file: BTreeMap<String, Vec<String>>,
}

impl AuditReport {
    pub fn has_missing(&self) -> bool {
        self.summary.missing > 0
    }
}

fn collect_references(
    root: &Path,
    config: &Config,
) -> Result<(ReferenceIndex, usize, Vec<String>), DeployCheckError> {
    let project = &config.project;
    let extractor = ReferenceExtractor::new(&config.audit.reference_prefix);
    let mut index = ReferenceIndex::new();
    let mut scanned = 0usize;
    let mut skipped = Vec::new();

    for dir in &project.source_dirs {
        let source_root = root.join(dir);
        if !source_root.exists() {
            skipped.push(dir.clone());
            continue;
        }
        let scanner = Scanner::new(&source_root)
            .exclude(&project.exclude_dirs)
            .extensions(&project.source_extensions)
            .relative_to(root);
        for record in scanner.iter()? {
            let record = record?;
            let bytes = fs::read(&record.path)?;
            let content = String::from_utf8_lossy(&bytes);
            index.extend(extractor.extract_from(&record.relative, &content));
            scanned += 1;
        }
    }

    if !project.source_dirs.is_empty() && skipped.len() == project.source_dirs.len() {
        return Err(DeployCheckError::access(
            root,
            format!(
                "none of the source directories exist: {}",
                project.source_dirs.join(", ")
            ),
        ));
    }

    Ok((index, scanned, skipped))
}

/// Scan, inventory and reconcile. Pure with respect to the tree: running it
/// twice over an unchanged project yields an identical report.
pub fn run_audit(root: &Path, config: &Config) -> Result<AuditReport, DeployCheckError> {
    let (index, scanned_files, skipped_source_dirs) = collect_references(root, config)?;
    let audit = &config.audit;
    let inventory = AssetInventory::load(
        &root.join(&audit.images_dir),
        &audit.image_extensions,
        audit.recursive,
    )?;
    let rec = reconcile::reconcile(&index, &inventory);

    Ok(AuditReport {
        summary: AuditSummary {
            total_references: index.len(),
            total_assets: inventory.len(),
            missing: rec.missing.len(),
            unused: rec.unused.len(),
            found: rec.found.len(),
        },
        inventory_dir: audit.images_dir.clone(),
        inventory_found: inventory.exists(),
        scanned_files,
        skipped_source_dirs,
        missing_assets: rec.missing,
        unused_assets: rec
            .unused
            .into_iter()
            .map(|e| UnusedAsset {
                path: e.name,
                size_bytes: e.size,
                class: e.class,
            })
            .collect(),
        found_assets: rec.found,
        references_by_file: index.by_file().clone(),
    })
}

pub fn audit_report_path(root: &Path, config: &Config) -> PathBuf {
    config.report_dir(root).join(AUDIT_REPORT_FILE)
}

pub fn write_audit_report(
    root: &Path,
    config: &Config,
    audit: &AuditReport,
) -> Result<PathBuf, DeployCheckError> {
    let path = audit_report_path(root, config);
    report::write_json(&path, audit)?;
    Ok(path)
}

pub fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

fn listed<T>(items: &[T], render: impl Fn(&T) -> String) -> Vec<String> {
    let mut lines: Vec<String> = items.iter().take(MAX_LISTED).map(render).collect();
    if items.len() > MAX_LISTED {
        lines.push(format!("... and {} more", items.len() - MAX_LISTED));
    }
    lines
}

/// Verdict for an audit: missing assets fail, unused assets only warn.
pub fn audit_verdict(check: &str, title: &str, audit: &AuditReport) -> Verdict {
    let s = &audit.summary;
    let mut findings: Vec<(Status, String)> = Vec::new();

    if !audit.inventory_found {
        findings.push((
            Status::Warn,
            format!("inventory directory {} not found", audit.inventory_dir),
        ));
    }
    for dir in &audit.skipped_source_dirs {
        findings.push((Status::Warn, format!("source directory {} not found", dir)));
    }
    if s.missing > 0 {
        findings.push((
            Status::Fail,
            format!("{} referenced asset(s) missing:", s.missing),
        ));
        findings.extend(
            listed(&audit.missing_assets, |m| {
                format!("  {} (referenced in {})", m.path, m.referenced_in.join(", "))
            })
            .into_iter()
            .map(|l| (Status::Fail, l)),
        );
    }
    if s.unused > 0 {
        let bytes: u64 = audit.unused_assets.iter().map(|u| u.size_bytes).sum();
        findings.push((
            Status::Warn,
            format!("{} unused asset(s), {} total:", s.unused, format_kb(bytes)),
        ));
        findings.extend(
            listed(&audit.unused_assets, |u| {
                format!("  {} ({})", u.path, format_kb(u.size_bytes))
            })
            .into_iter()
            .map(|l| (Status::Warn, l)),
        );
    }

    // Informational notes alone must not downgrade a clean audit.
    if s.missing == 0 && s.unused == 0 {
        let mut verdict = Verdict::pass(
            check,
            title,
            format!(
                "{} reference(s) resolve to {} asset(s)",
                s.total_references, s.total_assets
            ),
        );
        for (_, note) in findings {
            verdict = verdict.with_message(note);
        }
        return verdict.with_payload(serde_json::json!(s));
    }

    Verdict::from_findings(check, title, findings, "").with_payload(serde_json::json!(s))
}

pub struct AssetAuditCheck;

impl Check for AssetAuditCheck {
    fn name(&self) -> &'static str {
        "asset-audit"
    }

    fn title(&self) -> &'static str {
        "Asset references"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let audit = run_audit(&ctx.root, &ctx.config)?;
        let path = write_audit_report(&ctx.root, &ctx.config, &audit)?;
        Ok(audit_verdict(self.name(), self.title(), &audit)
            .with_message(format!("report: {}", path.display())))
    }
}

pub struct CriticalAssetsCheck;

impl Check for CriticalAssetsCheck {
    fn name(&self) -> &'static str {
        "critical-assets"
    }

    fn title(&self) -> &'static str {
        "Critical assets"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let public = ctx.path("public");
        let missing: Vec<(Status, String)> = ctx
            .config
            .critical_assets
            .paths
            .iter()
            .filter(|p| !public.join(p.trim_start_matches('/')).is_file())
            .map(|p| (Status::Fail, format!("missing critical asset: public/{}", p)))
            .collect();
        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            missing,
            &format!(
                "all {} critical asset(s) present",
                ctx.config.critical_assets.paths.len()
            ),
        ))
    }
}
