//! Text rendering of check progress, run summaries and history.

use crate::core::coordinator::{Check, RunObserver};
use crate::core::output::{self, Style};
use crate::core::report::Report;
use crate::core::verdict::{Status, Verdict};

const RULE_WIDTH: usize = 60;

fn status_style(status: Status) -> Style {
    match status {
        Status::Pass => Style::Success,
        Status::Warn => Style::Warning,
        Status::Fail => Style::Error,
    }
}

pub fn print_banner(title: &str) {
    println!();
    println!("{}", output::styled(title, Style::Heading));
    println!("{}", output::styled(&output::rule(RULE_WIDTH), Style::Heading));
}

pub fn print_section(title: &str) {
    println!();
    println!("{}", output::styled(title, Style::Heading));
}

pub fn print_verdict(verdict: &Verdict) {
    let status = verdict.status;
    let label = format!("{} [{}]", status.icon(), status.label());
    println!(
        "  {} {}",
        output::styled(&label, status_style(status)),
        verdict.title
    );
    for message in &verdict.messages {
        println!("      {}", message);
    }
}

/// Prints a numbered heading before each check and its verdict afterwards.
pub struct ConsoleObserver;

impl RunObserver for ConsoleObserver {
    fn check_started(&mut self, index: usize, total: usize, check: &dyn Check) {
        print_section(&format!("Check {}/{}: {}", index + 1, total, check.title()));
    }

    fn check_finished(&mut self, _index: usize, verdict: &Verdict) {
        print_verdict(verdict);
    }

    fn cancelled(&mut self, remaining: usize) {
        println!();
        println!(
            "{}",
            output::styled(
                &format!("Run cancelled; {} check(s) not executed", remaining),
                Style::Warning
            )
        );
    }
}

pub fn print_report_summary(report: &Report) {
    let s = &report.summary;
    print_banner("Summary");
    println!(
        "  {} passed, {} warnings, {} failed ({} checks)",
        output::styled(&s.passed.to_string(), Style::Success),
        output::styled(&s.warned.to_string(), Style::Warning),
        output::styled(&s.failed.to_string(), Style::Error),
        s.total
    );

    let warnings: Vec<String> = report
        .verdicts
        .iter()
        .filter(|v| v.is_warn())
        .map(|v| format!("{}: {}", v.check, v.messages.join("; ")))
        .collect();
    if !warnings.is_empty() {
        println!(
            "  warnings: {}",
            output::preview_messages(&warnings, 3, 110)
        );
    }

    println!();
    if report.cancelled {
        println!(
            "{}",
            output::styled("Run was cancelled before all checks completed.", Style::Error)
        );
    } else if s.failed > 0 {
        println!(
            "{}",
            output::styled(
                &format!(
                    "Failing checks: {}. Fix them before deploying.",
                    report.failed_checks().join(", ")
                ),
                Style::Error
            )
        );
    } else if s.warned > 0 {
        println!(
            "{}",
            output::styled(
                "Warnings found, but nothing blocks the deploy.",
                Style::Warning
            )
        );
    } else {
        println!(
            "{}",
            output::styled("All checks passed. Ready to deploy.", Style::Success)
        );
    }
}

pub fn print_history(entries: &[Report]) {
    print_banner("Deploy check history");
    if entries.is_empty() {
        println!("  no runs recorded yet");
        return;
    }
    let mut previous: Option<&str> = None;
    for report in entries {
        let changed = match previous {
            Some(fp) if fp != report.fingerprint => "changed",
            Some(_) => "same",
            None => "",
        };
        let s = &report.summary;
        println!(
            "  {}  {}  pass={} warn={} fail={}  {} {}",
            report.generated_at,
            output::styled(report.status.label(), status_style(report.status)),
            s.passed,
            s.warned,
            s.failed,
            output::styled(&report.fingerprint[..12.min(report.fingerprint.len())], Style::Muted),
            changed
        );
        previous = Some(&report.fingerprint);
    }

    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        let delta = last.summary.failed as i64 - first.summary.failed as i64;
        let trend = match delta {
            d if d < 0 => output::styled(&format!("{} fewer failing check(s)", -d), Style::Success),
            d if d > 0 => output::styled(&format!("{} more failing check(s)", d), Style::Error),
            _ => output::styled("no change in failing checks", Style::Muted),
        };
        println!();
        println!("  trend over {} run(s): {}", entries.len(), trend);
    }
}
