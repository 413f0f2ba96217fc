//! Lint and production build, executed as external commands.

use crate::core::coordinator::{Check, CheckContext};
use crate::core::error::DeployCheckError;
use crate::core::exec::{self, OutputMode};
use crate::core::verdict::{Status, Verdict};
use std::fs;
use std::time::Duration;

const OUTPUT_TAIL_LINES: usize = 15;

pub struct LintCheck;

impl Check for LintCheck {
    fn name(&self) -> &'static str {
        "lint"
    }

    fn title(&self) -> &'static str {
        "Lint"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.lint;
        let outcome = exec::run_with_timeout(
            &cfg.command,
            &ctx.root,
            Duration::from_secs(cfg.timeout_secs),
            OutputMode::Capture,
            Some(&ctx.cancel),
        )?;

        if outcome.success() {
            return Ok(Verdict::pass(
                self.name(),
                self.title(),
                format!("`{}` passed", exec::display_command(&cfg.command)),
            ));
        }

        let mut messages = vec![format!(
            "`{}` failed ({})",
            exec::display_command(&cfg.command),
            outcome.exit_label()
        )];
        messages.extend(outcome.output_tail(OUTPUT_TAIL_LINES));
        Ok(Verdict::fail(self.name(), self.title(), messages))
    }
}

pub struct BuildCheck;

impl Check for BuildCheck {
    fn name(&self) -> &'static str {
        "build"
    }

    fn title(&self) -> &'static str {
        "Production build"
    }

    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError> {
        let cfg = &ctx.config.build;
        let artifact = ctx.path(&cfg.artifact_dir);
        if cfg.clean_artifact && artifact.is_dir() {
            fs::remove_dir_all(&artifact)
                .map_err(|e| DeployCheckError::access(&artifact, e))?;
        }

        let command = exec::display_command(&cfg.command);
        let outcome = exec::run_with_timeout(
            &cfg.command,
            &ctx.root,
            Duration::from_secs(cfg.timeout_secs),
            OutputMode::Suppress,
            Some(&ctx.cancel),
        )?;
        if !outcome.success() {
            return Err(DeployCheckError::SubprocessFailure {
                command,
                detail: outcome.exit_label(),
            });
        }

        // Timing stays out of the messages so unchanged trees fingerprint alike.
        let timing = serde_json::json!({
            "elapsedSecs": outcome.elapsed.as_secs_f64(),
            "minDurationSecs": cfg.min_duration_secs,
        });
        let mut findings = Vec::new();
        if outcome.elapsed < Duration::from_secs(cfg.min_duration_secs) {
            findings.push((
                cfg.fast_build_severity.status(),
                format!(
                    "heuristic: build finished in under {}s; it may not have compiled anything",
                    cfg.min_duration_secs
                ),
            ));
        }
        if !artifact.is_dir() {
            findings.push((
                Status::Fail,
                format!("build did not produce {}", cfg.artifact_dir),
            ));
        }

        Ok(Verdict::from_findings(
            self.name(),
            self.title(),
            findings,
            &format!("`{}` completed", command),
        )
        .with_payload(timing))
    }
}
