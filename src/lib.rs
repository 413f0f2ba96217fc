//! deploycheck: pre-deployment verification for static-asset web projects.
//!
//! Before a site is shipped to a hosting platform, `deploycheck` audits the
//! project tree and answers one question: is this safe to deploy?
//!
//! # What it checks
//!
//! - **Asset references**: every `/images/...` path mentioned in source code
//!   must exist under `public/images`; files nobody references are reported as
//!   unused.
//! - **Deploy configuration**: framework config, package-manager settings and
//!   the platform descriptor are checked against data-driven rule tables.
//! - **SEO**: robots/sitemap files and layout metadata.
//! - **Hygiene**: leftover log statements, manifest fields, content guards.
//! - **Build**: lint and production build run as bounded subprocesses.
//!
//! # Examples
//!
//! ```bash
//! # Reconcile asset references with the image inventory
//! deploycheck audit
//!
//! # Run the full pre-deploy pipeline, skipping the slow build
//! deploycheck check --skip build
//!
//! # Show the recent run history
//! deploycheck history --limit 5
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: scanning, extraction, reconciliation, coordination, reporting
//! - [`checks`]: the individual pre-deploy checks and the default pipeline

pub mod checks;
pub mod core;

use checks::assets;
use core::{
    config::{self, Config},
    coordinator::{CancelToken, CheckContext, Coordinator, SilentObserver},
    error::DeployCheckError,
    output::{self, Style},
    render,
    report::History,
};

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(
    name = "deploycheck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Pre-deployment verification for static-asset web projects"
)]
struct Cli {
    /// Project root (defaults to the current directory).
    #[clap(long, global = true)]
    root: Option<PathBuf>,
    /// Configuration file (overrides DEPLOYCHECK_CONFIG and <root>/deploycheck.toml).
    #[clap(long, global = true)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reconcile asset references against the image inventory
    #[clap(name = "audit", visible_alias = "a")]
    Audit {
        #[clap(long, value_enum, default_value = "text")]
        format: Format,
        /// Do not write the audit report file.
        #[clap(long)]
        no_write: bool,
    },
    /// Run the full pre-deploy pipeline
    #[clap(name = "check", visible_alias = "c")]
    Check {
        #[clap(long, value_enum, default_value = "text")]
        format: Format,
        /// Skip a check by name (repeatable).
        #[clap(long = "skip", value_name = "NAME")]
        skip: Vec<String>,
        /// Do not append this run to the history file.
        #[clap(long)]
        no_history: bool,
    },
    /// Show recent pipeline runs and the failure trend
    #[clap(name = "history")]
    History {
        #[clap(long, value_enum, default_value = "text")]
        format: Format,
        #[clap(long, default_value = "10")]
        limit: usize,
    },
    /// Write a default deploycheck.toml
    #[clap(name = "init")]
    Init {
        /// Overwrite an existing configuration file.
        #[clap(long)]
        force: bool,
    },
    /// Show version information
    #[clap(name = "version")]
    Version,
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, DeployCheckError> {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    if !root.is_dir() {
        return Err(DeployCheckError::access(&root, "project root is not a directory"));
    }
    Ok(root)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), DeployCheckError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_audit_command(
    root: &Path,
    config: &Config,
    format: Format,
    no_write: bool,
) -> Result<u8, DeployCheckError> {
    let audit = assets::run_audit(root, config)?;
    let written = if no_write {
        None
    } else {
        Some(assets::write_audit_report(root, config, &audit)?)
    };

    if format == Format::Json {
        print_json(&audit)?;
    } else {
        render::print_banner("Asset audit");
        let verdict = assets::audit_verdict("asset-audit", "Asset references", &audit);
        render::print_verdict(&verdict);
        if let Some(path) = &written {
            println!();
            println!(
                "  {}",
                output::styled(&format!("report written to {}", path.display()), Style::Muted)
            );
        }
    }

    Ok(if audit.has_missing() { 1 } else { 0 })
}

fn run_check_command(
    root: &Path,
    config: Config,
    format: Format,
    skip: &[String],
    no_history: bool,
) -> Result<u8, DeployCheckError> {
    let unknown = checks::unknown_checks(skip);
    if !unknown.is_empty() {
        return Err(DeployCheckError::ConfigError(format!(
            "unknown check(s) in --skip: {} (known: {})",
            unknown.join(", "),
            checks::PIPELINE_ORDER.join(", ")
        )));
    }

    let token = CancelToken::new();
    let handler_token = token.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        eprintln!(
            "{}",
            output::styled(&format!("warning: Ctrl-C handler not installed: {}", e), Style::Warning)
        );
    }

    let pipeline = checks::default_pipeline(&config, skip);
    let history = History::new(&config.report_dir(root), config.history.limit);
    let ctx = CheckContext::new(root, config).with_cancel(token);
    let mut coordinator = Coordinator::new(pipeline);

    let report = if format == Format::Json {
        coordinator.run(&ctx, &mut SilentObserver)
    } else {
        render::print_banner("Pre-deploy checks");
        coordinator.run(&ctx, &mut render::ConsoleObserver)
    };

    if format == Format::Json {
        print_json(&report)?;
    } else {
        render::print_report_summary(&report);
    }

    // A broken history file must not cost the run its result.
    if !no_history
        && let Err(e) = history.append(&report)
    {
        eprintln!(
            "{}",
            output::styled(
                &format!("warning: run not recorded in history: {}", e),
                Style::Warning
            )
        );
    }
    Ok(report.exit_code as u8)
}

fn run_history_command(
    root: &Path,
    config: &Config,
    format: Format,
    limit: usize,
) -> Result<u8, DeployCheckError> {
    let history = History::new(&config.report_dir(root), config.history.limit);
    let entries = history.load()?;
    let start = entries.len().saturating_sub(limit);
    let recent = &entries[start..];
    if format == Format::Json {
        print_json(&recent)?;
    } else {
        render::print_history(recent);
    }
    Ok(0)
}

fn run_init_command(root: &Path, force: bool) -> Result<u8, DeployCheckError> {
    let path = root.join(config::CONFIG_FILE);
    if path.exists() && !force {
        return Err(DeployCheckError::ConfigError(format!(
            "{} already exists; pass --force to overwrite",
            path.display()
        )));
    }
    fs::write(&path, Config::default_toml()?)?;
    println!(
        "{}",
        output::styled(&format!("wrote {}", path.display()), Style::Success)
    );
    Ok(0)
}

/// Parse the command line, run the selected command and return its exit code.
pub fn run() -> Result<u8, DeployCheckError> {
    let cli = Cli::parse();

    if let Command::Version = cli.command {
        println!("v{}", env!("CARGO_PKG_VERSION"));
        return Ok(0);
    }

    let root = resolve_root(cli.root)?;
    if let Command::Init { force } = cli.command {
        return run_init_command(&root, force);
    }

    let config = Config::load(&root, cli.config.as_deref())?;
    match cli.command {
        Command::Audit { format, no_write } => run_audit_command(&root, &config, format, no_write),
        Command::Check {
            format,
            skip,
            no_history,
        } => run_check_command(&root, config, format, &skip, no_history),
        Command::History { format, limit } => run_history_command(&root, &config, format, limit),
        Command::Init { .. } | Command::Version => Ok(0),
    }
}
