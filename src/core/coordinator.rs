//! Check coordinator.
//!
//! Runs registered checks strictly in order, one at a time, and folds their
//! verdicts into a `Report`. Each check is isolated: an error or panic inside
//! it becomes a `fail` verdict and the remaining checks still run.
//!
//! State machine: `NotStarted -> Running { index } -> Completed`.
//! Cancellation is cooperative: the coordinator observes it between checks and
//! checks that run subprocesses poll it while waiting.

use crate::core::config::Config;
use crate::core::error::DeployCheckError;
use crate::core::output;
use crate::core::report::Report;
use crate::core::verdict::Verdict;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Read-only inputs shared by every check in a run.
#[derive(Debug, Clone)]
pub struct CheckContext {
    pub root: PathBuf,
    pub config: Config,
    /// Observed between checks and by long-running subprocesses.
    pub cancel: CancelToken,
}

impl CheckContext {
    pub fn new(root: impl Into<PathBuf>, config: Config) -> Self {
        CheckContext {
            root: root.into(),
            config,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }
}

pub trait Check {
    /// Stable identifier used by `--skip` and in reports.
    fn name(&self) -> &'static str;
    fn title(&self) -> &'static str;
    fn run(&self, ctx: &CheckContext) -> Result<Verdict, DeployCheckError>;
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    NotStarted,
    Running { index: usize },
    Completed,
}

/// Hooks for per-check console output.
pub trait RunObserver {
    fn check_started(&mut self, _index: usize, _total: usize, _check: &dyn Check) {}
    fn check_finished(&mut self, _index: usize, _verdict: &Verdict) {}
    fn cancelled(&mut self, _remaining: usize) {}
}

pub struct SilentObserver;

impl RunObserver for SilentObserver {}

pub struct Coordinator {
    checks: Vec<Box<dyn Check>>,
    state: CoordinatorState,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn run_isolated(check: &dyn Check, ctx: &CheckContext) -> Verdict {
    match panic::catch_unwind(AssertUnwindSafe(|| check.run(ctx))) {
        Ok(Ok(verdict)) => verdict,
        Ok(Err(err)) => Verdict::fail(check.name(), check.title(), vec![err.to_string()]),
        Err(payload) => Verdict::fail(
            check.name(),
            check.title(),
            vec![format!("check panicked: {}", panic_message(payload.as_ref()))],
        ),
    }
}

impl Coordinator {
    pub fn new(checks: Vec<Box<dyn Check>>) -> Self {
        Coordinator {
            checks,
            state: CoordinatorState::NotStarted,
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn run(&mut self, ctx: &CheckContext, observer: &mut dyn RunObserver) -> Report {
        let total = self.checks.len();
        let mut verdicts = Vec::with_capacity(total);
        let mut cancelled = false;

        for (index, check) in self.checks.iter().enumerate() {
            if ctx.cancel.is_cancelled() {
                cancelled = true;
                observer.cancelled(total - index);
                break;
            }
            self.state = CoordinatorState::Running { index };
            output::trace_check(check.name());
            observer.check_started(index, total, check.as_ref());

            let verdict = run_isolated(check.as_ref(), ctx);
            observer.check_finished(index, &verdict);
            verdicts.push(verdict);
        }

        self.state = CoordinatorState::Completed;
        Report::from_verdicts(verdicts, cancelled)
    }
}
