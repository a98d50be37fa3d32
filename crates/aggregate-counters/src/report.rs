//! Step outcomes and the run report.
//!
//! A run is a tree of named steps. A step collects non-fatal check
//! failures in [`Checks`] and ends either normally or with a fatal
//! [`AggTestError`]; both end up in its [`StepOutcome`]. A failed child
//! fails its parent, but siblings still run.

use std::fmt;

use tracing::{info, warn};

use crate::error::{AggTestError, AggTestResult};

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(Vec<String>),
    Skipped(String),
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed(_))
    }
}

/// Accumulated non-fatal check failures of a step.
#[derive(Debug, Default)]
pub struct Checks {
    failures: Vec<String>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(%message, "check failed");
        self.failures.push(message);
    }

    /// Records a failure unless `ok`.
    pub fn check(&mut self, ok: bool, message: impl FnOnce() -> String) {
        if !ok {
            self.fail(message());
        }
    }

    /// Records `result`'s error, if any, and keeps going.
    pub fn soft<T>(&mut self, result: AggTestResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.fail(e.to_string());
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }
}

/// One named step and its sub-steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub outcome: StepOutcome,
    pub children: Vec<StepReport>,
}

impl StepReport {
    /// Creates a step that has not failed yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: StepOutcome::Passed,
            children: Vec::new(),
        }
    }

    /// Creates a skipped step.
    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        let step = Self {
            name: name.into(),
            outcome: StepOutcome::Skipped(reason.into()),
            children: Vec::new(),
        };
        info!(step = %step.name, "skipped");
        step
    }

    /// Runs a leaf step: `body` records non-fatal failures in its
    /// [`Checks`], and an `Err` return ends the step.
    pub async fn run<F, Fut>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(Checks) -> Fut,
        Fut: std::future::Future<Output = (Checks, AggTestResult<()>)>,
    {
        let mut step = Self::new(name);
        info!(step = %step.name, "step started");
        let (checks, result) = body(Checks::new()).await;
        step.finish(checks, result);
        step
    }

    /// Adds the step's check failures and the error of its final result,
    /// if any, to the outcome.
    pub fn finish(&mut self, checks: Checks, result: AggTestResult<()>) {
        let mut failures = checks.failures;
        if let Err(e) = result {
            warn!(step = %self.name, kind = ?e.kind(), error = %e, "step failed");
            failures.push(e.to_string());
        }
        if failures.is_empty() {
            return;
        }
        match &mut self.outcome {
            StepOutcome::Failed(existing) => existing.extend(failures),
            outcome => *outcome = StepOutcome::Failed(failures),
        }
    }

    /// Records a fatal error that ended this step early.
    pub fn abort(&mut self, err: AggTestError) {
        self.finish(Checks::new(), Err(err));
    }

    pub fn push(&mut self, child: StepReport) {
        self.children.push(child);
    }

    /// Returns true if neither this step nor any sub-step failed.
    pub fn passed(&self) -> bool {
        !self.outcome.is_failed() && self.children.iter().all(StepReport::passed)
    }

    /// Finds a sub-step by name, depth first.
    pub fn find(&self, name: &str) -> Option<&StepReport> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    /// Counts steps in this subtree with the given outcome shape.
    fn count(&self, pred: &dyn Fn(&StepOutcome) -> bool) -> usize {
        usize::from(pred(&self.outcome)) + self.children.iter().map(|c| c.count(pred)).sum::<usize>()
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        let label = match &self.outcome {
            _ if !self.passed() => "FAIL",
            StepOutcome::Skipped(_) => "SKIP",
            _ => "PASS",
        };
        writeln!(f, "{}--- {}: {}", indent, label, self.name)?;
        match &self.outcome {
            StepOutcome::Failed(messages) => {
                for message in messages {
                    writeln!(f, "{}    {}", indent, message)?;
                }
            }
            StepOutcome::Skipped(reason) => writeln!(f, "{}    {}", indent, reason)?,
            StepOutcome::Passed => {}
        }
        for child in &self.children {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

/// Every top-level step of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<StepReport>,
}

impl RunReport {
    pub fn push(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    pub fn passed(&self) -> bool {
        self.steps.iter().all(StepReport::passed)
    }

    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find_map(|s| s.find(name))
    }

    /// Number of steps that failed themselves (not only through a child).
    pub fn failed_count(&self) -> usize {
        self.steps.iter().map(|s| s.count(&StepOutcome::is_failed)).sum()
    }

    pub fn skipped_count(&self) -> usize {
        self.steps
            .iter()
            .map(|s| s.count(&|o| matches!(o, StepOutcome::Skipped(_))))
            .sum()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "{}", step)?;
        }
        let verdict = if self.passed() { "PASS" } else { "FAIL" };
        write!(
            f,
            "{} ({} failed, {} skipped)",
            verdict,
            self.failed_count(),
            self.skipped_count()
        )
    }
}
