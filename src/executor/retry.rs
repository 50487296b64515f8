//! Suppression predicates and the bounded retry loop.

use super::command::{CommandSpec, ProcessRunner};
use super::output::OutputCapture;
use super::ExecError;
use crate::ui;
use regex::Regex;
use std::cell::RefCell;
use std::io::{self, Write};

/// Retries after the first attempt, so `RETRY_BUDGET + 1` total attempts.
///
/// Fixed by observation of how flaky helm/terraform invocations behave in
/// practice; deliberately not user-tunable configuration.
pub const RETRY_BUDGET: u32 = 2;

/// Decides whether the captured output of a *failed* command shows the
/// system was already in the desired end state.
///
/// Exit codes alone cannot distinguish "nothing to do" from a real failure
/// for helm and terraform; the output text is the only signal. Each call
/// site picks its own predicate.
#[derive(Debug)]
pub enum Suppression {
    /// Any failure propagates (terraform destroy must fully reconcile).
    Never,
    /// A failure whose output matches is treated as success.
    Matches(Regex),
}

impl Suppression {
    /// Build a pattern-matching predicate.
    pub fn matches(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self::Matches(Regex::new(pattern)?))
    }

    /// Whether this failed output is an acceptable no-op.
    pub fn accepts(&self, output: &str) -> bool {
        match self {
            Self::Never => false,
            Self::Matches(re) => re.is_match(output),
        }
    }
}

/// Runs commands through a capture-mode [`OutputCapture`], converting
/// suppressible failures to success and retrying the rest up to
/// [`RETRY_BUDGET`] times.
pub struct Executor<'a> {
    runner: &'a dyn ProcessRunner,
    console: RefCell<Box<dyn Write + 'a>>,
}

impl<'a> Executor<'a> {
    /// Create an executor that reports progress on stdout.
    pub fn new(runner: &'a dyn ProcessRunner) -> Self {
        Self::with_console(runner, Box::new(io::stdout()))
    }

    /// Create an executor reporting progress to an arbitrary writer.
    pub fn with_console(runner: &'a dyn ProcessRunner, console: Box<dyn Write + 'a>) -> Self {
        Self {
            runner,
            console: RefCell::new(console),
        }
    }

    /// Run `spec` to completion.
    ///
    /// Returns Ok on success or on a failure accepted by `suppression`
    /// (even on the first attempt). Otherwise retries immediately, with an
    /// operator-visible countdown, and returns the last error once the
    /// budget is exhausted.
    pub fn run_suppressed(
        &self,
        suppression: &Suppression,
        spec: &CommandSpec,
    ) -> Result<(), ExecError> {
        let mut remaining = RETRY_BUDGET;
        let mut console = self.console.borrow_mut();
        loop {
            ui::highlight(&format!("{} ~> ", spec.render()));
            let mut out = OutputCapture::capture(&mut **console);
            let result = self.runner.run(spec, &mut out);
            let text = out.finish();
            writeln!(console)?;

            let err = match result {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            if suppression.accepts(&text) {
                log::debug!("suppressed failure of {}: {err}", spec.program);
                return Ok(());
            }

            if remaining == 0 {
                return Err(err);
            }

            writeln!(console, "retrying command, number of retries remaining: {remaining}")?;
            remaining -= 1;
        }
    }
}
