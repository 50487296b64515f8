//! Scripted process runner for tests.

use super::command::{CommandSpec, ProcessRunner};
use super::ExecError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;
use std::rc::Rc;

/// One scripted attempt: the output the fake command "prints" and whether
/// it exits cleanly.
pub struct FakeOutcome {
    output: String,
    succeeds: bool,
}

impl FakeOutcome {
    /// A command attempt that prints `output` and exits zero.
    pub fn ok(output: &str) -> Self {
        Self {
            output: output.to_string(),
            succeeds: true,
        }
    }

    /// A command attempt that prints `output` and exits non-zero.
    pub fn fail(output: &str) -> Self {
        Self {
            output: output.to_string(),
            succeeds: false,
        }
    }
}

#[derive(Default)]
struct Inner {
    script: RefCell<VecDeque<FakeOutcome>>,
    calls: RefCell<Vec<String>>,
    cwds: RefCell<Vec<Option<PathBuf>>>,
}

/// A [`ProcessRunner`] that replays scripted outcomes and records every
/// command line it was asked to run.
///
/// Clones share the same script and recording, so a test can hand one
/// clone to the code under test and keep another for assertions.
#[derive(Clone, Default)]
pub struct FakeRunner {
    inner: Rc<Inner>,
}

impl FakeRunner {
    /// Build a runner that replays `outcomes` in order and panics on any
    /// command beyond the script, so an unexpected step fails loudly.
    pub fn scripted<I: IntoIterator<Item = FakeOutcome>>(outcomes: I) -> Self {
        let runner = Self::default();
        runner
            .inner
            .script
            .borrow_mut()
            .extend(outcomes);
        runner
    }

    /// Number of attempts executed so far.
    pub fn call_count(&self) -> usize {
        self.inner.calls.borrow().len()
    }

    /// Rendered command lines, in execution order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    /// Working directory of each attempt, in execution order.
    pub fn cwds(&self) -> Vec<Option<PathBuf>> {
        self.inner.cwds.borrow().clone()
    }
}

impl ProcessRunner for FakeRunner {
    fn run(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<(), ExecError> {
        self.inner.calls.borrow_mut().push(spec.render());
        self.inner.cwds.borrow_mut().push(spec.cwd.clone());

        let outcome = self
            .inner
            .script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: {}", spec.render()));

        for line in outcome.output.split_inclusive('\n') {
            sink.write_all(line.as_bytes())?;
        }

        if outcome.succeeds {
            Ok(())
        } else {
            Err(ExecError::Io(io::Error::other("scripted failure")))
        }
    }
}
