//! Command specification and the process-runner seam.
//!
//! [`ProcessRunner`] abstracts the OS boundary the same way brew-style
//! backends do: the real [`ShellRunner`] spawns subprocesses, while tests
//! script outcomes through a fake. The working directory travels inside
//! [`CommandSpec`] rather than via a process-global chdir, so two sequences
//! in one process can never trample each other's cwd.

use super::ExecError;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// One external command: program, arguments, and an optional explicit
/// working directory.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    /// Program name, resolved through PATH.
    pub program: String,
    /// Arguments, in order.
    pub args: Vec<String>,
    /// Working directory for the child; inherits the parent's when None.
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// Build a spec for `program` with the given arguments.
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    /// Run the command from `dir` instead of the inherited cwd.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// The command line as the operator would type it.
    pub fn render(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Seam between the retry loop and the OS.
pub trait ProcessRunner {
    /// Run the command to completion, streaming its merged stdout/stderr
    /// into `sink`. Non-zero exit, spawn failure, and sink errors all
    /// surface as [`ExecError`].
    fn run(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<(), ExecError>;
}

/// The real runner: spawns the subprocess with stdout and stderr merged
/// into a single pipe and pumps it line-by-line into the sink.
///
/// No timeout is applied; a hung external tool blocks the caller. That
/// matches the interactive-CLI usage model where the operator can ^C.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Create a runner.
    pub fn new() -> Self {
        Self
    }
}

/// Spawn the child with both output streams wired to one pipe.
///
/// The parent's write ends are dropped with the local `Command` before this
/// returns; otherwise the read loop would never see EOF.
fn spawn_merged(spec: &CommandSpec) -> Result<(Child, io::PipeReader), ExecError> {
    let (reader, writer) = io::pipe()?;
    let stderr = writer.try_clone()?;

    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(writer))
        .stderr(Stdio::from(stderr));

    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }

    let child = cmd.spawn().map_err(|source| ExecError::Spawn {
        program: spec.program.clone(),
        source,
    })?;

    Ok((child, reader))
}

impl ProcessRunner for ShellRunner {
    fn run(&self, spec: &CommandSpec, sink: &mut dyn Write) -> Result<(), ExecError> {
        let (mut child, reader) = spawn_merged(spec)?;

        let mut lines = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            let n = lines.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            sink.write_all(&line)?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(ExecError::Failed {
                program: spec.program.clone(),
                status,
            });
        }

        Ok(())
    }
}
