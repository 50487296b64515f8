//! Dual-mode sink for subprocess output.

use std::io::{self, Write};

/// A writer that either forwards subprocess output verbatim or buffers it
/// line-by-line while emitting a fixed progress marker per chunk.
///
/// Capture mode keeps the operator's terminal readable during noisy
/// commands (one `.` per line of output) while preserving the full text for
/// later inspection by a suppression predicate. One capture serves exactly
/// one in-flight command; there is no internal synchronization.
pub struct OutputCapture<W: Write> {
    delegate: W,
    passthrough: bool,
    lines: Vec<String>,
}

/// The heartbeat character written to the destination per captured chunk.
const PROGRESS_MARKER: &[u8] = b".";

impl<W: Write> OutputCapture<W> {
    /// Forward every chunk verbatim to `delegate`.
    pub fn passthrough(delegate: W) -> Self {
        Self {
            delegate,
            passthrough: true,
            lines: Vec::new(),
        }
    }

    /// Buffer chunks as text lines, writing only the progress marker to
    /// `delegate`.
    pub fn capture(delegate: W) -> Self {
        Self {
            delegate,
            passthrough: false,
            lines: Vec::new(),
        }
    }

    /// The captured text: all buffered chunks concatenated in arrival order.
    ///
    /// Empty in passthrough mode, or when the command never produced output.
    pub fn format(&self) -> String {
        self.lines.concat()
    }

    /// Consume the capture, returning the captured text.
    pub fn finish(self) -> String {
        self.format()
    }
}

impl<W: Write> Write for OutputCapture<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.passthrough {
            return self.delegate.write(buf);
        }

        self.lines.push(String::from_utf8_lossy(buf).into_owned());
        // A marker-write failure must surface: the attempt is aborted rather
        // than silently running without a heartbeat.
        self.delegate.write_all(PROGRESS_MARKER)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.delegate.flush()
    }
}
