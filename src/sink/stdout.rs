use super::{Sink, SinkError};
use std::io::Write;

/// Prints each path, quoted, on its own line. Never fails: a write error
/// (usually a closed pipe) is logged and the path dropped.
pub struct StdoutSink<W: Write> {
    out: W,
}

impl<W: Write> StdoutSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Sink for StdoutSink<W> {
    fn add_file(&mut self, path: &str) -> Result<(), SinkError> {
        if let Err(e) = writeln!(self.out, "{path:?}") {
            log::debug!("Dropped {path:?}: {e}");
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), SinkError> {
        if let Err(e) = self.out.flush() {
            log::debug!("Flush failed: {e}");
        }
        Ok(())
    }
}
