//! Diagnostics – the logging configuration handed to every render call.
//!
//! Nothing in this crate installs a global logger. A [`Diagnostics`] value
//! carries its own level filter and sink; records are formatted as
//! `LEVEL: message` by an `env_logger::Logger` that is built here but never
//! registered with the `log` facade.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use env_logger::{Builder, Logger, Target, WriteStyle};
use log::{Level, LevelFilter, Log, Record};

/// Where diagnostic records are written.
pub enum Sink {
    /// Standard error (the CLI default).
    Stderr,
    /// Any writer, e.g. a [`CaptureBuffer`].
    Writer(Box<dyn Write + Send>),
}

/// Per-call logging level and sink.
pub struct Diagnostics {
    level: LevelFilter,
    logger: Logger,
}

impl Diagnostics {
    pub fn new(level: LevelFilter, sink: Sink) -> Self {
        let mut builder = Builder::new();
        builder
            .filter_level(level)
            .write_style(WriteStyle::Never)
            .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()));
        match sink {
            Sink::Stderr => builder.target(Target::Stderr),
            Sink::Writer(w) => builder.target(Target::Pipe(w)),
        };
        Self {
            level,
            logger: builder.build(),
        }
    }

    /// Debug mode logs everything; otherwise only errors get through.
    pub fn from_debug(debug: bool) -> Self {
        Self::new(level_for_debug(debug), Sink::Stderr)
    }

    /// Diagnostics writing into an in-memory buffer.
    pub fn capture(debug: bool) -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        let diag = Self::new(
            level_for_debug(debug),
            Sink::Writer(Box::new(buffer.clone())),
        );
        (diag, buffer)
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.logger.log(
            &Record::builder()
                .args(args)
                .level(level)
                .target("report_pdf")
                .build(),
        );
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::from_debug(false)
    }
}

impl fmt::Debug for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Diagnostics")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

fn level_for_debug(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Trace
    } else {
        LevelFilter::Error
    }
}

/// A cloneable in-memory sink. All clones share the same bytes.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(|p| p.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_use_level_prefix() {
        let (diag, buf) = Diagnostics::capture(true);
        diag.info(format_args!("loaded {} nodes", 3));
        assert_eq!(buf.contents(), "INFO: loaded 3 nodes\n");
    }

    #[test]
    fn quiet_mode_keeps_only_errors() {
        let (diag, buf) = Diagnostics::capture(false);
        diag.debug(format_args!("noise"));
        diag.warn(format_args!("more noise"));
        diag.error(format_args!("broken"));
        assert_eq!(buf.contents(), "ERROR: broken\n");
    }

    #[test]
    fn debug_mode_is_maximum_verbosity() {
        let (diag, buf) = Diagnostics::capture(true);
        assert_eq!(diag.level(), LevelFilter::Trace);
        diag.trace(format_args!("deep"));
        assert!(buf.contents().contains("TRACE: deep"));
    }
}
