//! Injected log sinks.
//!
//! Components never log to a process-wide logger directly. They hold a
//! [`Logger`], which forwards to whatever [`LogSink`] the machine builder
//! handed them, or drops the message when none was given.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::Level;

/// Destination for component log messages.
pub trait LogSink {
    /// Record one message. `source` names the component ("cpu", "bus", ...).
    fn log(&self, level: Level, source: &str, message: &str);
}

/// Sink that forwards to the `log` crate facade, using `source` as target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogFacade;

impl LogSink for LogFacade {
    fn log(&self, level: Level, source: &str, message: &str) {
        log::log!(target: source, level, "{message}");
    }
}

/// One recorded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: Level,
    pub source: String,
    pub message: String,
}

/// Sink that keeps every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: RefCell<Vec<LogEntry>>,
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything logged so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.borrow().clone()
    }

    /// True if any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|entry| entry.message.contains(needle))
    }
}

impl LogSink for MemoryLog {
    fn log(&self, level: Level, source: &str, message: &str) {
        self.entries.borrow_mut().push(LogEntry {
            level,
            source: source.to_string(),
            message: message.to_string(),
        });
    }
}

/// Optional sink handle held by components.
#[derive(Clone, Default)]
pub struct Logger {
    sink: Option<Rc<dyn LogSink>>,
}

impl Logger {
    #[must_use]
    pub fn new(sink: Rc<dyn LogSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Logger that discards everything.
    #[must_use]
    pub fn silent() -> Self {
        Self::default()
    }

    /// Logger forwarding to the `log` crate.
    #[must_use]
    pub fn facade() -> Self {
        Self::new(Rc::new(LogFacade))
    }

    pub fn log(&self, level: Level, source: &str, args: fmt::Arguments<'_>) {
        if let Some(sink) = &self.sink {
            sink.log(level, source, &args.to_string());
        }
    }

    pub fn warn(&self, source: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, source, args);
    }

    pub fn info(&self, source: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Info, source, args);
    }

    pub fn debug(&self, source: &str, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, source, args);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("attached", &self.sink.is_some())
            .finish()
    }
}
