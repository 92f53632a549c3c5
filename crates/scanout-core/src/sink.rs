// SPDX-License-Identifier: CEPL-1.0
use std::cell::RefCell;
use std::fmt;

/// Diagnostics channel handed to every bootstrap component.
///
/// Output here never feeds back into control flow.
pub trait LogSink {
    fn trace(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
}

/// Forwards to the process-wide `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn trace(&self, args: fmt::Arguments<'_>) {
        tracing::trace!(target: "scanout", "{args}");
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "scanout", "{args}");
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn trace(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Trace,
    Info,
}

/// Keeps every line in memory. Single-threaded, like the bootstrap itself.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: RefCell<Vec<(Level, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    pub fn info_lines(&self) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(level, _)| *level == Level::Info)
            .map(|(_, line)| line.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|(_, line)| line.contains(needle))
    }
}

impl LogSink for RecordingSink {
    fn trace(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push((Level::Trace, args.to_string()));
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push((Level::Info, args.to_string()));
    }
}
