#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{Flow, NoopAnalyser, StreamAnalyser};
use crate::{
    annotation::{Annotatable, AnnotatedLine},
    constants::{EXCEPTION_PREFIX, MISSING_MAIN_CLASS_MARKERS},
};

/// Whether the program reported an error on this line.
fn is_error_line(text: &str) -> bool {
    text.trim_start().to_lowercase().starts_with("error")
}

/// Whether the line continues a stack trace.
fn is_stack_trace_continuation(text: &str) -> bool {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return false;
    }

    text.starts_with(char::is_whitespace)
        || trimmed.starts_with("at ")
        || trimmed.starts_with("Caused by:")
        || (trimmed.starts_with("...") && trimmed.ends_with("more"))
}

/// Whether the launcher could not find the class to run.
fn is_missing_main_class(text: &str) -> bool {
    let lowered = text.to_lowercase();
    MISSING_MAIN_CLASS_MARKERS
        .iter()
        .any(|marker| lowered.contains(marker))
}

/// Fails lines starting with `error`, case-insensitively.
///
/// Such lines are not forwarded to the wrapped analyser; every other line is.
#[derive(Debug, Clone, Default)]
pub struct ErrorAnalyser<A = NoopAnalyser> {
    /// Receives the lines that are not errors.
    inner: A,
}

impl ErrorAnalyser {
    /// Flags error lines and nothing else.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: StreamAnalyser> ErrorAnalyser<A> {
    /// Flags error lines and forwards the others to `inner`.
    pub fn wrapping(inner: A) -> Self {
        Self { inner }
    }
}

impl<A: StreamAnalyser> StreamAnalyser for ErrorAnalyser<A> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        if is_error_line(&line.text()) {
            line.after.failure("Your program reported an error.");
            return Flow::Continue;
        }
        self.inner.analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.finish_stream(stream)
    }
}

/// Recognises uncaught exception blocks and keeps them away from the wrapped
/// analyser.
///
/// A block starts at a line beginning with `Exception in` and continues while
/// lines look like a stack trace (`at ...`, `Caused by: ...`, `... N more`, or
/// anything indented).
#[derive(Debug, Clone)]
pub struct ExceptionAnalyser<A> {
    /// Receives every line outside exception blocks.
    inner:        A,
    /// Currently inside an exception block.
    in_exception: bool,
    /// Stop analysing after the first exception.
    skip_rest:    bool,
}

impl<A: StreamAnalyser> ExceptionAnalyser<A> {
    /// Wraps `inner`; analysis goes on after an exception block.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            in_exception: false,
            skip_rest: false,
        }
    }

    /// Skips the rest of the stream after the first exception.
    pub fn skip_rest(mut self, skip_rest: bool) -> Self {
        self.skip_rest = skip_rest;
        self
    }
}

impl<A: StreamAnalyser> StreamAnalyser for ExceptionAnalyser<A> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        let text = line.text().into_owned();

        if text.starts_with(EXCEPTION_PREFIX) {
            self.in_exception = true;
            line.after
                .crash("Your program crashed with an unhandled exception.");
            if self.skip_rest {
                return Flow::skip_the_rest("The output after the exception was not checked.", false);
            }
            return Flow::Continue;
        }

        if self.in_exception && is_stack_trace_continuation(&text) {
            return Flow::Continue;
        }

        self.in_exception = false;
        self.inner.analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.finish_stream(stream)
    }
}

/// Recognises a launcher that could not find the main class.
///
/// After such a line nothing more is forwarded to the wrapped analyser, not
/// even the end of the stream: its expectations cannot be met and would only
/// add noise.
#[derive(Debug, Clone)]
pub struct MissingMainClassAnalyser<A> {
    /// Receives lines until the main class is reported missing.
    inner:   A,
    /// The main class was reported missing.
    missing: bool,
}

impl<A: StreamAnalyser> MissingMainClassAnalyser<A> {
    /// Wraps `inner`.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            missing: false,
        }
    }

    /// Whether the main class was reported missing.
    pub fn is_missing(&self) -> bool {
        self.missing
    }
}

impl<A: StreamAnalyser> StreamAnalyser for MissingMainClassAnalyser<A> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        if self.missing {
            return Flow::Continue;
        }

        if is_missing_main_class(&line.text()) {
            self.missing = true;
            line.after
                .crash("Your program could not be started: the main class was not found.");
            return Flow::Continue;
        }

        self.inner.analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        if self.missing {
            return Flow::Continue;
        }
        self.inner.finish_stream(stream)
    }
}
