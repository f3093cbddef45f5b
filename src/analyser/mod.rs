#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! The [`StreamAnalyser`] capability and the standard analysers built on it.

use std::{fmt, sync::Arc};

use itertools::Itertools;
use regex::Regex;

use crate::{
    annotation::{Annotatable, AnnotatedLine},
    error::ConfigError,
};

/// Diagnostic filters: `error` lines, exception blocks, missing main class.
pub mod diagnostics;
/// Stream-level checks of the process exit status.
pub mod exit;
/// Relative-tolerance comparison of numeric output.
pub mod floating;
/// Ordered comparison against expected lines.
pub mod line_by_line;
/// Unordered comparison against a set of expected lines.
pub mod line_set;
/// Regex or predicate checks applied to every line.
pub mod matcher;
/// Counting lines.
pub mod number_of_lines;

pub use diagnostics::{ErrorAnalyser, ExceptionAnalyser, MissingMainClassAnalyser};
pub use exit::ExitStatusAnalyser;
pub use floating::FloatingPointAnalyser;
pub use line_by_line::LineByLineAnalyser;
pub use line_set::LineSetAnalyser;
pub use matcher::MatchLineAnalyser;
pub use number_of_lines::NumberOfLinesAnalyser;

/// What an analyser wants to happen after one of its callbacks.
#[must_use]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Flow {
    /// Keep feeding lines.
    #[default]
    Continue,
    /// Stop analysing: the rest of the stream is skipped, and hidden if `hide`
    /// is set. `message` explains why.
    SkipTheRest {
        /// Shown to the student as an info annotation.
        message: String,
        /// Also hide the skipped lines from the rendered output.
        hide:    bool,
    },
}

impl Flow {
    /// Shorthand for [`Flow::SkipTheRest`].
    pub fn skip_the_rest(message: impl Into<String>, hide: bool) -> Self {
        Flow::SkipTheRest {
            message: message.into(),
            hide,
        }
    }

    /// Whether analysis should go on.
    pub fn is_continue(&self) -> bool {
        matches!(self, Flow::Continue)
    }

    /// Runs `next` only if this flow continues, returning its flow.
    pub fn and_then(self, next: impl FnOnce() -> Flow) -> Flow {
        match self {
            Flow::Continue => next(),
            stop => stop,
        }
    }
}

/// A unit of validation over one captured stream.
///
/// All callbacks default to doing nothing. Implementations attach
/// annotations, and may set `skip`, `hide` and `substitute` on lines; they
/// never change line content otherwise.
pub trait StreamAnalyser {
    /// Called once before the first line.
    fn start_stream(&mut self, _stream: &mut Annotatable) -> Flow {
        Flow::Continue
    }

    /// Called once per line, in order.
    fn analyse_line(&mut self, _line: &mut AnnotatedLine) -> Flow {
        Flow::Continue
    }

    /// Called once after the last line.
    fn finish_stream(&mut self, _stream: &mut Annotatable) -> Flow {
        Flow::Continue
    }
}

/// A type-erased analyser.
pub type BoxedAnalyser<'a> = Box<dyn StreamAnalyser + 'a>;

impl<T: StreamAnalyser + ?Sized> StreamAnalyser for Box<T> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        (**self).start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        (**self).analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        (**self).finish_stream(stream)
    }
}

impl<T: StreamAnalyser + ?Sized> StreamAnalyser for &mut T {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        (**self).start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        (**self).analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        (**self).finish_stream(stream)
    }
}

/// An analyser that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyser;

impl StreamAnalyser for NoopAnalyser {}

/// Arbitrary line predicate.
pub type LinePredicate = Arc<dyn Fn(&str) -> bool + Send + Sync + 'static>;

/// A test applied to the text of a line.
#[derive(Clone)]
pub enum Condition {
    /// A regular expression, anchored at the start of the line.
    Regex {
        /// The pattern as written.
        pattern: String,
        /// The compiled, anchored pattern.
        regex:   Regex,
    },
    /// Any function of the line text.
    Predicate(LinePredicate),
}

impl Condition {
    /// Compiles `pattern`. Like a prefix match, the pattern must match at the
    /// start of the line but may leave a suffix unmatched; use `$` to anchor
    /// the end.
    pub fn regex(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                reason:  e.to_string(),
            }
        })?;
        Ok(Condition::Regex { pattern, regex })
    }

    /// Wraps a function.
    pub fn predicate<F>(predicate: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Condition::Predicate(Arc::new(predicate))
    }

    /// Matches lines that are empty or whitespace only.
    pub fn blank() -> Self {
        Condition::predicate(|line| line.trim().is_empty())
    }

    /// Evaluates the condition against `line`.
    pub fn matches(&self, line: &str) -> bool {
        match self {
            Condition::Regex { regex, .. } => regex.is_match(line),
            Condition::Predicate(predicate) => predicate(line),
        }
    }

    /// A short human readable description, used in messages.
    pub fn describe(&self) -> String {
        match self {
            Condition::Regex { pattern, .. } => format!("`{pattern}`"),
            Condition::Predicate(_) => "the expected format".to_string(),
        }
    }
}

impl fmt::Debug for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Regex { pattern, .. } => f.debug_tuple("Regex").field(pattern).finish(),
            Condition::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Function applied to both sides before comparing lines.
type NormalizeFn = Arc<dyn Fn(&str) -> String + Send + Sync + 'static>;

/// Normalizes line text before it is compared with an expected line.
///
/// The default lowercases, trims and collapses runs of whitespace into one
/// space.
#[derive(Clone)]
pub struct Normalizer(NormalizeFn);

impl Normalizer {
    /// Wraps a custom normalization function.
    pub fn new<F>(normalize: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self(Arc::new(normalize))
    }

    /// Compares text exactly as captured.
    pub fn identity() -> Self {
        Self::new(|line| line.to_owned())
    }

    /// Only trims surrounding whitespace.
    pub fn trim() -> Self {
        Self::new(|line| line.trim().to_owned())
    }

    /// Collapses whitespace but keeps case.
    pub fn whitespace() -> Self {
        Self::new(|line| line.split_whitespace().join(" "))
    }

    /// Applies the normalization.
    pub fn apply(&self, line: &str) -> String {
        (self.0)(line)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(|line| line.split_whitespace().join(" ").to_lowercase())
    }
}

impl fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Normalizer(..)")
    }
}

/// Splits a newline-joined block into lines, dropping a trailing newline. An
/// empty block has no lines.
pub fn split_block(block: &str) -> Vec<String> {
    if block.is_empty() {
        return Vec::new();
    }

    block
        .strip_suffix('\n')
        .unwrap_or(block)
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .collect()
}
