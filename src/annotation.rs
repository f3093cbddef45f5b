#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{borrow::Cow, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::statistics::Statistics;

/// How bad an annotation is. Variants are ordered from best to worst.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The line or stream is as expected.
    Success,
    /// Neutral information, eg. why the rest of the output was skipped.
    Info,
    /// Something is off but not necessarily wrong.
    Warning,
    /// An expectation was not met.
    Failure,
    /// The program under test crashed or timed out.
    Crash,
}

impl Severity {
    /// All severities, best first.
    pub const ALL: [Severity; 5] = [
        Severity::Success,
        Severity::Info,
        Severity::Warning,
        Severity::Failure,
        Severity::Crash,
    ];

    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Failure => "failure",
            Severity::Crash => "crash",
        }
    }

    /// Pluralized name, used when displaying counts.
    pub fn plural(self) -> &'static str {
        match self {
            Severity::Success => "successes",
            Severity::Info => "infos",
            Severity::Warning => "warnings",
            Severity::Failure => "failures",
            Severity::Crash => "crashes",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A message attached to a line or to a whole stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// The message shown to the student.
    message:  String,
    /// How bad it is.
    severity: Severity,
}

impl Annotation {
    /// Creates a new annotation.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }

    /// Creates an annotation whose message is the given lines joined by
    /// newlines.
    pub fn from_lines<I, S>(severity: Severity, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let message = lines
            .into_iter()
            .map(|line| line.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("\n");
        Self::new(severity, message)
    }

    /// Returns the message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the severity.
    pub fn severity(&self) -> Severity {
        self.severity
    }
}

/// An ordered list of annotations, attached before or after some content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Annotatable {
    /// Annotations, in the order they were added.
    annotations: Vec<Annotation>,
}

impl Annotatable {
    /// Creates an empty annotatable.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an annotation.
    pub fn annotate(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Appends an annotation built from a severity and message.
    pub fn push(&mut self, severity: Severity, message: impl Into<String>) {
        self.annotate(Annotation::new(severity, message));
    }

    /// Appends a success annotation.
    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Severity::Success, message);
    }

    /// Appends an info annotation.
    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message);
    }

    /// Appends a warning annotation.
    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Severity::Warning, message);
    }

    /// Appends a failure annotation.
    pub fn failure(&mut self, message: impl Into<String>) {
        self.push(Severity::Failure, message);
    }

    /// Appends a crash annotation.
    pub fn crash(&mut self, message: impl Into<String>) {
        self.push(Severity::Crash, message);
    }

    /// Returns the annotations in insertion order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Whether nothing was annotated.
    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Number of annotations with the given severity.
    pub fn count(&self, severity: Severity) -> u64 {
        self.annotations
            .iter()
            .filter(|annotation| annotation.severity == severity)
            .count() as u64
    }

    /// Number of success annotations.
    pub fn successes(&self) -> u64 {
        self.count(Severity::Success)
    }

    /// Number of info annotations.
    pub fn infos(&self) -> u64 {
        self.count(Severity::Info)
    }

    /// Number of warning annotations.
    pub fn warnings(&self) -> u64 {
        self.count(Severity::Warning)
    }

    /// Number of failure annotations.
    pub fn failures(&self) -> u64 {
        self.count(Severity::Failure)
    }

    /// Number of crash annotations.
    pub fn crashes(&self) -> u64 {
        self.count(Severity::Crash)
    }

    /// Counts every annotation once at its severity.
    pub fn statistics(&self) -> Statistics {
        let mut statistics = Statistics::default();
        for annotation in &self.annotations {
            statistics.increment(annotation.severity);
        }
        statistics
    }
}

/// Raw content of one captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineContent {
    /// Valid UTF-8 text.
    Text(String),
    /// Bytes that were not valid UTF-8.
    Bytes(Vec<u8>),
}

impl LineContent {
    /// Returns the content as text, replacing invalid UTF-8 sequences.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            LineContent::Text(text) => Cow::Borrowed(text),
            LineContent::Bytes(bytes) => String::from_utf8_lossy(bytes),
        }
    }
}

impl From<String> for LineContent {
    fn from(value: String) -> Self {
        LineContent::Text(value)
    }
}

impl From<&str> for LineContent {
    fn from(value: &str) -> Self {
        LineContent::Text(value.to_owned())
    }
}

impl From<Vec<u8>> for LineContent {
    fn from(value: Vec<u8>) -> Self {
        match String::from_utf8(value) {
            Ok(text) => LineContent::Text(text),
            Err(e) => LineContent::Bytes(e.into_bytes()),
        }
    }
}

/// One line of captured output, plus everything analysers said about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedLine {
    /// 1-based line number.
    number:         usize,
    /// Raw content as captured.
    content:        LineContent,
    /// Annotations shown before the line.
    pub before:     Annotatable,
    /// Annotations shown after the line.
    pub after:      Annotatable,
    /// Exclude this line from scoring.
    pub skip:       bool,
    /// Exclude this line from rendering.
    pub hide:       bool,
    /// Shown instead of the raw content when rendering.
    pub substitute: Option<String>,
}

impl AnnotatedLine {
    /// Wraps a raw line.
    pub fn new(number: usize, content: impl Into<LineContent>) -> Self {
        Self {
            number,
            content: content.into(),
            before: Annotatable::new(),
            after: Annotatable::new(),
            skip: false,
            hide: false,
            substitute: None,
        }
    }

    /// Returns the 1-based line number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Returns the raw content.
    pub fn content(&self) -> &LineContent {
        &self.content
    }

    /// Returns the raw content as text.
    pub fn text(&self) -> Cow<'_, str> {
        self.content.text()
    }

    /// Returns what a renderer should show: the substitute if set, the raw
    /// text otherwise.
    pub fn display_text(&self) -> Cow<'_, str> {
        match &self.substitute {
            Some(substitute) => Cow::Borrowed(substitute),
            None => self.text(),
        }
    }

    /// Whether any annotation was attached to this line.
    pub fn is_annotated(&self) -> bool {
        !self.before.is_empty() || !self.after.is_empty()
    }

    /// Scores this line.
    ///
    /// Skipped lines score nothing; a line nobody complained about scores a
    /// single success.
    pub fn statistics(&self) -> Statistics {
        if self.skip {
            Statistics::default()
        } else if !self.is_annotated() {
            let mut statistics = Statistics::default();
            statistics.increment(Severity::Success);
            statistics
        } else {
            self.before.statistics().merge(&self.after.statistics())
        }
    }
}

/// A whole captured stream: the lines plus the annotatables the outermost
/// stream-start and stream-end events write to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotatedStream {
    /// Receives annotations from `start_stream`.
    pub head:  Annotatable,
    /// The lines, in order.
    pub lines: Vec<AnnotatedLine>,
    /// Receives annotations from `finish_stream`.
    pub tail:  Annotatable,
}

impl AnnotatedStream {
    /// Wraps raw lines into fresh annotated lines, numbered from 1.
    pub fn new<I, C>(lines: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<LineContent>,
    {
        Self {
            head:  Annotatable::new(),
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(index, content)| AnnotatedLine::new(index + 1, content))
                .collect(),
            tail:  Annotatable::new(),
        }
    }

    /// Scores the stream annotations and every line.
    ///
    /// Empty output that nobody complained about scores a single success.
    pub fn statistics(&self) -> Statistics {
        if self.lines.is_empty() && self.head.is_empty() && self.tail.is_empty() {
            let mut statistics = Statistics::default();
            statistics.increment(Severity::Success);
            return statistics;
        }
        self.lines.iter().fold(
            self.head.statistics().merge(&self.tail.statistics()),
            |statistics, line| statistics.merge(&line.statistics()),
        )
    }
}
