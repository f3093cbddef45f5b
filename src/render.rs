#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Recording analysed lines for display, and showing them on a terminal.

use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::{
    analyser::{Flow, StreamAnalyser},
    annotation::{Annotatable, Annotation, AnnotatedLine, Severity},
};

/// One line as it should be shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedLine {
    /// 1-based line number.
    pub number: usize,
    /// Substitute if one was set, raw text otherwise.
    pub text:   String,
    /// The renderer should leave this line out.
    pub hide:   bool,
    /// The line was not scored.
    pub skip:   bool,
    /// Annotations shown before the line.
    pub before: Vec<Annotation>,
    /// Annotations shown after the line.
    pub after:  Vec<Annotation>,
}

impl From<&AnnotatedLine> for RenderedLine {
    fn from(line: &AnnotatedLine) -> Self {
        Self {
            number: line.number(),
            text:   line.display_text().into_owned(),
            hide:   line.hide,
            skip:   line.skip,
            before: line.before.annotations().to_vec(),
            after:  line.after.annotations().to_vec(),
        }
    }
}

/// Everything one pass produced for display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    /// Annotations made when the stream started.
    pub head:  Vec<Annotation>,
    /// The lines, hidden ones included.
    pub lines: Vec<RenderedLine>,
    /// Annotations made when the stream ended.
    pub tail:  Vec<Annotation>,
}

impl Transcript {
    /// Renders the transcript as text, coloured if `color` is set. Hidden lines
    /// are left out.
    pub fn render(&self, color: bool) -> String {
        let mut out = Vec::new();
        push_annotations(&mut out, &self.head, "", color);

        for line in self.lines.iter().filter(|line| !line.hide) {
            push_annotations(&mut out, &line.before, "       ", color);
            let number = format!("{:>4} |", line.number);
            if color {
                out.push(format!("{} {}", number.dimmed(), line.text));
            } else {
                out.push(format!("{number} {}", line.text));
            }
            push_annotations(&mut out, &line.after, "       ", color);
        }

        push_annotations(&mut out, &self.tail, "", color);
        out.join("\n")
    }
}

/// Styles a severity tag.
fn tag(severity: Severity, color: bool) -> ColoredString {
    let tag = format!("[{severity}]");
    if !color {
        return tag.normal();
    }

    match severity {
        Severity::Success => tag.green(),
        Severity::Info => tag.blue(),
        Severity::Warning => tag.yellow(),
        Severity::Failure => tag.red(),
        Severity::Crash => tag.red().bold(),
    }
}

/// Appends annotations, one per line, continuation lines indented under the
/// first.
fn push_annotations(out: &mut Vec<String>, annotations: &[Annotation], indent: &str, color: bool) {
    for annotation in annotations {
        let tag = tag(annotation.severity(), color);
        let padding = " ".repeat(annotation.severity().name().len() + 3);
        for (index, text) in annotation.message().split('\n').enumerate() {
            if index == 0 {
                out.push(format!("{indent}{tag} {text}"));
            } else {
                out.push(format!("{indent}{padding}{text}"));
            }
        }
    }
}

/// Records every line and stream annotation it sees into a [`Transcript`].
///
/// Runs last, so it observes what the other analysers attached.
#[derive(Debug, Default)]
pub struct PrintAnalyser {
    /// What was recorded so far.
    transcript: Transcript,
}

impl PrintAnalyser {
    /// Creates an empty printer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns what was recorded.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Consumes the printer, returning what was recorded.
    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }
}

impl StreamAnalyser for PrintAnalyser {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.transcript.head = stream.annotations().to_vec();
        Flow::Continue
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        self.transcript.lines.push(RenderedLine::from(&*line));
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.transcript.tail = stream.annotations().to_vec();
        Flow::Continue
    }
}
