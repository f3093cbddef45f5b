#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use bon::Builder;

use super::{Flow, Normalizer, StreamAnalyser};
use crate::annotation::{Annotatable, AnnotatedLine};

/// Compares every line, in order, with the next expected line.
#[derive(Debug, Clone, Builder)]
pub struct LineByLineAnalyser {
    /// Expected lines, in order.
    #[builder(with = |lines: impl IntoIterator<Item = String>| lines.into_iter().collect())]
    expected:   Vec<String>,
    /// Applied to both the observed and the expected line.
    #[builder(default)]
    normalizer: Normalizer,
    /// Index of the next expected line.
    #[builder(skip)]
    cursor:     usize,
}

impl LineByLineAnalyser {
    /// Creates an analyser using the default normalization.
    pub fn new<I, S>(expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder()
            .expected(expected.into_iter().map(Into::into))
            .build()
    }

    /// Whether every expected line was consumed.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.expected.len()
    }

    /// Expected lines not seen yet.
    pub fn remaining(&self) -> &[String] {
        &self.expected[self.cursor.min(self.expected.len())..]
    }
}

impl StreamAnalyser for LineByLineAnalyser {
    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        let Some(expected) = self.expected.get(self.cursor) else {
            line.after.failure("Expected no more output.");
            return Flow::Continue;
        };
        self.cursor += 1;

        if self.normalizer.apply(&line.text()) != self.normalizer.apply(expected) {
            line.after.failure(format!("Expected: {expected}"));
        }
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        if let Some(next) = self.remaining().first() {
            let missing = self.remaining().len();
            stream.failure(format!(
                "Expected {missing} more line{}. Next expected: {next}",
                if missing == 1 { "" } else { "s" }
            ));
        }
        Flow::Continue
    }
}
