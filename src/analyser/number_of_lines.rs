#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{Flow, StreamAnalyser};
use crate::annotation::{Annotatable, AnnotatedLine};

/// Counts lines and checks the count when the stream ends.
#[derive(Debug, Clone)]
pub struct NumberOfLinesAnalyser {
    /// The number of lines wanted.
    expected: usize,
    /// Exactly `expected` lines, or at least that many.
    exact:    bool,
    /// Lines seen so far.
    count:    usize,
}

impl NumberOfLinesAnalyser {
    /// `exact` requires exactly `expected` lines, otherwise `expected` is a
    /// lower bound.
    pub fn new(expected: usize, exact: bool) -> Self {
        Self {
            expected,
            exact,
            count: 0,
        }
    }

    /// Lines counted so far.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl StreamAnalyser for NumberOfLinesAnalyser {
    fn analyse_line(&mut self, _line: &mut AnnotatedLine) -> Flow {
        self.count += 1;
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        let (expected, count) = (self.expected, self.count);
        if self.exact && count != expected {
            stream.failure(format!("Expected {expected}, but got {count} lines."));
        } else if !self.exact && count < expected {
            stream.failure(format!("Expected at least {expected}, but got {count} lines."));
        }
        Flow::Continue
    }
}
