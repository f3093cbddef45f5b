#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{Flow, StreamAnalyser};
use crate::annotation::Annotatable;

/// Checks how the program under test exited, once the stream is over.
///
/// An absent return code means the process was stopped for taking too long.
#[derive(Debug, Clone, Copy)]
pub struct ExitStatusAnalyser {
    /// Return code of the finished process, `None` if it timed out.
    return_code: Option<i32>,
    /// Return code the program should exit with.
    expected:    i32,
    /// Wall time in seconds, if measured.
    elapsed:     Option<f64>,
}

impl ExitStatusAnalyser {
    /// Expects `expected` as the return code.
    pub fn new(return_code: Option<i32>, expected: i32) -> Self {
        Self {
            return_code,
            expected,
            elapsed: None,
        }
    }

    /// Reports the elapsed time as information.
    pub fn with_elapsed(mut self, elapsed: Option<f64>) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Annotates `stream` with the timeout, a wrong return code and the
    /// elapsed time.
    pub fn check(&self, stream: &mut Annotatable) {
        match self.return_code {
            None => stream.crash("Timed out: your program took too long and was stopped."),
            Some(code) if code != self.expected => stream.failure(format!(
                "Expected exit code {}, but your program exited with {code}.",
                self.expected
            )),
            Some(_) => {}
        }

        if let Some(elapsed) = self.elapsed {
            stream.info(format!("Finished in {elapsed:.2}s."));
        }
    }
}

impl StreamAnalyser for ExitStatusAnalyser {
    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.check(stream);
        Flow::Continue
    }
}
