#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use indexmap::IndexMap;
use similar::TextDiff;

use super::{Flow, Normalizer, StreamAnalyser};
use crate::{
    annotation::{Annotatable, Annotation, AnnotatedLine, Severity},
    constants::DEFAULT_SIMILARITY,
    error::ConfigError,
};

/// An expected line and whether it was seen yet.
#[derive(Debug, Clone)]
struct ExpectedLine {
    /// The line as the instructor wrote it.
    original: String,
    /// Set once a matching (or near-matching) line was observed.
    found:    bool,
}

/// Matches lines against a set of expected lines, in any order.
///
/// Lines that are not expected but close to exactly one expected line that was
/// not found yet get a "did you mean" hint, and count as finding it.
#[derive(Debug, Clone)]
pub struct LineSetAnalyser {
    /// Normalized expected line to its state, in the order given.
    expected:   IndexMap<String, ExpectedLine>,
    /// Applied to both the observed and the expected lines.
    normalizer: Normalizer,
    /// A candidate is a near miss when its similarity ratio is strictly
    /// greater than this.
    similarity: f32,
}

impl LineSetAnalyser {
    /// Creates an analyser using the default normalization and similarity.
    pub fn new<I, S>(expected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_normalizer(expected, Normalizer::default())
    }

    /// Creates an analyser with a custom normalization.
    pub fn with_normalizer<I, S>(expected: I, normalizer: Normalizer) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut map = IndexMap::new();
        for line in expected {
            let original = line.into();
            map.entry(normalizer.apply(&original))
                .or_insert(ExpectedLine {
                    original,
                    found: false,
                });
        }

        Self {
            expected: map,
            normalizer,
            similarity: DEFAULT_SIMILARITY,
        }
    }

    /// Sets the near-miss threshold, a ratio in `[0, 1]`.
    pub fn with_similarity(mut self, similarity: f32) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&similarity) {
            return Err(ConfigError::InvalidSimilarity(similarity));
        }
        self.similarity = similarity;
        Ok(self)
    }

    /// Expected lines that were not observed so far, in the order given.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.expected
            .values()
            .filter(|line| !line.found)
            .map(|line| line.original.as_str())
    }

    /// Finds the single unfound expected line similar enough to `observed`.
    /// Returns `None` when there is no such line or more than one.
    fn near_miss(&self, observed: &str) -> Option<String> {
        let mut candidates = self
            .expected
            .iter()
            .filter(|(_, line)| !line.found)
            .filter(|(key, _)| TextDiff::from_chars(observed, key.as_str()).ratio() > self.similarity)
            .map(|(key, _)| key.clone());

        let first = candidates.next()?;
        match candidates.next() {
            Some(_) => None,
            None => Some(first),
        }
    }
}

impl StreamAnalyser for LineSetAnalyser {
    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        let observed = self.normalizer.apply(&line.text());

        if let Some(expected) = self.expected.get_mut(&observed) {
            if expected.found {
                line.after.failure("Duplicate line");
            } else {
                expected.found = true;
            }
            return Flow::Continue;
        }

        match self
            .near_miss(&observed)
            .and_then(|key| self.expected.get_mut(&key))
        {
            Some(candidate) => {
                candidate.found = true;
                line.after
                    .failure(format!("Did you mean: {}?", candidate.original));
            }
            None => line.after.failure("Unexpected line"),
        }
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        let missing: Vec<&str> = self.missing().collect();
        if !missing.is_empty() {
            stream.annotate(Annotation::from_lines(
                Severity::Failure,
                std::iter::once("Missing lines:").chain(missing),
            ));
        }
        Flow::Continue
    }
}
