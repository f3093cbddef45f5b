#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{Condition, Flow, StreamAnalyser};
use crate::annotation::AnnotatedLine;

/// Applies a [`Condition`] to every line.
///
/// With `must_match` set, lines that do not satisfy the condition fail;
/// otherwise lines that do satisfy it fail.
#[derive(Debug, Clone)]
pub struct MatchLineAnalyser {
    /// The test applied to each line.
    condition:  Condition,
    /// Whether lines are required to match, or forbidden to.
    must_match: bool,
    /// Replaces the generated failure message.
    message:    Option<String>,
}

impl MatchLineAnalyser {
    /// Every line must satisfy `condition`.
    pub fn must_match(condition: Condition) -> Self {
        Self {
            condition,
            must_match: true,
            message: None,
        }
    }

    /// No line may satisfy `condition`.
    pub fn must_not_match(condition: Condition) -> Self {
        Self {
            condition,
            must_match: false,
            message: None,
        }
    }

    /// Uses `message` for failures instead of the generated one.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl StreamAnalyser for MatchLineAnalyser {
    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        if self.condition.matches(&line.text()) != self.must_match {
            let message = self.message.clone().unwrap_or_else(|| {
                if self.must_match {
                    format!("Line does not match {}", self.condition.describe())
                } else {
                    format!("Line must not match {}", self.condition.describe())
                }
            });
            line.after.failure(message);
        }
        Flow::Continue
    }
}
