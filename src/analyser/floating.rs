#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use super::{Flow, StreamAnalyser};
use crate::{
    annotation::{Annotatable, AnnotatedLine},
    constants::MAX_SIGNIFICANT_DIGITS,
    error::ConfigError,
};

/// Compares each line, parsed as a number, with the next expected number
/// using a relative tolerance of `10^-digits`.
#[derive(Debug, Clone)]
pub struct FloatingPointAnalyser {
    /// Expected values, as written and parsed.
    expected: Vec<(String, f64)>,
    /// Relative tolerance, `10^-digits`.
    relative: f64,
    /// Index of the next expected value.
    cursor:   usize,
}

impl FloatingPointAnalyser {
    /// Parses the expected values.
    ///
    /// Fails if `digits` is zero or more than an `f64` can hold, or if an
    /// expected value is not a number.
    pub fn new<I, S>(expected: I, digits: u32) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !(1..=MAX_SIGNIFICANT_DIGITS).contains(&digits) {
            return Err(ConfigError::InvalidDigits(digits));
        }
        let relative = i32::try_from(digits)
            .map(|digits| 10f64.powi(-digits))
            .map_err(|_| ConfigError::InvalidDigits(digits))?;

        let expected = expected
            .into_iter()
            .map(Into::into)
            .map(|text| match text.trim().parse::<f64>() {
                Ok(value) => Ok((text, value)),
                Err(_) => Err(ConfigError::InvalidNumber(text)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            expected,
            relative,
            cursor: 0,
        })
    }

    /// Whether `actual` is within the relative tolerance of `expected`.
    pub fn accepts(&self, actual: f64, expected: f64) -> bool {
        let tolerance = self.relative * actual.abs().max(expected.abs());
        (actual - expected).abs() <= tolerance
    }
}

impl StreamAnalyser for FloatingPointAnalyser {
    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        let Some((text, expected)) = self.expected.get(self.cursor) else {
            line.after.failure("Expected no more output.");
            return Flow::Continue;
        };
        self.cursor += 1;

        let parsed = line.text().trim().parse::<f64>();
        match parsed {
            Ok(actual) if self.accepts(actual, *expected) => {}
            Ok(_) => line.after.failure(format!("Expected: {text}")),
            Err(_) => line.after.failure(format!("Expected a number: {text}")),
        }
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        if let Some((next, _)) = self.expected.get(self.cursor) {
            let missing = self.expected.len() - self.cursor;
            stream.failure(format!(
                "Expected {missing} more number{}. Next expected: {next}",
                if missing == 1 { "" } else { "s" }
            ));
        }
        Flow::Continue
    }
}
