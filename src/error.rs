#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// An enum to represent a check that was authored incorrectly.
///
/// These are never scored against the submission: a check that fails to build
/// is reported as misconfigured instead of passing or failing.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A line condition regular expression could not be compiled.
    #[error("The pattern `{pattern}` is not a valid regular expression:\n```\n{reason}\n```")]
    InvalidPattern {
        /// The pattern as written in the check.
        pattern: String,
        /// Why the regex crate rejected it.
        reason:  String,
    },
    /// The floating point tolerance must use between 1 and 17 digits.
    #[error("Floating point comparisons need between 1 and 17 significant digits, got {0}.")]
    InvalidDigits(u32),
    /// An expected floating point value could not be parsed.
    #[error("The expected value `{0}` is not a floating point number.")]
    InvalidNumber(String),
    /// The analysis mode is not one of `singlepass`, `multipass`, `best-of`.
    #[error("Unknown analysis mode `{0}`, expected one of: singlepass, multipass, best-of.")]
    UnknownMode(String),
    /// The stream selector is not one of `stdout`, `stderr`.
    #[error("Unknown stream `{0}`, expected one of: stdout, stderr.")]
    UnknownStream(String),
    /// Similarity thresholds are ratios between 0 and 1.
    #[error("Similarity threshold must be between 0 and 1, got {0}.")]
    InvalidSimilarity(f32),
}
