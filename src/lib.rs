//! # streamgrade
//!
//! Composable analysers that grade the captured output of a student program,
//! line by line, and explain what they found.

#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// The analyser trait and the analysers that check lines
pub mod analyser;
/// Severities, annotations and annotated lines
pub mod annotation;
/// Output captured from a program that already ran
pub mod capture;
/// Checks as written by instructors, and running them
pub mod check;
/// Analysers built out of other analysers
pub mod combinator;
/// Settings read from the environment
pub mod config;
/// A module defining a bunch of constant values to be used throughout
pub mod constants;
/// Errors in how a check is configured
pub mod error;
/// Recording analysed lines and showing them
pub mod render;
/// Running many checks and summarising them
pub mod report;
/// Counting annotations by severity
pub mod statistics;
/// Singlepass, multipass and best-of analysis
pub mod strategy;

pub use analyser::{BoxedAnalyser, Flow, StreamAnalyser};
pub use annotation::{Annotatable, Annotation, AnnotatedLine, AnnotatedStream, Severity};
pub use check::{CheckOutcome, CheckSpec};
pub use report::Report;
pub use statistics::Statistics;
pub use strategy::{Analysis, AnalysisMode, analyse};
