#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Instructor-authored checks: what to look at, which analysers, which mode.

use std::path::Path;

use anyhow::{Context, Result};
use bon::Builder;
use serde::{Deserialize, Serialize, Serializer};

use crate::{
    analyser::{
        BoxedAnalyser, Condition, ErrorAnalyser, ExceptionAnalyser, ExitStatusAnalyser,
        FloatingPointAnalyser, LineByLineAnalyser, LineSetAnalyser, MatchLineAnalyser,
        MissingMainClassAnalyser, Normalizer, NumberOfLinesAnalyser, split_block,
    },
    annotation::{Annotatable, Annotation},
    capture::{CapturedOutput, StreamKind},
    combinator::{BlockwiseAnalyser, ParallelAnalyser, SkipLinesAnalyser},
    config::Settings,
    error::ConfigError,
    statistics::Statistics,
    strategy::{Analysis, AnalysisMode, analyse},
};

/// Expected lines, written either as a list or as one newline-joined block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expected {
    /// Already split into lines.
    Lines(Vec<String>),
    /// A single string, split at newlines.
    Block(String),
}

impl Expected {
    /// Returns the expected lines.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Expected::Lines(lines) => lines.clone(),
            Expected::Block(block) => split_block(block),
        }
    }
}

/// Named normalizations a check file can pick from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    /// Lowercase, trim and collapse whitespace.
    #[default]
    Default,
    /// Compare exactly.
    Identity,
    /// Trim only.
    Trim,
    /// Collapse whitespace, keep case.
    Whitespace,
}

impl From<NormalizerKind> for Normalizer {
    fn from(kind: NormalizerKind) -> Self {
        match kind {
            NormalizerKind::Default => Normalizer::default(),
            NormalizerKind::Identity => Normalizer::identity(),
            NormalizerKind::Trim => Normalizer::trim(),
            NormalizerKind::Whitespace => Normalizer::whitespace(),
        }
    }
}

/// Serde default for flags that are on unless turned off.
fn yes() -> bool {
    true
}

/// An analyser as written in a check file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyserSpec {
    /// See [`LineByLineAnalyser`].
    LineByLine {
        /// Expected lines, in order.
        expected:   Expected,
        /// Normalization applied before comparing.
        #[serde(default)]
        normalizer: NormalizerKind,
    },
    /// See [`LineSetAnalyser`].
    LineSet {
        /// Expected lines, in any order.
        expected:   Expected,
        /// Normalization applied before comparing.
        #[serde(default)]
        normalizer: NormalizerKind,
        /// Near-miss threshold; the configured default if absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        similarity: Option<f32>,
    },
    /// See [`MatchLineAnalyser`].
    MatchLine {
        /// Regular expression, matched at the start of every line.
        pattern:    String,
        /// Lines must match, or must not.
        #[serde(default = "yes")]
        must_match: bool,
        /// Replaces the generated failure message.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message:    Option<String>,
    },
    /// See [`NumberOfLinesAnalyser`].
    NumberOfLines {
        /// Number of lines wanted.
        expected: usize,
        /// Exactly that many, or at least that many.
        #[serde(default = "yes")]
        exact:    bool,
    },
    /// See [`FloatingPointAnalyser`].
    FloatingPoint {
        /// Expected numbers, one per line.
        expected: Expected,
        /// Significant digits that must agree.
        digits:   u32,
    },
    /// See [`ErrorAnalyser`].
    Error {
        /// Receives the lines that are not errors.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        inner: Option<Box<AnalyserSpec>>,
    },
    /// Several analysers over the same lines.
    Parallel {
        /// The members, in call order.
        members: Vec<AnalyserSpec>,
    },
    /// One analyser per block of lines.
    Blockwise {
        /// Regular expression recognising separator lines.
        separator: String,
        /// One analyser per block, in order.
        blocks:    Vec<AnalyserSpec>,
    },
    /// Drops lines before they reach `inner`.
    SkipLines {
        /// Lines matching this are dropped; blank lines if absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        /// Receives the other lines.
        inner:   Box<AnalyserSpec>,
    },
    /// See [`ExceptionAnalyser`].
    Exception {
        /// Receives lines outside exception blocks.
        inner:     Box<AnalyserSpec>,
        /// Stop checking after the first exception.
        #[serde(default)]
        skip_rest: bool,
    },
    /// See [`MissingMainClassAnalyser`].
    MissingMainClass {
        /// Receives lines until the main class is reported missing.
        inner: Box<AnalyserSpec>,
    },
}

impl AnalyserSpec {
    /// Builds the analyser, failing if it is malformed.
    pub fn build(&self, settings: &Settings) -> Result<BoxedAnalyser<'static>, ConfigError> {
        let analyser: BoxedAnalyser<'static> = match self {
            AnalyserSpec::LineByLine {
                expected,
                normalizer,
            } => Box::new(
                LineByLineAnalyser::builder()
                    .expected(expected.lines())
                    .normalizer((*normalizer).into())
                    .build(),
            ),
            AnalyserSpec::LineSet {
                expected,
                normalizer,
                similarity,
            } => Box::new(
                LineSetAnalyser::with_normalizer(expected.lines(), (*normalizer).into())
                    .with_similarity(similarity.unwrap_or(settings.similarity()))?,
            ),
            AnalyserSpec::MatchLine {
                pattern,
                must_match,
                message,
            } => {
                let condition = Condition::regex(pattern.as_str())?;
                let analyser = if *must_match {
                    MatchLineAnalyser::must_match(condition)
                } else {
                    MatchLineAnalyser::must_not_match(condition)
                };
                match message {
                    Some(message) => Box::new(analyser.with_message(message.as_str())),
                    None => Box::new(analyser),
                }
            }
            AnalyserSpec::NumberOfLines { expected, exact } => {
                Box::new(NumberOfLinesAnalyser::new(*expected, *exact))
            }
            AnalyserSpec::FloatingPoint { expected, digits } => {
                Box::new(FloatingPointAnalyser::new(expected.lines(), *digits)?)
            }
            AnalyserSpec::Error { inner } => match inner {
                Some(inner) => Box::new(ErrorAnalyser::wrapping(inner.build(settings)?)),
                None => Box::new(ErrorAnalyser::new()),
            },
            AnalyserSpec::Parallel { members } => Box::new(ParallelAnalyser::new(
                members
                    .iter()
                    .map(|member| member.build(settings))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            AnalyserSpec::Blockwise { separator, blocks } => Box::new(BlockwiseAnalyser::new(
                Condition::regex(separator.as_str())?,
                blocks
                    .iter()
                    .map(|block| block.build(settings))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            AnalyserSpec::SkipLines { pattern, inner } => {
                let inner = inner.build(settings)?;
                match pattern {
                    Some(pattern) => Box::new(SkipLinesAnalyser::with_condition(
                        inner,
                        Condition::regex(pattern.as_str())?,
                    )),
                    None => Box::new(SkipLinesAnalyser::new(inner)),
                }
            }
            AnalyserSpec::Exception { inner, skip_rest } => {
                Box::new(ExceptionAnalyser::new(inner.build(settings)?).skip_rest(*skip_rest))
            }
            AnalyserSpec::MissingMainClass { inner } => {
                Box::new(MissingMainClassAnalyser::new(inner.build(settings)?))
            }
        };
        Ok(analyser)
    }
}

/// Serde default for [`CheckSpec::stream`].
fn default_stream() -> String {
    "stdout".to_string()
}

/// One check: which stream, which analysers, which mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[builder(on(String, into))]
pub struct CheckSpec {
    /// Shown in reports.
    #[builder(getter)]
    pub name:               String,
    /// `stdout` or `stderr`.
    #[serde(default = "default_stream")]
    #[builder(default = default_stream())]
    pub stream:             String,
    /// `singlepass`, `multipass` or `best-of`; the configured default if
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode:               Option<String>,
    /// The analysers to run.
    #[serde(default)]
    #[builder(default, with = |analysers: impl IntoIterator<Item = AnalyserSpec>| analysers.into_iter().collect())]
    pub analysers:          Vec<AnalyserSpec>,
    /// Return code the program should exit with; not checked if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_exit_code: Option<i32>,
    /// Keep blank lines away from every analyser.
    #[serde(default)]
    #[builder(default)]
    pub skip_blank_lines:   bool,
    /// Keep uncaught exception blocks away from every analyser.
    #[serde(default)]
    #[builder(default)]
    pub exceptions:         bool,
    /// Stop analysing if the main class could not be found.
    #[serde(default)]
    #[builder(default)]
    pub missing_main_class: bool,
}

/// A check with all its parts resolved.
struct BuiltCheck {
    /// The stream to look at.
    stream:    StreamKind,
    /// How analysers are run.
    mode:      AnalysisMode,
    /// The analysers, wrappers applied.
    analysers: Vec<BoxedAnalyser<'static>>,
}

impl CheckSpec {
    /// Resolves the stream and mode and builds every analyser, wrapped as the
    /// check asks.
    fn build(&self, settings: &Settings) -> Result<BuiltCheck, ConfigError> {
        let stream = self.stream.parse::<StreamKind>()?;
        let mode = match &self.mode {
            Some(mode) => mode.parse::<AnalysisMode>()?,
            None => settings.default_mode(),
        };

        let mut analysers = self
            .analysers
            .iter()
            .map(|spec| spec.build(settings))
            .collect::<Result<Vec<_>, _>>()?;

        // A single pass sees every analyser at once, so the wrappers go around
        // the merged set and report each crash once.
        if mode == AnalysisMode::Singlepass && analysers.len() > 1 {
            analysers = vec![Box::new(ParallelAnalyser::new(analysers))];
        }

        Ok(BuiltCheck {
            stream,
            mode,
            analysers: analysers.into_iter().map(|analyser| self.wrap(analyser)).collect(),
        })
    }

    /// Applies the check-level wrappers to one pass's analyser.
    fn wrap(&self, mut analyser: BoxedAnalyser<'static>) -> BoxedAnalyser<'static> {
        if self.skip_blank_lines {
            analyser = Box::new(SkipLinesAnalyser::new(analyser));
        }
        if self.exceptions {
            analyser = Box::new(ExceptionAnalyser::new(analyser));
        }
        if self.missing_main_class {
            analyser = Box::new(MissingMainClassAnalyser::new(analyser));
        }
        analyser
    }

    /// Runs the check against captured output.
    ///
    /// A check that cannot be built is reported as misconfigured, never as a
    /// failure of the submission.
    pub fn run(&self, output: &CapturedOutput, settings: &Settings) -> CheckOutcome {
        let built = match self.build(settings) {
            Ok(built) => built,
            Err(error) => {
                tracing::warn!("Check `{}` is misconfigured: {error}", self.name);
                return CheckOutcome::Misconfigured {
                    name: self.name.clone(),
                    error,
                };
            }
        };

        let mut analysis = analyse(output.lines(built.stream), built.analysers, built.mode);

        let mut status = Annotatable::new();
        if let Some(expected) = self.expected_exit_code {
            ExitStatusAnalyser::new(output.return_code(), expected)
                .with_elapsed(output.elapsed())
                .check(&mut status);
            analysis.statistics += status.statistics();
        }

        tracing::info!("Check `{}` ({}): {}", self.name, built.mode, analysis.statistics);
        CheckOutcome::Graded(GradedCheck {
            name: self.name.clone(),
            stream: built.stream,
            mode: built.mode,
            status: status.annotations().to_vec(),
            analysis,
        })
    }
}

/// A check that ran.
#[derive(Debug, Clone, Serialize)]
pub struct GradedCheck {
    /// Name of the check.
    pub name:     String,
    /// The stream that was analysed.
    pub stream:   StreamKind,
    /// How analysers were run.
    pub mode:     AnalysisMode,
    /// Exit status annotations, if the exit code was checked.
    pub status:   Vec<Annotation>,
    /// What the analysers found, exit status included in the statistics.
    pub analysis: Analysis,
}

impl GradedCheck {
    /// The combined statistics.
    pub fn statistics(&self) -> Statistics {
        self.analysis.statistics
    }

    /// The pass/fail verdict.
    pub fn passed(&self) -> bool {
        self.analysis.result()
    }
}

/// Serializes a value through its `Display` implementation.
fn serialize_display<T: std::fmt::Display, S: Serializer>(
    value: &T,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// What came out of running a check.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The check ran and has a verdict.
    Graded(GradedCheck),
    /// The check could not be built.
    Misconfigured {
        /// Name of the check.
        name:  String,
        /// What is wrong with it.
        #[serde(serialize_with = "serialize_display")]
        error: ConfigError,
    },
}

impl CheckOutcome {
    /// Name of the check.
    pub fn name(&self) -> &str {
        match self {
            CheckOutcome::Graded(graded) => &graded.name,
            CheckOutcome::Misconfigured { name, .. } => name,
        }
    }

    /// Whether the check ran and passed.
    pub fn passed(&self) -> bool {
        matches!(self, CheckOutcome::Graded(graded) if graded.passed())
    }

    /// Whether the check could not be built.
    pub fn is_misconfigured(&self) -> bool {
        matches!(self, CheckOutcome::Misconfigured { .. })
    }
}

/// A check file holds one check or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum CheckFile {
    /// `[ {...}, {...} ]`
    Many(Vec<CheckSpec>),
    /// `{ ... }`
    One(CheckSpec),
}

/// Parses checks from JSON text.
pub fn parse_checks(json: &str) -> Result<Vec<CheckSpec>> {
    let file: CheckFile = serde_json::from_str(json).context("Could not parse checks")?;
    Ok(match file {
        CheckFile::Many(checks) => checks,
        CheckFile::One(check) => vec![check],
    })
}

/// Reads checks from a JSON file.
pub fn load_checks(path: &Path) -> Result<Vec<CheckSpec>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read checks file: {}", path.display()))?;
    parse_checks(&json).with_context(|| format!("Invalid checks file: {}", path.display()))
}
