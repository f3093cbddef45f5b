#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Running analysers over a captured stream and reducing them to one result.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    analyser::{BoxedAnalyser, Flow, StreamAnalyser},
    annotation::{AnnotatedStream, LineContent},
    combinator::{ParallelAnalyser, SkipTheRestAnalyser},
    error::ConfigError,
    render::{PrintAnalyser, Transcript},
    statistics::Statistics,
};

/// How a set of analysers is run over one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisMode {
    /// One pass, all analysers annotating the same lines.
    #[default]
    Singlepass,
    /// One pass per analyser; statistics are summed.
    Multipass,
    /// One private pass per analyser; only the best one counts.
    BestOf,
}

impl FromStr for AnalysisMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singlepass" => Ok(AnalysisMode::Singlepass),
            "multipass" => Ok(AnalysisMode::Multipass),
            "best-of" => Ok(AnalysisMode::BestOf),
            _ => Err(ConfigError::UnknownMode(s.to_string())),
        }
    }
}

impl Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AnalysisMode::Singlepass => "singlepass",
            AnalysisMode::Multipass => "multipass",
            AnalysisMode::BestOf => "best-of",
        })
    }
}

/// The result of running analysers over a stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Analysis {
    /// What counts towards the verdict.
    pub statistics:  Statistics,
    /// What should be shown, one per printed pass.
    pub transcripts: Vec<Transcript>,
    /// Statistics of every best-of candidate, in order. Empty in other modes.
    pub candidates:  Vec<Statistics>,
    /// Index of the chosen best-of candidate.
    pub winner:      Option<usize>,
}

impl Analysis {
    /// The pass/fail verdict.
    pub fn result(&self) -> bool {
        self.statistics.result()
    }
}

/// Feeds a stream through `analyser`: start, every line, finish.
///
/// Stop requests that reach this level are logged and otherwise ignored;
/// strategies wrap analysers so that they are handled below.
pub fn run_pass(stream: &mut AnnotatedStream, analyser: &mut dyn StreamAnalyser) {
    let log = |flow: Flow| {
        if let Flow::SkipTheRest { message, .. } = flow {
            tracing::debug!("unhandled request to skip the rest of the stream: {message}");
        }
    };

    log(analyser.start_stream(&mut stream.head));
    for line in stream.lines.iter_mut() {
        log(analyser.analyse_line(line));
    }
    log(analyser.finish_stream(&mut stream.tail));
}

/// Builds a fresh stream from raw lines.
fn fresh_stream(lines: &[LineContent]) -> AnnotatedStream {
    AnnotatedStream::new(lines.iter().cloned())
}

/// One pass of `analyser` over fresh lines, with skip handling inside and a
/// printer outside.
fn printed_pass(lines: &[LineContent], analyser: impl StreamAnalyser) -> (AnnotatedStream, Transcript) {
    let mut stream = fresh_stream(lines);
    let mut printer = PrintAnalyser::new();
    {
        let mut pass = ParallelAnalyser::default();
        pass.push(SkipTheRestAnalyser::new(analyser));
        pass.push(&mut printer);
        run_pass(&mut stream, &mut pass);
    }
    (stream, printer.into_transcript())
}

/// All analysers annotate the same lines in a single pass.
pub fn singlepass(lines: &[LineContent], analysers: Vec<BoxedAnalyser<'_>>) -> Analysis {
    tracing::debug!("singlepass over {} lines with {} analysers", lines.len(), analysers.len());
    let (stream, transcript) = printed_pass(lines, ParallelAnalyser::new(analysers));

    Analysis {
        statistics: stream.statistics(),
        transcripts: vec![transcript],
        ..Default::default()
    }
}

/// Each analyser gets its own pass over fresh lines; statistics are summed
/// and every pass is printed.
pub fn multipass(lines: &[LineContent], analysers: Vec<BoxedAnalyser<'_>>) -> Analysis {
    if analysers.is_empty() {
        return singlepass(lines, analysers);
    }

    let passes = analysers.len();
    let mut analysis = Analysis::default();
    for (index, analyser) in analysers.into_iter().enumerate() {
        tracing::debug!("multipass: pass {} of {passes}", index + 1);
        let (stream, transcript) = printed_pass(lines, analyser);
        analysis.statistics += stream.statistics();
        analysis.transcripts.push(transcript);
    }
    analysis
}

/// Each analyser gets its own pass over fresh lines; the candidate with the
/// fewest crashes, then failures, then warnings wins, the earliest on ties.
/// Only the winner is printed and counted.
pub fn best_of(lines: &[LineContent], analysers: Vec<BoxedAnalyser<'_>>) -> Analysis {
    let candidates: Vec<(AnnotatedStream, Statistics)> = analysers
        .into_iter()
        .map(|analyser| {
            let mut stream = fresh_stream(lines);
            run_pass(&mut stream, &mut SkipTheRestAnalyser::new(analyser));
            let statistics = stream.statistics();
            (stream, statistics)
        })
        .collect();
    let scores: Vec<Statistics> = candidates
        .iter()
        .map(|(_, statistics)| *statistics)
        .collect();

    let Some((winner, (mut stream, statistics))) = candidates
        .into_iter()
        .enumerate()
        .min_by_key(|(_, (_, statistics))| statistics.badness())
    else {
        return singlepass(lines, Vec::new());
    };
    tracing::debug!("best-of: candidate {} of {} wins with {statistics}", winner + 1, scores.len());

    let mut printer = PrintAnalyser::new();
    run_pass(&mut stream, &mut printer);

    Analysis {
        statistics,
        transcripts: vec![printer.into_transcript()],
        candidates: scores,
        winner: Some(winner),
    }
}

/// Runs `analysers` over `lines` the way `mode` says.
pub fn analyse(
    lines: &[LineContent],
    analysers: Vec<BoxedAnalyser<'_>>,
    mode: AnalysisMode,
) -> Analysis {
    match mode {
        AnalysisMode::Singlepass => singlepass(lines, analysers),
        AnalysisMode::Multipass => multipass(lines, analysers),
        AnalysisMode::BestOf => best_of(lines, analysers),
    }
}
