#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Analysers built out of other analysers.

use std::iter::Peekable;

use crate::{
    analyser::{BoxedAnalyser, Condition, Flow, NoopAnalyser, StreamAnalyser},
    annotation::{Annotatable, AnnotatedLine},
};

/// Runs several analysers over the same lines.
///
/// Every callback is forwarded to each member in order, and all annotations
/// land on the same line or stream. If a member asks to skip the rest, the
/// remaining members do not see that callback and the request is passed up.
#[derive(Default)]
pub struct ParallelAnalyser<'a> {
    /// Members, in the order they are called.
    members: Vec<BoxedAnalyser<'a>>,
}

impl<'a> ParallelAnalyser<'a> {
    /// Creates a parallel analyser over `members`.
    pub fn new(members: impl IntoIterator<Item = BoxedAnalyser<'a>>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    /// Appends a member.
    pub fn push(&mut self, member: impl StreamAnalyser + 'a) {
        self.members.push(Box::new(member));
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether there are no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Calls `callback` on each member until one asks to stop.
    fn forward(&mut self, mut callback: impl FnMut(&mut BoxedAnalyser<'a>) -> Flow) -> Flow {
        self.members
            .iter_mut()
            .fold(Flow::Continue, |flow, member| flow.and_then(|| callback(member)))
    }
}

impl StreamAnalyser for ParallelAnalyser<'_> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.forward(|member| member.start_stream(stream))
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        self.forward(|member| member.analyse_line(line))
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.forward(|member| member.finish_stream(stream))
    }
}

/// Lazily produced analysers, one per block.
type Blocks<'a> = Peekable<Box<dyn Iterator<Item = BoxedAnalyser<'a>> + 'a>>;

/// Splits the stream into blocks at separator lines and gives each block its
/// own analyser.
///
/// A separator line ends the current analyser's stream (its end-of-stream
/// annotations go before the separator) and starts the next one (its
/// start-of-stream annotations go after the separator). Separator lines are
/// not forwarded. Running out of analysers leaves the remaining blocks
/// unchecked; running out of blocks while analysers remain is a failure.
pub struct BlockwiseAnalyser<'a> {
    /// Recognises separator lines.
    separator: Condition,
    /// Analysers for the blocks after the current one.
    blocks:    Blocks<'a>,
    /// Analyser of the current block.
    current:   BoxedAnalyser<'a>,
}

impl<'a> BlockwiseAnalyser<'a> {
    /// Creates a blockwise analyser; `blocks` is consumed one analyser per
    /// block, only when the block is reached.
    pub fn new<I>(separator: Condition, blocks: I) -> Self
    where
        I: IntoIterator<Item = BoxedAnalyser<'a>>,
        I::IntoIter: 'a,
    {
        let iter: Box<dyn Iterator<Item = BoxedAnalyser<'a>> + 'a> = Box::new(blocks.into_iter());
        let mut blocks = iter.peekable();
        let current = blocks.next().unwrap_or_else(|| Box::new(NoopAnalyser));
        Self {
            separator,
            blocks,
            current,
        }
    }

    /// Moves on to the next analyser, or a no-op one if there is none.
    fn advance(&mut self) {
        self.current = self
            .blocks
            .next()
            .unwrap_or_else(|| Box::new(NoopAnalyser));
    }
}

impl StreamAnalyser for BlockwiseAnalyser<'_> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.current.start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        if !self.separator.matches(&line.text()) {
            return self.current.analyse_line(line);
        }

        let finished = self.current.finish_stream(&mut line.before);
        self.advance();
        let started = self.current.start_stream(&mut line.after);
        finished.and_then(|| started)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        let flow = self.current.finish_stream(stream);
        if self.blocks.peek().is_some() {
            stream.failure("Expected more output.");
        }
        flow
    }
}

/// Turns a skip-the-rest request of the wrapped analyser into an info
/// annotation, then skips every later line.
///
/// Once triggered, later lines are marked `skip` (and `hide` if requested) and
/// the wrapped analyser is not called again.
#[derive(Debug, Clone)]
pub struct SkipTheRestAnalyser<A> {
    /// The analyser that may ask to stop.
    inner:    A,
    /// `Some(hide)` once triggered.
    skipping: Option<bool>,
}

impl<A: StreamAnalyser> SkipTheRestAnalyser<A> {
    /// Wraps `inner`.
    pub fn new(inner: A) -> Self {
        Self {
            inner,
            skipping: None,
        }
    }

    /// Whether the rest of the stream is being skipped.
    pub fn is_skipping(&self) -> bool {
        self.skipping.is_some()
    }

    /// Records a stop request on `target`.
    fn handle(&mut self, flow: Flow, target: &mut Annotatable) {
        if let Flow::SkipTheRest { message, hide } = flow {
            tracing::debug!("skipping the rest of the stream: {message}");
            target.info(message);
            self.skipping = Some(hide);
        }
    }
}

impl<A: StreamAnalyser> StreamAnalyser for SkipTheRestAnalyser<A> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        if self.skipping.is_none() {
            let flow = self.inner.start_stream(stream);
            self.handle(flow, stream);
        }
        Flow::Continue
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        match self.skipping {
            Some(hide) => {
                line.skip = true;
                line.hide |= hide;
            }
            None => {
                let flow = self.inner.analyse_line(line);
                self.handle(flow, &mut line.after);
            }
        }
        Flow::Continue
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        if self.skipping.is_none() {
            let flow = self.inner.finish_stream(stream);
            self.handle(flow, stream);
        }
        Flow::Continue
    }
}

/// Keeps lines matching a condition away from the wrapped analyser.
///
/// Filtered lines are left untouched: they are neither annotated nor skipped.
#[derive(Debug, Clone)]
pub struct SkipLinesAnalyser<A> {
    /// Lines matching this are not forwarded.
    condition: Condition,
    /// Receives every other line.
    inner:     A,
}

impl<A: StreamAnalyser> SkipLinesAnalyser<A> {
    /// Filters out blank lines.
    pub fn new(inner: A) -> Self {
        Self::with_condition(inner, Condition::blank())
    }

    /// Filters out lines matching `condition`.
    pub fn with_condition(inner: A, condition: Condition) -> Self {
        Self { condition, inner }
    }
}

impl<A: StreamAnalyser> StreamAnalyser for SkipLinesAnalyser<A> {
    fn start_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.start_stream(stream)
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        if self.condition.matches(&line.text()) {
            return Flow::Continue;
        }
        self.inner.analyse_line(line)
    }

    fn finish_stream(&mut self, stream: &mut Annotatable) -> Flow {
        self.inner.finish_stream(stream)
    }
}
