use streamgrade::{
    analyser::{
        BoxedAnalyser, Condition, ExceptionAnalyser, Flow, LineByLineAnalyser, StreamAnalyser,
    },
    annotation::{Annotatable, AnnotatedLine, AnnotatedStream},
    combinator::{BlockwiseAnalyser, ParallelAnalyser, SkipLinesAnalyser, SkipTheRestAnalyser},
    strategy::run_pass,
};

/// Records which callbacks it saw, and asks to stop at a given line.
#[derive(Default)]
struct Recorder {
    stop_at:  Option<usize>,
    hide:     bool,
    started:  bool,
    seen:     Vec<usize>,
    finished: bool,
}

impl Recorder {
    fn stopping_at(line: usize, hide: bool) -> Self {
        Self {
            stop_at: Some(line),
            hide,
            ..Default::default()
        }
    }
}

impl StreamAnalyser for Recorder {
    fn start_stream(&mut self, _stream: &mut Annotatable) -> Flow {
        self.started = true;
        Flow::Continue
    }

    fn analyse_line(&mut self, line: &mut AnnotatedLine) -> Flow {
        self.seen.push(line.number());
        if self.stop_at == Some(line.number()) {
            Flow::skip_the_rest("Stopped early.", self.hide)
        } else {
            Flow::Continue
        }
    }

    fn finish_stream(&mut self, _stream: &mut Annotatable) -> Flow {
        self.finished = true;
        Flow::Continue
    }
}

fn boxed(analyser: impl StreamAnalyser + 'static) -> BoxedAnalyser<'static> {
    Box::new(analyser)
}

fn messages(annotatable: &Annotatable) -> Vec<&str> {
    annotatable.annotations().iter().map(|a| a.message()).collect()
}

#[test]
fn skip_the_rest_marks_later_lines_and_stops_forwarding() {
    let mut recorder = Recorder::stopping_at(2, true);
    let mut stream = AnnotatedStream::new(["1", "2", "3", "4"]);
    {
        let mut analyser = SkipTheRestAnalyser::new(&mut recorder);
        run_pass(&mut stream, &mut analyser);
        assert!(analyser.is_skipping());
    }

    assert!(recorder.started);
    assert_eq!(recorder.seen, [1, 2]);
    assert!(!recorder.finished);
    assert_eq!(messages(&stream.lines[1].after), ["Stopped early."]);
    assert!(!stream.lines[1].skip);
    for line in &stream.lines[2..] {
        assert!(line.skip);
        assert!(line.hide);
    }

    let statistics = stream.statistics();
    assert_eq!(statistics.successes, 1);
    assert_eq!(statistics.infos, 1);
    assert!(statistics.result());
}

#[test]
fn skip_the_rest_without_hide_keeps_lines_visible() {
    let mut stream = AnnotatedStream::new(["1", "2", "3"]);
    run_pass(
        &mut stream,
        &mut SkipTheRestAnalyser::new(Recorder::stopping_at(1, false)),
    );

    assert!(stream.lines[1].skip);
    assert!(!stream.lines[1].hide);
}

#[test]
fn parallel_annotations_land_on_the_same_line() {
    let mut stream = AnnotatedStream::new(["a", "x"]);
    let mut parallel = ParallelAnalyser::new([
        boxed(LineByLineAnalyser::new(["a", "b"])),
        boxed(LineByLineAnalyser::new(["a", "c"])),
    ]);
    run_pass(&mut stream, &mut parallel);

    assert_eq!(parallel.len(), 2);
    assert_eq!(messages(&stream.lines[1].after), ["Expected: b", "Expected: c"]);
    assert_eq!(stream.statistics().failures, 2);
}

#[test]
fn parallel_stops_forwarding_a_callback_after_a_skip_request() {
    let mut first = Recorder::stopping_at(1, false);
    let mut second = Recorder::default();
    let mut stream = AnnotatedStream::new(["1", "2"]);
    {
        let mut parallel = ParallelAnalyser::default();
        parallel.push(&mut first);
        parallel.push(&mut second);
        let flow = parallel.analyse_line(&mut stream.lines[0]);
        assert!(!flow.is_continue());
        let _ = parallel.analyse_line(&mut stream.lines[1]);
    }

    assert_eq!(first.seen, [1, 2]);
    assert_eq!(second.seen, [2]);
}

#[test]
fn blockwise_gives_each_block_its_own_analyser() {
    let mut stream = AnnotatedStream::new(["a", "---", "b"]);
    let mut analyser = BlockwiseAnalyser::new(
        Condition::regex("---").expect("valid"),
        [
            boxed(LineByLineAnalyser::new(["a"])),
            boxed(LineByLineAnalyser::new(["b"])),
        ],
    );
    run_pass(&mut stream, &mut analyser);

    let statistics = stream.statistics();
    assert_eq!(statistics.failures, 0);
    assert_eq!(statistics.successes, 3);
}

#[test]
fn blockwise_finishes_a_block_before_its_separator() {
    let mut stream = AnnotatedStream::new(["a", "---", "c"]);
    let mut analyser = BlockwiseAnalyser::new(
        Condition::regex("---").expect("valid"),
        [
            boxed(LineByLineAnalyser::new(["a", "z"])),
            boxed(LineByLineAnalyser::new(["b"])),
        ],
    );
    run_pass(&mut stream, &mut analyser);

    assert_eq!(
        messages(&stream.lines[1].before),
        ["Expected 1 more line. Next expected: z"]
    );
    assert_eq!(messages(&stream.lines[2].after), ["Expected: b"]);
}

#[test]
fn blockwise_fails_when_blocks_are_missing() {
    let mut stream = AnnotatedStream::new(["a"]);
    let mut analyser = BlockwiseAnalyser::new(
        Condition::regex("---").expect("valid"),
        [
            boxed(LineByLineAnalyser::new(["a"])),
            boxed(LineByLineAnalyser::new(["b"])),
        ],
    );
    run_pass(&mut stream, &mut analyser);

    assert_eq!(messages(&stream.tail), ["Expected more output."]);
}

#[test]
fn blockwise_leaves_extra_blocks_unchecked() {
    let mut stream = AnnotatedStream::new(["a", "---", "anything"]);
    let mut analyser = BlockwiseAnalyser::new(
        Condition::regex("---").expect("valid"),
        [boxed(LineByLineAnalyser::new(["a"]))],
    );
    run_pass(&mut stream, &mut analyser);

    assert!(stream.statistics().result());
}

#[test]
fn skip_lines_hides_blank_lines_from_the_inner_analyser() {
    let mut stream = AnnotatedStream::new(["a", "", "   ", "b"]);
    run_pass(
        &mut stream,
        &mut SkipLinesAnalyser::new(LineByLineAnalyser::new(["a", "b"])),
    );

    assert_eq!(stream.statistics().failures, 0);
    assert!(stream.tail.is_empty());
}

#[test]
fn skip_lines_with_a_pattern() {
    let mut stream = AnnotatedStream::new(["# comment", "a"]);
    run_pass(
        &mut stream,
        &mut SkipLinesAnalyser::with_condition(
            LineByLineAnalyser::new(["a"]),
            Condition::regex("#").expect("valid"),
        ),
    );

    assert!(stream.statistics().result());
}

#[test]
fn exception_can_skip_the_rest_of_the_stream() {
    let mut stream = AnnotatedStream::new([
        "first",
        "Exception in thread \"main\" java.lang.NullPointerException",
        "\tat Main.main(Main.java:3)",
        "second",
    ]);
    run_pass(
        &mut stream,
        &mut SkipTheRestAnalyser::new(
            ExceptionAnalyser::new(LineByLineAnalyser::new(["first", "second", "third"]))
                .skip_rest(true),
        ),
    );

    assert!(stream.lines[2].skip);
    assert!(stream.lines[3].skip);
    assert!(stream.tail.is_empty());

    let statistics = stream.statistics();
    assert_eq!(statistics.crashes, 1);
    assert_eq!(statistics.infos, 1);
    assert_eq!(statistics.failures, 0);
}
