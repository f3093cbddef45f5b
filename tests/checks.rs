use serde_json::Value;
use streamgrade::{
    Report,
    annotation::LineContent,
    capture::{CapturedOutput, StreamKind, split_lines},
    check::{AnalyserSpec, CheckOutcome, CheckSpec, Expected, NormalizerKind, load_checks, parse_checks},
    config::Settings,
    constants::{DEFAULT_SIMILARITY, EXIT_FAILED, EXIT_MISCONFIGURED, EXIT_PASSED},
    error::ConfigError,
    strategy::AnalysisMode,
};
use uuid::Uuid;

const CHECKS: &str = r#"[
    {
        "name": "greeting",
        "analysers": [
            { "kind": "line_by_line", "expected": "Hello\nWorld" },
            { "kind": "number_of_lines", "expected": 2 }
        ],
        "expected_exit_code": 0
    },
    {
        "name": "warnings on stderr",
        "stream": "stderr",
        "mode": "best-of",
        "analysers": [
            { "kind": "line_set", "expected": ["careful", "very careful"] },
            { "kind": "match_line", "pattern": "care" }
        ]
    }
]"#;

fn line_by_line(expected: &[&str]) -> AnalyserSpec {
    AnalyserSpec::LineByLine {
        expected:   Expected::Lines(expected.iter().map(|s| s.to_string()).collect()),
        normalizer: NormalizerKind::Default,
    }
}

#[test]
fn checks_parse_from_json() {
    let checks = parse_checks(CHECKS).expect("valid checks");

    assert_eq!(checks.len(), 2);
    assert_eq!(checks[0].name, "greeting");
    assert_eq!(checks[0].stream, "stdout");
    assert_eq!(checks[0].expected_exit_code, Some(0));
    assert_eq!(checks[1].mode.as_deref(), Some("best-of"));
    assert!(matches!(
        &checks[0].analysers[0],
        AnalyserSpec::LineByLine { expected: Expected::Block(_), .. }
    ));
}

#[test]
fn a_single_check_parses_too() {
    let checks = parse_checks(r#"{ "name": "one", "analysers": [{ "kind": "error" }] }"#)
        .expect("valid check");
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0].analysers, [AnalyserSpec::Error { inner: None }]);
}

#[test]
fn malformed_json_is_an_error() {
    assert!(parse_checks(r#"{ "analysers": [] }"#).is_err());
    assert!(parse_checks(r#"[{ "name": "x", "analysers": [{ "kind": "nope" }] }]"#).is_err());
}

#[test]
fn report_passes_matching_output() {
    let checks = parse_checks(CHECKS).expect("valid checks");
    let output = CapturedOutput::from_text("Hello\nWorld\n", "very careful\ncareful\n", Some(0));
    let report = Report::run(&checks, &output, &Settings::default());

    assert!(report.passed(), "{}", report.render(false));
    assert_eq!(report.exit_code(), EXIT_PASSED);
}

#[test]
fn report_fails_mismatching_output() {
    let checks = parse_checks(CHECKS).expect("valid checks");
    let output = CapturedOutput::from_text("Hello\nMoon\n", "careful\n", Some(0));
    let report = Report::run(&checks, &output, &Settings::default());

    assert!(!report.outcomes[0].passed());
    assert!(report.outcomes[1].passed());
    assert_eq!(report.exit_code(), EXIT_FAILED);
    assert!(report.render(false).contains("Expected: World"));
}

#[test]
fn bad_regex_is_misconfigured_not_failed() {
    let check = CheckSpec::builder()
        .name("broken")
        .analysers([AnalyserSpec::MatchLine {
            pattern:    "(unclosed".to_string(),
            must_match: true,
            message:    None,
        }])
        .build();
    let outcome = check.run(&CapturedOutput::from_text("x", "", Some(0)), &Settings::default());

    assert!(outcome.is_misconfigured());
    assert!(!outcome.passed());
    assert!(matches!(
        outcome,
        CheckOutcome::Misconfigured { error: ConfigError::InvalidPattern { .. }, .. }
    ));
}

#[test]
fn unknown_mode_and_stream_are_misconfigured() {
    let output = CapturedOutput::from_text("x", "", Some(0));
    let settings = Settings::default();

    let mode = CheckSpec::builder()
        .name("mode")
        .mode("twopass".to_string())
        .build()
        .run(&output, &settings);
    assert!(matches!(
        mode,
        CheckOutcome::Misconfigured { error: ConfigError::UnknownMode(_), .. }
    ));

    let stream = CheckSpec::builder()
        .name("stream")
        .stream("stdin")
        .build()
        .run(&output, &settings);
    assert!(matches!(
        stream,
        CheckOutcome::Misconfigured { error: ConfigError::UnknownStream(_), .. }
    ));
}

#[test]
fn misconfiguration_wins_the_exit_code() {
    let checks = parse_checks(
        r#"[
            { "name": "fine", "analysers": [{ "kind": "number_of_lines", "expected": 1 }] },
            { "name": "broken", "analysers": [{ "kind": "floating_point", "expected": ["1.0"], "digits": 0 }] }
        ]"#,
    )
    .expect("valid checks");
    let report = Report::run(&checks, &CapturedOutput::from_text("1\n", "", Some(0)), &Settings::default());

    assert_eq!(report.exit_code(), EXIT_MISCONFIGURED);
    assert!(report.render(false).contains("This check is misconfigured"));
    assert!(report.summary_table().contains("misconfigured"));

    let json: Value = serde_json::from_str(&report.to_json().expect("serializes")).expect("json");
    assert_eq!(json["outcomes"][0]["state"], "graded");
    assert_eq!(json["outcomes"][1]["state"], "misconfigured");
    assert_eq!(
        json["outcomes"][1]["error"],
        "Floating point comparisons need between 1 and 17 significant digits, got 0."
    );
}

#[test]
fn timeout_is_a_crash() {
    let check = CheckSpec::builder()
        .name("timeout")
        .analysers([line_by_line(&["working"])])
        .expected_exit_code(0)
        .build();
    let outcome = check.run(&CapturedOutput::from_text("working\n", "", None), &Settings::default());

    let CheckOutcome::Graded(graded) = outcome else {
        panic!("check should have run");
    };
    assert!(!graded.passed());
    assert_eq!(graded.statistics().crashes, 1);
    assert_eq!(graded.status.len(), 1);
}

#[test]
fn wrong_exit_code_is_a_failure() {
    let check = CheckSpec::builder()
        .name("exit")
        .analysers([line_by_line(&["done"])])
        .expected_exit_code(0)
        .build();
    let outcome = check.run(&CapturedOutput::from_text("done\n", "", Some(1)), &Settings::default());

    assert!(!outcome.passed());
}

#[test]
fn check_level_wrappers_apply_to_every_analyser() {
    let check = CheckSpec::builder()
        .name("wrapped")
        .mode("multipass".to_string())
        .analysers([line_by_line(&["one", "two"]), line_by_line(&["One", "Two"])])
        .skip_blank_lines(true)
        .exceptions(true)
        .build();
    let output = CapturedOutput::from_text(
        "one\n\nException in thread \"main\" java.lang.RuntimeException\n\tat Main.main(Main.java:4)\ntwo\n",
        "",
        Some(1),
    );

    let CheckOutcome::Graded(graded) = check.run(&output, &Settings::default()) else {
        panic!("check should have run");
    };
    assert_eq!(graded.mode, AnalysisMode::Multipass);
    assert_eq!(graded.analysis.transcripts.len(), 2);
    assert_eq!(graded.statistics().failures, 0);
    assert_eq!(graded.statistics().crashes, 2);
}

#[test]
fn singlepass_wrappers_report_a_crash_once() {
    let check = CheckSpec::builder()
        .name("wrapped once")
        .mode("singlepass".to_string())
        .analysers([line_by_line(&["one", "two"]), line_by_line(&["One", "Two"])])
        .exceptions(true)
        .build();
    let output = CapturedOutput::from_text(
        "one\nException in thread \"main\" java.lang.RuntimeException\n\tat Main.main(Main.java:4)\ntwo\n",
        "",
        Some(1),
    );

    let CheckOutcome::Graded(graded) = check.run(&output, &Settings::default()) else {
        panic!("check should have run");
    };
    assert_eq!(graded.analysis.transcripts.len(), 1);
    assert_eq!(graded.statistics().crashes, 1);
    assert_eq!(graded.statistics().failures, 0);
    assert_eq!(graded.analysis.transcripts[0].lines[1].after.len(), 1);
}

#[test]
fn error_analyser_forwards_to_its_inner_analyser() {
    let checks = parse_checks(
        r#"{
            "name": "errors",
            "analysers": [{ "kind": "error", "inner": { "kind": "line_by_line", "expected": ["ok"] } }]
        }"#,
    )
    .expect("valid checks");
    assert!(matches!(
        &checks[0].analysers[0],
        AnalyserSpec::Error { inner: Some(inner) } if matches!(**inner, AnalyserSpec::LineByLine { .. })
    ));

    let report = Report::run(&checks, &CapturedOutput::from_text("ok\nError: bad\n", "", Some(0)), &Settings::default());
    let CheckOutcome::Graded(graded) = &report.outcomes[0] else {
        panic!("check should have run");
    };
    assert_eq!(graded.statistics().failures, 1);
    assert_eq!(graded.statistics().successes, 1);

    let wrong = Report::run(&checks, &CapturedOutput::from_text("nope\n", "", Some(0)), &Settings::default());
    assert!(!wrong.passed());
}

#[test]
fn default_mode_comes_from_settings() {
    let check = CheckSpec::builder()
        .name("defaults")
        .analysers([line_by_line(&["x"]), line_by_line(&["y"])])
        .build();
    let settings = Settings::default().with_default_mode(AnalysisMode::BestOf);

    let CheckOutcome::Graded(graded) = check.run(&CapturedOutput::from_text("y", "", Some(0)), &settings) else {
        panic!("check should have run");
    };
    assert_eq!(graded.mode, AnalysisMode::BestOf);
    assert_eq!(graded.analysis.winner, Some(1));
    assert!(graded.passed());
}

#[test]
fn nested_analysers_build_from_json() {
    let checks = parse_checks(
        r##"{
            "name": "blocks",
            "analysers": [{
                "kind": "blockwise",
                "separator": "-{3}",
                "blocks": [
                    { "kind": "parallel", "members": [
                        { "kind": "line_by_line", "expected": ["a"] },
                        { "kind": "number_of_lines", "expected": 1 }
                    ]},
                    { "kind": "skip_lines", "pattern": "#", "inner":
                        { "kind": "floating_point", "expected": ["2.0"], "digits": 2 } }
                ]
            }]
        }"##,
    )
    .expect("valid checks");
    let output = CapturedOutput::from_text("a\n---\n# note\n2.001\n", "", Some(0));

    let report = Report::run(&checks, &output, &Settings::default());
    assert!(report.passed(), "{}", report.render(false));
}

#[test]
fn checks_load_from_a_file() {
    let path = std::env::temp_dir().join(format!("streamgrade-checks-{}.json", Uuid::new_v4()));
    std::fs::write(&path, CHECKS).expect("write checks");

    let checks = load_checks(&path).expect("load checks");
    assert_eq!(checks.len(), 2);

    std::fs::remove_file(&path).expect("clean up");
    assert!(load_checks(&path).is_err());
}

#[test]
fn captured_bytes_split_into_lines() {
    assert!(split_lines(b"").is_empty());
    assert_eq!(
        split_lines(b"a\r\nb\n"),
        [LineContent::from("a"), LineContent::from("b")]
    );
    assert_eq!(split_lines(b"a\n\n").len(), 2);

    let lines = split_lines(b"ok\n\xff\xfe\n");
    assert!(matches!(lines[1], LineContent::Bytes(_)));
    assert_eq!(lines[1].text(), "\u{fffd}\u{fffd}");
}

#[test]
fn captured_output_from_files() {
    let path = std::env::temp_dir().join(format!("streamgrade-stdout-{}.txt", Uuid::new_v4()));
    std::fs::write(&path, "first\nsecond\n").expect("write output");

    let output = CapturedOutput::from_files(Some(path.as_path()), None, Some(0)).expect("read output");
    assert_eq!(output.lines(StreamKind::Stdout).len(), 2);
    assert!(output.lines(StreamKind::Stderr).is_empty());
    assert!(!output.timed_out());

    std::fs::remove_file(&path).expect("clean up");
}

fn settings_from(vars: &[(&str, &str)]) -> Settings {
    Settings::from_lookup(|key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.to_string())
    })
}

#[test]
fn settings_read_valid_values() {
    let settings = settings_from(&[
        ("STREAMGRADE_MODE", "best-of"),
        ("STREAMGRADE_SIMILARITY", " 0.8 "),
        ("NO_COLOR", "1"),
    ]);

    assert_eq!(settings.default_mode(), AnalysisMode::BestOf);
    assert_eq!(settings.similarity(), 0.8);
    assert!(!settings.color());
}

#[test]
fn invalid_settings_fall_back_to_defaults() {
    for similarity in ["high", "1.5", "-0.1", "NaN"] {
        let settings = settings_from(&[("STREAMGRADE_SIMILARITY", similarity)]);
        assert_eq!(settings.similarity(), DEFAULT_SIMILARITY, "{similarity}");
    }

    let settings = settings_from(&[("STREAMGRADE_MODE", "twopass"), ("NO_COLOR", "")]);
    assert_eq!(settings.default_mode(), AnalysisMode::default());
    assert!(settings.color());
}
