#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! # streamgrade
//! ## Introduction
//!
//! Grades the captured output of a student program against instructor
//! checks, and shows the student every line with what was found wrong or
//! right about it.
//!
//! ## Usage
//!
//! `streamgrade check checks.json --stdout out.txt --stderr err.txt --return-code 0`
//!
//! Exits with 0 if every check passed, 1 if any failed, and 2 if a check is
//! misconfigured.

use std::path::PathBuf;

use anyhow::{Context, Result};
use bpaf::*;
use dotenvy::dotenv;
use streamgrade::{
    Report,
    capture::CapturedOutput,
    check::load_checks,
    config::{Settings, settings},
};
use tracing::{Level, metadata::LevelFilter};
use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt};

/// How the program under test ended.
#[derive(Debug, Clone)]
enum Ending {
    /// It exited with this code.
    Exited(i32),
    /// It was stopped for taking too long.
    TimedOut,
}

/// Arguments of the `check` subcommand.
#[derive(Debug, Clone)]
struct CheckArgs {
    /// Path to the checks file.
    checks:  PathBuf,
    /// Captured standard output.
    stdout:  Option<PathBuf>,
    /// Captured standard error.
    stderr:  Option<PathBuf>,
    /// How the program ended.
    ending:  Ending,
    /// Wall time in seconds.
    elapsed: Option<f64>,
    /// Print JSON instead of text.
    json:    bool,
    /// Never colour the output.
    plain:   bool,
}

/// Top-level CLI commands.
#[derive(Debug, Clone)]
enum Cmd {
    /// Grade captured output
    Check(CheckArgs),
}

/// Parse the command line arguments and return a `Cmd` enum
fn options() -> Cmd {
    let checks = positional::<PathBuf>("CHECKS").help("Path to a JSON file of checks");
    let stdout = long("stdout")
        .help("File holding the captured standard output")
        .argument::<PathBuf>("FILE")
        .optional();
    let stderr = long("stderr")
        .help("File holding the captured standard error")
        .argument::<PathBuf>("FILE")
        .optional();

    let exited = long("return-code")
        .help("Return code of the program")
        .argument::<i32>("CODE")
        .fallback(0)
        .map(Ending::Exited);
    let timed_out = long("timed-out")
        .help("The program was stopped for taking too long")
        .req_flag(Ending::TimedOut);
    let ending = construct!([timed_out, exited]);

    let elapsed = long("elapsed")
        .help("How long the program ran, in seconds")
        .argument::<f64>("SECS")
        .optional();
    let json = long("json").help("Print the report as JSON").switch();
    let plain = long("no-color").help("Do not colour the output").switch();

    let check = construct!(CheckArgs {
        stdout,
        stderr,
        ending,
        elapsed,
        json,
        plain,
        checks,
    })
    .map(Cmd::Check)
    .to_options()
    .command("check")
    .help("Grade captured program output against a checks file");

    let cmd = construct!([check]);

    cmd.to_options()
        .descr("Grades captured program output line by line")
        .run()
}

/// Runs the checks and prints the report, returning the exit code.
fn check(args: CheckArgs, settings: &Settings) -> Result<i32> {
    let checks = load_checks(&args.checks)?;
    tracing::info!("Loaded {} checks from {}", checks.len(), args.checks.display());

    let return_code = match args.ending {
        Ending::Exited(code) => Some(code),
        Ending::TimedOut => None,
    };
    let output = CapturedOutput::from_files(
        args.stdout.as_deref(),
        args.stderr.as_deref(),
        return_code,
    )?
    .with_elapsed(args.elapsed);

    let report = Report::run(&checks, &output, settings);
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        let color = settings.color() && !args.plain;
        colored::control::set_override(color);
        println!("{}", report.render(color));
    }

    Ok(report.exit_code())
}

fn main() -> Result<()> {
    dotenv().ok();

    let fmt = fmt::layer()
        .without_time()
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);
    let filter_layer = LevelFilter::from_level(Level::INFO);
    tracing_subscriber::registry()
        .with(fmt)
        .with(filter_layer)
        .init();

    let code = match options() {
        Cmd::Check(args) => {
            let checks = args.checks.clone();
            check(args, settings())
                .with_context(|| format!("Failed to grade against `{}`", checks.display()))?
        }
    };

    std::process::exit(code);
}
