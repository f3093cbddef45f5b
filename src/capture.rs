#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{fmt::Display, path::Path, str::FromStr};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{annotation::LineContent, error::ConfigError};

/// Which captured stream a check looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Standard output.
    #[default]
    Stdout,
    /// Standard error.
    Stderr,
}

impl FromStr for StreamKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stdout" => Ok(StreamKind::Stdout),
            "stderr" => Ok(StreamKind::Stderr),
            _ => Err(ConfigError::UnknownStream(s.to_string())),
        }
    }
}

impl Display for StreamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        })
    }
}

/// Splits captured bytes into lines.
///
/// Lines end at `\n`; a `\r` before it is dropped, and so is the empty piece
/// after a final newline. Lines that are not valid UTF-8 keep their bytes.
pub fn split_lines(bytes: &[u8]) -> Vec<LineContent> {
    if bytes.is_empty() {
        return Vec::new();
    }

    let bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    bytes
        .split(|&byte| byte == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .map(|line| LineContent::from(line.to_vec()))
        .collect()
}

/// Output of a program that already finished.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapturedOutput {
    /// Lines written to standard output.
    stdout:      Vec<LineContent>,
    /// Lines written to standard error.
    stderr:      Vec<LineContent>,
    /// Return code, `None` if the program was stopped for taking too long.
    return_code: Option<i32>,
    /// Wall time in seconds, if measured.
    elapsed:     Option<f64>,
}

impl CapturedOutput {
    /// Wraps raw captured bytes.
    pub fn from_bytes(stdout: &[u8], stderr: &[u8], return_code: Option<i32>) -> Self {
        Self {
            stdout: split_lines(stdout),
            stderr: split_lines(stderr),
            return_code,
            elapsed: None,
        }
    }

    /// Wraps captured text.
    pub fn from_text(stdout: &str, stderr: &str, return_code: Option<i32>) -> Self {
        Self::from_bytes(stdout.as_bytes(), stderr.as_bytes(), return_code)
    }

    /// Reads captured streams from files. A missing path means the stream was
    /// empty.
    pub fn from_files(
        stdout: Option<&Path>,
        stderr: Option<&Path>,
        return_code: Option<i32>,
    ) -> Result<Self> {
        let read = |path: Option<&Path>| -> Result<Vec<u8>> {
            match path {
                Some(path) => std::fs::read(path)
                    .with_context(|| format!("Could not read captured output: {}", path.display())),
                None => Ok(Vec::new()),
            }
        };

        Ok(Self::from_bytes(&read(stdout)?, &read(stderr)?, return_code))
    }

    /// Records how long the program ran.
    pub fn with_elapsed(mut self, elapsed: Option<f64>) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Returns the lines of `stream`.
    pub fn lines(&self, stream: StreamKind) -> &[LineContent] {
        match stream {
            StreamKind::Stdout => &self.stdout,
            StreamKind::Stderr => &self.stderr,
        }
    }

    /// Returns the return code, `None` on timeout.
    pub fn return_code(&self) -> Option<i32> {
        self.return_code
    }

    /// Returns the elapsed time in seconds.
    pub fn elapsed(&self) -> Option<f64> {
        self.elapsed
    }

    /// Whether the program was stopped for taking too long.
    pub fn timed_out(&self) -> bool {
        self.return_code.is_none()
    }
}
