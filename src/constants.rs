#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Similarity ratio a line must exceed to count as a near miss of an expected
/// line.
pub const DEFAULT_SIMILARITY: f32 = 0.6;

/// Most significant digits a floating point comparison may ask for; an `f64`
/// holds no more than this.
pub const MAX_SIGNIFICANT_DIGITS: u32 = 17;

/// Prefix of the line the JVM prints for an uncaught exception.
pub const EXCEPTION_PREFIX: &str = "Exception in";

/// Markers of a launcher that could not find the class to run, lowercased.
pub const MISSING_MAIN_CLASS_MARKERS: [&str; 2] =
    ["could not find or load main class", "main class not found"];

/// Environment variable selecting the default analysis mode.
pub const MODE_ENV: &str = "STREAMGRADE_MODE";

/// Environment variable overriding the default near-miss similarity.
pub const SIMILARITY_ENV: &str = "STREAMGRADE_SIMILARITY";

/// Environment variable that disables coloured output when set.
pub const NO_COLOR_ENV: &str = "NO_COLOR";

/// Exit code of a run where every check passed.
pub const EXIT_PASSED: i32 = 0;

/// Exit code of a run where some check failed.
pub const EXIT_FAILED: i32 = 1;

/// Exit code of a run where some check could not be built.
pub const EXIT_MISCONFIGURED: i32 = 2;
