#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{
    fmt::Display,
    ops::{Add, AddAssign},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::annotation::Severity;

/// Counts of annotations per severity, for one analysis run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statistics {
    /// Number of successes.
    pub successes: u64,
    /// Number of infos.
    pub infos:     u64,
    /// Number of warnings.
    pub warnings:  u64,
    /// Number of failures.
    pub failures:  u64,
    /// Number of crashes.
    pub crashes:   u64,
}

impl Statistics {
    /// Returns the counter for `severity`.
    pub fn count(&self, severity: Severity) -> u64 {
        match severity {
            Severity::Success => self.successes,
            Severity::Info => self.infos,
            Severity::Warning => self.warnings,
            Severity::Failure => self.failures,
            Severity::Crash => self.crashes,
        }
    }

    /// Adds one to the counter for `severity`.
    pub fn increment(&mut self, severity: Severity) {
        let counter = match severity {
            Severity::Success => &mut self.successes,
            Severity::Info => &mut self.infos,
            Severity::Warning => &mut self.warnings,
            Severity::Failure => &mut self.failures,
            Severity::Crash => &mut self.crashes,
        };
        *counter += 1;
    }

    /// Pointwise sum of two statistics.
    pub fn merge(&self, other: &Statistics) -> Statistics {
        Statistics {
            successes: self.successes + other.successes,
            infos:     self.infos + other.infos,
            warnings:  self.warnings + other.warnings,
            failures:  self.failures + other.failures,
            crashes:   self.crashes + other.crashes,
        }
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        Severity::ALL.iter().map(|&severity| self.count(severity)).sum()
    }

    /// Share of `severity` in the total, in percent. Zero when nothing was
    /// counted.
    pub fn percentage(&self, severity: Severity) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.count(severity) as f64 * 100.0 / total as f64,
        }
    }

    /// The worst severity counted at least once.
    pub fn worst(&self) -> Option<Severity> {
        Severity::ALL
            .iter()
            .rev()
            .copied()
            .find(|&severity| self.count(severity) > 0)
    }

    /// The pass/fail verdict: nothing went wrong and something went right.
    pub fn result(&self) -> bool {
        self.failures == 0
            && self.warnings == 0
            && self.crashes == 0
            && (self.successes > 0 || self.infos > 0)
    }

    /// Ordering key used to pick the best candidate: fewer crashes, then fewer
    /// failures, then fewer warnings.
    pub fn badness(&self) -> (u64, u64, u64) {
        (self.crashes, self.failures, self.warnings)
    }
}

impl Add for Statistics {
    type Output = Statistics;

    fn add(self, rhs: Statistics) -> Self::Output {
        self.merge(&rhs)
    }
}

impl AddAssign for Statistics {
    fn add_assign(&mut self, rhs: Statistics) {
        *self = self.merge(&rhs);
    }
}

impl Display for Statistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts = Severity::ALL
            .iter()
            .filter(|&&severity| self.count(severity) > 0)
            .map(|&severity| format!("{} {}", self.count(severity), severity.plural()))
            .join(", ");

        if parts.is_empty() {
            f.write_str("nothing to report")
        } else {
            f.write_str(&parts)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_of_empty_statistics_is_zero() {
        assert_eq!(Statistics::default().percentage(Severity::Failure), 0.0);
    }

    #[test]
    fn percentage_over_total() {
        let statistics = Statistics {
            successes: 3,
            failures: 1,
            ..Default::default()
        };
        assert_eq!(statistics.percentage(Severity::Success), 75.0);
        assert_eq!(statistics.percentage(Severity::Failure), 25.0);
    }

    #[test]
    fn display_lists_nonzero_counters_with_plural_names() {
        let statistics = Statistics {
            successes: 2,
            crashes: 1,
            ..Default::default()
        };
        assert_eq!(statistics.to_string(), "2 successes, 1 crashes");
        assert_eq!(Statistics::default().to_string(), "nothing to report");
    }

    #[test]
    fn worst_picks_highest_severity() {
        let statistics = Statistics {
            infos: 1,
            warnings: 2,
            ..Default::default()
        };
        assert_eq!(statistics.worst(), Some(Severity::Warning));
        assert_eq!(Statistics::default().worst(), None);
    }
}
