#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::sync::OnceLock;

use crate::{
    constants::{DEFAULT_SIMILARITY, MODE_ENV, NO_COLOR_ENV, SIMILARITY_ENV},
    error::ConfigError,
    strategy::AnalysisMode,
};

/// Defaults shared by every check, sourced from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Mode used by checks that do not name one.
    default_mode: AnalysisMode,
    /// Near-miss threshold used by line sets that do not set one.
    similarity:   f32,
    /// Whether terminal output is coloured.
    color:        bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_mode: AnalysisMode::default(),
            similarity:   DEFAULT_SIMILARITY,
            color:        true,
        }
    }
}

impl Settings {
    /// Reads settings from the environment, falling back to defaults for
    /// anything unset or unreadable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| {
            std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
        })
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Invalid values are logged and replaced by the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let default_mode = match lookup(MODE_ENV) {
            Some(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("Ignoring {MODE_ENV}: {e}");
                defaults.default_mode
            }),
            None => defaults.default_mode,
        };

        let similarity = match lookup(SIMILARITY_ENV).map(|value| value.trim().parse::<f32>()) {
            Some(Ok(value)) if (0.0..=1.0).contains(&value) => value,
            Some(Ok(value)) => {
                tracing::warn!("Ignoring {SIMILARITY_ENV}: {}", ConfigError::InvalidSimilarity(value));
                defaults.similarity
            }
            Some(Err(e)) => {
                tracing::warn!("Ignoring {SIMILARITY_ENV}: {e}");
                defaults.similarity
            }
            None => defaults.similarity,
        };

        let color = lookup(NO_COLOR_ENV).is_none_or(|value| value.is_empty());

        Self {
            default_mode,
            similarity,
            color,
        }
    }

    /// Returns the default analysis mode.
    pub fn default_mode(&self) -> AnalysisMode {
        self.default_mode
    }

    /// Sets the default analysis mode.
    pub fn with_default_mode(mut self, default_mode: AnalysisMode) -> Self {
        self.default_mode = default_mode;
        self
    }

    /// Returns the default near-miss similarity.
    pub fn similarity(&self) -> f32 {
        self.similarity
    }

    /// Returns whether output is coloured.
    pub fn color(&self) -> bool {
        self.color
    }

    /// Turns colours on or off.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }
}

/// Process-wide settings, read from the environment on first use.
static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Returns the process-wide settings.
pub fn settings() -> &'static Settings {
    SETTINGS.get_or_init(Settings::from_env)
}
