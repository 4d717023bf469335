//! Error types for the harness

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Playwright not found. Install with: npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright bridge error: {0}")]
    Playwright(String),

    #[error("Could not resolve {capability} ({locator})")]
    Resolution { capability: String, locator: String },

    #[error("Timed out after {elapsed:?} waiting for {condition}")]
    Timeout { condition: String, elapsed: Duration },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("{} does not match {}: similarity {score:.10} below threshold {threshold}", artifact.display(), golden.display())]
    SimilarityMismatch {
        artifact: PathBuf,
        golden: PathBuf,
        score: f64,
        threshold: f64,
    },

    #[error("Line index {index} is out of range ({len} lines visible)")]
    OutOfRange { index: usize, len: usize },

    #[error("Option '{option}' not found in {selector}")]
    OptionNotFound { selector: String, option: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Scenario parse error: {0}")]
    SpecParse(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// True when the artifact or UI state simply did not match what the
    /// scenario expected, as opposed to the harness or environment failing.
    pub fn is_expectation_failure(&self) -> bool {
        matches!(
            self,
            E2eError::SimilarityMismatch { .. } | E2eError::AssertionFailed(_)
        )
    }

    pub(crate) fn assertion(what: &str, expected: impl std::fmt::Display, actual: impl std::fmt::Display) -> Self {
        E2eError::AssertionFailed(format!("{what}: expected {expected}, got {actual}"))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
