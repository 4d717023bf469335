//! Harness configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{E2eError, E2eResult};
use crate::playwright::Browser;
use crate::wait::WaitPolicy;

/// Default SSIM threshold for raster artifacts
pub const DEFAULT_RASTER_THRESHOLD: f64 = 0.99;

/// Default similarity ratio threshold for vector artifacts
pub const DEFAULT_VECTOR_THRESHOLD: f64 = 0.9999;

/// Harness configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// URL of the deployed visualizer
    pub base_url: String,

    /// Where the browser saves exported artifacts
    pub download_dir: PathBuf,

    /// Directory holding golden references
    pub golden_dir: PathBuf,

    /// Directory of YAML scenario files
    pub scenarios_dir: PathBuf,

    /// Directory for results and diff images
    pub output_dir: PathBuf,

    /// File stem the application uses for exports
    pub artifact_stem: String,

    pub browser: BrowserConfig,
    pub oracle: OracleConfig,
    pub timing: TimingConfig,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mddvisualizer.z36.web.core.windows.net".to_string(),
            download_dir: PathBuf::from("test-results/downloads"),
            golden_dir: PathBuf::from("expected_graph_diagrams"),
            scenarios_dir: PathBuf::from("scenarios"),
            output_dir: PathBuf::from("test-results"),
            artifact_stem: "Decision_Diagram".to_string(),
            browser: BrowserConfig::default(),
            oracle: OracleConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub browser: Browser,
    pub headless: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,

    /// Implicit wait applied by the automation layer to element lookups
    pub implicit_wait_ms: u64,

    /// Upper bound for a single automation command
    pub command_timeout_ms: u64,

    /// NODE_PATH used to resolve the `playwright` package
    pub node_path: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            browser: Browser::Chromium,
            headless: true,
            viewport_width: 1920,
            viewport_height: 1080,
            implicit_wait_ms: 1_000,
            command_timeout_ms: 30_000,
            node_path: None,
        }
    }
}

/// Similarity thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Minimum SSIM score, in [-1, 1]
    pub raster_threshold: f64,

    /// Minimum matching-block ratio, in [0, 1]
    pub vector_threshold: f64,

    /// Where diff images of raster mismatches go (none when unset)
    pub diff_dir: Option<PathBuf>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            raster_threshold: DEFAULT_RASTER_THRESHOLD,
            vector_threshold: DEFAULT_VECTOR_THRESHOLD,
            diff_dir: None,
        }
    }
}

/// Timeouts and poll intervals, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub render_timeout_ms: u64,
    pub render_poll_ms: u64,
    pub download_timeout_ms: u64,
    pub download_poll_ms: u64,
    pub style_timeout_ms: u64,
    pub style_poll_ms: u64,
    pub app_ready_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            render_timeout_ms: 10_000,
            render_poll_ms: 50,
            download_timeout_ms: 10_000,
            download_poll_ms: 250,
            style_timeout_ms: 10_000,
            style_poll_ms: 100,
            app_ready_timeout_ms: 30_000,
        }
    }
}

impl TimingConfig {
    pub fn render(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.render_timeout_ms, self.render_poll_ms)
    }

    pub fn download(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.download_timeout_ms, self.download_poll_ms)
    }

    pub fn style(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.style_timeout_ms, self.style_poll_ms)
    }

    pub fn app_ready(&self) -> WaitPolicy {
        WaitPolicy::from_millis(self.app_ready_timeout_ms, 250)
    }
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it is absent
    pub fn load(path: &Path) -> E2eResult<Self> {
        let config: Self = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> E2eResult<()> {
        let raster = self.oracle.raster_threshold;
        if !(-1.0..=1.0).contains(&raster) {
            return Err(E2eError::InvalidConfig(format!(
                "raster_threshold {raster} outside [-1, 1]"
            )));
        }

        let vector = self.oracle.vector_threshold;
        if !(0.0..=1.0).contains(&vector) {
            return Err(E2eError::InvalidConfig(format!(
                "vector_threshold {vector} outside [0, 1]"
            )));
        }

        let t = &self.timing;
        if t.render_poll_ms == 0 || t.download_poll_ms == 0 || t.style_poll_ms == 0 {
            return Err(E2eError::InvalidConfig(
                "poll intervals must be non-zero".to_string(),
            ));
        }

        if self.artifact_stem.is_empty() {
            return Err(E2eError::InvalidConfig("artifact_stem is empty".to_string()));
        }

        Ok(())
    }

    pub fn golden(&self, name: &str) -> PathBuf {
        self.golden_dir.join(name)
    }
}
