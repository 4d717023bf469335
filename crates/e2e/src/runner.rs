//! Scenario runner: drives a session through YAML scenarios and judges
//! their artifacts

use std::path::PathBuf;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::artifact::DownloadDir;
use crate::config::HarnessConfig;
use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightDriver;
use crate::probe;
use crate::session::Session;
use crate::spec::{ScenarioSpec, ScenarioStep};
use crate::visual::{Comparison, VisualOracle};

/// How a scenario ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    /// The application did not behave as the scenario expected
    Failed,
    /// The harness or its environment broke down
    Errored,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub steps_completed: usize,
    pub steps_total: usize,
    pub comparisons: Vec<Comparison>,
    pub error: Option<String>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

pub struct ScenarioRunner {
    session: Session,
    downloads: DownloadDir,
    oracle: VisualOracle,
    config: HarnessConfig,
}

impl ScenarioRunner {
    /// Wait for the application, launch the browser and start a session
    pub async fn launch(config: &HarnessConfig) -> E2eResult<Self> {
        probe::wait_for_app(&config.base_url, config.timing.app_ready()).await?;

        let driver = PlaywrightDriver::launch(&config.browser, &config.download_dir).await?;
        let session = Session::start(Box::new(driver), config.base_url.clone(), config.timing.clone()).await?;
        Ok(Self::with_session(session, config))
    }

    /// Run against an already started session
    pub fn with_session(session: Session, config: &HarnessConfig) -> Self {
        Self {
            session,
            downloads: DownloadDir::new(&config.download_dir, config.artifact_stem.clone()),
            oracle: VisualOracle::new(&config.oracle),
            config: config.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run all scenarios in the scenarios directory
    pub async fn run_all(&mut self) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        Ok(self.run_specs(&specs).await)
    }

    /// Run scenarios carrying a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        let filtered: Vec<ScenarioSpec> = ScenarioSpec::filter_by_tag(&specs, tag)
            .into_iter()
            .cloned()
            .collect();
        Ok(self.run_specs(&filtered).await)
    }

    /// Run one scenario by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<SuiteResult> {
        let specs = ScenarioSpec::load_all(&self.config.scenarios_dir)?;
        let spec = specs
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;
        Ok(self.run_specs(std::slice::from_ref(&spec)).await)
    }

    pub async fn run_specs(&mut self, specs: &[ScenarioSpec]) -> SuiteResult {
        let start = Instant::now();
        let mut results = Vec::with_capacity(specs.len());

        info!("Running {} scenario(s) against {}", specs.len(), self.session.base_url());

        for spec in specs {
            let result = self.run_spec(spec).await;
            match result.outcome {
                Outcome::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                Outcome::Failed => error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown failure")
                ),
                Outcome::Errored => error!(
                    "! {} - harness error: {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }
            results.push(result);
        }

        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        let (passed, failed, errored) = (count(Outcome::Passed), count(Outcome::Failed), count(Outcome::Errored));
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} errored ({} ms)",
            passed, failed, errored, duration_ms
        );

        SuiteResult {
            total: specs.len(),
            passed,
            failed,
            errored,
            duration_ms,
            results,
        }
    }

    /// Run a single scenario from a fresh page and an empty download
    /// directory, stopping at the first failing step
    pub async fn run_spec(&mut self, spec: &ScenarioSpec) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", spec.name);

        let mut result = ScenarioResult {
            name: spec.name.clone(),
            outcome: Outcome::Passed,
            duration_ms: 0,
            steps_completed: 0,
            steps_total: spec.steps.len(),
            comparisons: Vec::new(),
            error: None,
        };

        let prepared = match self.downloads.clear() {
            Ok(_) => self.session.reset().await,
            Err(e) => Err(e),
        };

        let failure = match prepared {
            Err(e) => Some(e),
            Ok(()) => {
                let mut failure = None;
                for step in &spec.steps {
                    match self.execute_step(step).await {
                        Ok(comparison) => {
                            result.comparisons.extend(comparison);
                            result.steps_completed += 1;
                        }
                        Err(e) => {
                            debug!("Step {} ({}) failed", result.steps_completed, step.action());
                            failure = Some(e);
                            break;
                        }
                    }
                }
                failure
            }
        };

        if let Some(e) = failure {
            result.outcome = if e.is_expectation_failure() {
                Outcome::Failed
            } else {
                Outcome::Errored
            };
            result.error = Some(e.to_string());
        }
        result.duration_ms = start.elapsed().as_millis() as u64;
        result
    }

    /// Execute one step; artifact expectations return their comparison
    pub async fn execute_step(&self, step: &ScenarioStep) -> E2eResult<Option<Comparison>> {
        let session = &self.session;
        match step {
            ScenarioStep::Configure { field, value } => session.configure_field(*field, value).await?,
            ScenarioStep::ClearField { field } => session.clear_field_with_keys(*field).await?,
            ScenarioStep::SetFeature { feature, enabled } => session.set_feature(*feature, *enabled).await?,
            ScenarioStep::ToggleFeature { feature } => session.toggle_feature(*feature).await?,
            ScenarioStep::SetEdgeStyle { index, style } => session.set_edge_style(*index, *style).await?,
            ScenarioStep::SetEdgeColor { index, color } => session.set_edge_color(*index, *color).await?,
            ScenarioStep::SetFont { font } => session.set_font(*font).await?,
            ScenarioStep::SetSeparator { separator } => session.set_separator(*separator).await?,
            ScenarioStep::Render { wait } => session.render(*wait).await?,
            ScenarioStep::ToggleEditor => session.toggle_editor().await?,
            ScenarioStep::EditLine { line, content } => session.edit_structured_text(*line, content).await?,
            ScenarioStep::ScrollControlPanel => session.scroll_down_control_panel().await?,
            ScenarioStep::Export { format } => {
                self.downloads.discard(*format)?;
                session.export(*format).await?;
            }
            ScenarioStep::ExpectArtifact {
                format,
                golden,
                similar,
                threshold,
            } => {
                let artifact = self
                    .downloads
                    .await_artifact(*format, session.timing().download())
                    .await?;
                let golden = self.config.golden(golden);
                let comparison = self.oracle.compare(&artifact, &golden, *threshold)?;

                return match (*similar, comparison.passed) {
                    (true, false) => Err(comparison.mismatch()),
                    (false, true) => Err(E2eError::assertion(
                        &format!("{} against {}", artifact.path.display(), golden.display()),
                        format!("similarity below {}", comparison.threshold),
                        format!("{:.10}", comparison.score),
                    )),
                    _ => Ok(Some(comparison)),
                };
            }
            ScenarioStep::ExpectSelectorCount { menu, count } => {
                session.assert_selector_count(*menu, *count).await?
            }
            ScenarioStep::ExpectValidation { outcome } => session.assert_validation(*outcome).await?,
            ScenarioStep::ExpectEditor { visible } => session.assert_editor_visible(*visible).await?,
            ScenarioStep::ExpectLine { line, text } => {
                let actual = session.structured_text_line(*line).await?;
                if actual != *text {
                    return Err(E2eError::assertion(
                        &format!("editor line {}", line),
                        format!("'{}'", text),
                        format!("'{}'", actual),
                    ));
                }
            }
            ScenarioStep::Log { message } => info!("[scenario] {}", message),
        }
        Ok(None)
    }

    /// Write results to `test-results.json` in the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }

    /// Tear the session down, closing the browser
    pub async fn shutdown(self) -> E2eResult<()> {
        self.session.teardown().await
    }
}
