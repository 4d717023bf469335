//! Declarative YAML scenarios

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::controls::{
    EdgeColor, EdgeStyle, ExportFormat, Feature, Field, Font, SelectorMenu, Separator, ValidationOutcome,
};
use crate::error::{E2eError, E2eResult};

/// A scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    /// Unique name for this scenario
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Steps to execute in order
    pub steps: Vec<ScenarioStep>,
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Replace the content of a text input
    Configure { field: Field, value: String },

    /// Empty a text input with key presses
    ClearField { field: Field },

    SetFeature { feature: Feature, enabled: bool },

    ToggleFeature { feature: Feature },

    SetEdgeStyle { index: usize, style: EdgeStyle },

    SetEdgeColor { index: usize, color: EdgeColor },

    SetFont { font: Font },

    SetSeparator { separator: Separator },

    /// Trigger a render, by default waiting for it to complete
    Render {
        #[serde(default = "default_true")]
        wait: bool,
    },

    ToggleEditor,

    /// Replace one line of the structured-text editor
    EditLine { line: usize, content: String },

    ScrollControlPanel,

    /// Export in a format; the artifact is awaited by `expect_artifact`
    Export { format: ExportFormat },

    /// Wait for the exported artifact and compare it with a golden file
    /// relative to the golden directory
    ExpectArtifact {
        format: ExportFormat,
        golden: String,
        #[serde(default = "default_true")]
        similar: bool,
        #[serde(default)]
        threshold: Option<f64>,
    },

    ExpectSelectorCount { menu: SelectorMenu, count: usize },

    ExpectValidation { outcome: ValidationOutcome },

    ExpectEditor { visible: bool },

    /// Compare the text of an editor line
    ExpectLine { line: usize, text: String },

    /// Log a message (for debugging)
    Log { message: String },
}

fn default_true() -> bool {
    true
}

impl ScenarioStep {
    /// Action name as written in YAML
    pub fn action(&self) -> &'static str {
        match self {
            ScenarioStep::Configure { .. } => "configure",
            ScenarioStep::ClearField { .. } => "clear_field",
            ScenarioStep::SetFeature { .. } => "set_feature",
            ScenarioStep::ToggleFeature { .. } => "toggle_feature",
            ScenarioStep::SetEdgeStyle { .. } => "set_edge_style",
            ScenarioStep::SetEdgeColor { .. } => "set_edge_color",
            ScenarioStep::SetFont { .. } => "set_font",
            ScenarioStep::SetSeparator { .. } => "set_separator",
            ScenarioStep::Render { .. } => "render",
            ScenarioStep::ToggleEditor => "toggle_editor",
            ScenarioStep::EditLine { .. } => "edit_line",
            ScenarioStep::ScrollControlPanel => "scroll_control_panel",
            ScenarioStep::Export { .. } => "export",
            ScenarioStep::ExpectArtifact { .. } => "expect_artifact",
            ScenarioStep::ExpectSelectorCount { .. } => "expect_selector_count",
            ScenarioStep::ExpectValidation { .. } => "expect_validation",
            ScenarioStep::ExpectEditor { .. } => "expect_editor",
            ScenarioStep::ExpectLine { .. } => "expect_line",
            ScenarioStep::Log { .. } => "log",
        }
    }
}

impl ScenarioSpec {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let spec: Self = serde_yaml::from_str(yaml).map_err(E2eError::from)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios below a directory, ordered by path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut specs = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let spec = Self::from_file(entry.path())?;
            specs.push(spec);
        }

        Ok(specs)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(specs: &'a [Self], tag: &str) -> Vec<&'a Self> {
        specs.iter().filter(|s| s.tags.iter().any(|t| t == tag)).collect()
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario has no name".to_string()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("scenario '{}' has no steps", self.name)));
        }

        for step in &self.steps {
            if let ScenarioStep::ExpectArtifact {
                threshold: Some(t), ..
            } = step
            {
                if !(-1.0..=1.0).contains(t) {
                    return Err(E2eError::SpecParse(format!(
                        "scenario '{}': threshold {} outside [-1, 1]",
                        self.name, t
                    )));
                }
            }
        }
        Ok(())
    }
}
