//! Semantic operations on the visualizer
//!
//! One method per user-observable action. Operations whose effect is
//! asynchronous in the browser block on a wait before returning; `export`
//! is the exception, see [`Session::export`].

use tracing::{debug, warn};

use crate::capability::Capability;
use crate::controls::{EdgeColor, EdgeStyle, ExportFormat, Feature, Field, Font, SelectValue, Separator};
use crate::driver::{keys, ElementRef};
use crate::error::{E2eError, E2eResult};
use crate::session::Session;
use crate::wait::await_condition;

/// Class the view canvas carries while a render is in progress
pub const BUSY_MARKER: &str = "working";

impl Session {
    /// Replace the content of a text input
    pub async fn configure_field(&self, field: Field, value: &str) -> E2eResult<()> {
        debug!("Setting {:?} to '{}'", field, value);
        let input = self.locate(field.capability()).await?;
        self.driver().clear(&input).await?;
        self.driver().type_text(Some(&input), value).await
    }

    pub async fn set_domains(&self, domains: &str) -> E2eResult<()> {
        self.configure_field(Field::Domains, domains).await
    }

    pub async fn set_truth_vector(&self, truth_vector: &str) -> E2eResult<()> {
        self.configure_field(Field::TruthVector, truth_vector).await
    }

    pub async fn set_custom_font(&self, font: &str) -> E2eResult<()> {
        self.configure_field(Field::CustomFont, font).await
    }

    /// Empty an input the way a user would (select all, delete, tab away),
    /// so the application's change and blur handlers run.
    pub async fn clear_field_with_keys(&self, field: Field) -> E2eResult<()> {
        let input = self.locate(field.capability()).await?;
        let driver = self.driver();
        driver.click(&input).await?;
        driver.press(Some(&input), keys::SELECT_ALL).await?;
        driver.press(Some(&input), keys::DELETE).await?;
        driver.press(Some(&input), keys::TAB).await
    }

    pub async fn feature_enabled(&self, feature: Feature) -> E2eResult<bool> {
        let toggle = self.locate(feature.capability()).await?;
        self.driver().is_checked(&toggle).await
    }

    /// Bring a feature toggle to `enabled`; clicks only when it differs.
    pub async fn set_feature(&self, feature: Feature, enabled: bool) -> E2eResult<()> {
        let toggle = self.locate(feature.capability()).await?;
        if self.driver().is_checked(&toggle).await? != enabled {
            debug!("Turning {:?} {}", feature, if enabled { "on" } else { "off" });
            self.driver().click(&toggle).await?;
        }
        Ok(())
    }

    /// Flip a feature toggle
    pub async fn toggle_feature(&self, feature: Feature) -> E2eResult<()> {
        let toggle = self.locate(feature.capability()).await?;
        self.driver().click(&toggle).await
    }

    /// Open a selector, choose `option` by value or label, close it
    pub async fn select_option(&self, selector: Capability, option: &str) -> E2eResult<()> {
        let element = self.locate(selector).await?;
        let driver = self.driver();

        driver.click(&element).await?;
        if !driver.select_option(&element, option).await? {
            return Err(E2eError::OptionNotFound {
                selector: selector.to_string(),
                option: option.to_string(),
            });
        }
        driver.click(&element).await
    }

    pub async fn set_edge_style(&self, index: usize, style: EdgeStyle) -> E2eResult<()> {
        self.select_option(Capability::EdgeStyleSelector(index), style.label())
            .await
    }

    pub async fn set_edge_color(&self, index: usize, color: EdgeColor) -> E2eResult<()> {
        self.select_option(Capability::EdgeColorSelector(index), color.label())
            .await
    }

    pub async fn set_font(&self, font: Font) -> E2eResult<()> {
        self.select_option(Capability::FontSelector, font.label()).await
    }

    pub async fn set_separator(&self, separator: Separator) -> E2eResult<()> {
        self.select_option(Capability::SeparatorSelector, separator.label())
            .await
    }

    /// Trigger a render.
    ///
    /// With `wait_for_completion`, blocks until the view canvas has gained
    /// and then lost the busy marker. Without it, returns right after the
    /// click and synchronisation is up to the caller.
    pub async fn render(&self, wait_for_completion: bool) -> E2eResult<()> {
        let button = self.locate(Capability::RenderButton).await?;
        self.driver().click(&button).await?;

        if !wait_for_completion {
            return Ok(());
        }

        let policy = self.timing().render();
        await_condition("render to start", policy, move || self.canvas_busy()).await?;
        await_condition("render to finish", policy, move || async move {
            self.canvas_busy().await.map(|busy| !busy)
        })
        .await?;

        debug!("Render completed");
        Ok(())
    }

    /// The canvas is looked up on every check; the application may replace it.
    /// A missing canvas fails the wait at once.
    async fn canvas_busy(&self) -> E2eResult<bool> {
        let canvas = self.locate(Capability::ViewCanvas).await?;
        let class = self.driver().attribute(&canvas, "class").await?;
        Ok(class.unwrap_or_default().contains(BUSY_MARKER))
    }

    /// Choose the export format and trigger the export.
    ///
    /// Does not wait for the artifact: completion is decoupled from the
    /// request, so callers wait on the download before reading it.
    pub async fn export(&self, format: ExportFormat) -> E2eResult<()> {
        debug!("Exporting as {}", format.extension());
        self.select_option(Capability::ExportFormatSelector, format.label())
            .await?;
        let button = self.locate(Capability::ExportButton).await?;
        self.driver().click(&button).await
    }

    pub async fn toggle_editor(&self) -> E2eResult<()> {
        let button = self.locate(Capability::ToggleEditorButton).await?;
        self.driver().click(&button).await
    }

    /// Addressable editor lines, in document order
    pub async fn editor_lines(&self) -> E2eResult<Vec<ElementRef>> {
        self.assert_editor_visible(true).await?;
        self.driver()
            .find_all(None, &Capability::EditorLine.locator())
            .await
    }

    /// Replace the whole of line `line_index` with `content`
    pub async fn edit_structured_text(&self, line_index: usize, content: &str) -> E2eResult<()> {
        let lines = self.editor_lines().await?;
        let line = lines.get(line_index).ok_or_else(|| E2eError::OutOfRange {
            index: line_index,
            len: lines.len(),
        })?;

        let driver = self.driver();
        driver.click(line).await?;
        driver.press(None, keys::HOME).await?;
        driver.press(None, keys::SELECT_TO_END).await?;
        driver.type_text(None, content).await
    }

    /// Rendered text of an editor line
    pub async fn structured_text_line(&self, line_index: usize) -> E2eResult<String> {
        let lines = self.editor_lines().await?;
        let line = lines.get(line_index).ok_or_else(|| E2eError::OutOfRange {
            index: line_index,
            len: lines.len(),
        })?;
        self.driver().text(line).await
    }

    /// Like [`Session::structured_text_line`], but logs failures and returns
    /// an empty string. For diagnostics only.
    pub async fn diagnostic_text_line(&self, line_index: usize) -> String {
        match self.structured_text_line(line_index).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to get line {}: {}", line_index, e);
                String::new()
            }
        }
    }

    /// Page the control panel down, if it scrolls at all
    pub async fn scroll_down_control_panel(&self) -> E2eResult<()> {
        let panel = self.locate(Capability::ControlPanel).await?;
        let driver = self.driver();

        let scroll_height = driver.property(&panel, "scrollHeight").await?.as_f64().unwrap_or(0.0);
        let client_height = driver.property(&panel, "clientHeight").await?.as_f64().unwrap_or(0.0);

        if scroll_height > client_height {
            driver.press(Some(&panel), keys::PAGE_DOWN).await?;
        }
        Ok(())
    }
}
