//! Checks on UI state that need no artifact comparison
//!
//! Each check comes as a query returning the observed fact and as an
//! `assert_*` variant failing with [`E2eError::AssertionFailed`].

use tracing::debug;

use crate::capability::Capability;
use crate::controls::{ErrorBanner, SelectorMenu, ValidatedInput, ValidationOutcome, INVALID_BORDER};
use crate::driver::Locator;
use crate::error::{E2eError, E2eResult};
use crate::session::Session;
use crate::wait::await_condition;

const DISPLAY_BLOCK: &str = "display: block";
const DISPLAY_NONE: &str = "display: none";

impl Session {
    /// Inline style of a capability, empty when it has none
    async fn style_of(&self, capability: Capability) -> E2eResult<String> {
        let element = self.locate(capability).await?;
        Ok(self
            .driver()
            .attribute(&element, "style")
            .await?
            .unwrap_or_default())
    }

    /// Number of `<select>` elements generated inside a selector menu
    pub async fn selector_count(&self, menu: SelectorMenu) -> E2eResult<usize> {
        let container = self.locate(menu.capability()).await?;
        let selectors = self
            .driver()
            .find_all(Some(&container), &Locator::tag("select"))
            .await?;
        Ok(selectors.len())
    }

    pub async fn assert_selector_count(&self, menu: SelectorMenu, expected: usize) -> E2eResult<()> {
        let actual = self.selector_count(menu).await?;
        if actual != expected {
            return Err(E2eError::assertion(
                &format!("{} selectors", menu.capability()),
                expected,
                actual,
            ));
        }
        debug!("{} holds {} selectors", menu.capability(), actual);
        Ok(())
    }

    pub async fn banner_displayed(&self, banner: ErrorBanner) -> E2eResult<bool> {
        Ok(self.style_of(banner.capability()).await?.contains(DISPLAY_BLOCK))
    }

    pub async fn banner_hidden(&self, banner: ErrorBanner) -> E2eResult<bool> {
        Ok(self.style_of(banner.capability()).await?.contains(DISPLAY_NONE))
    }

    pub async fn assert_banner(&self, banner: ErrorBanner, displayed: bool) -> E2eResult<()> {
        let ok = if displayed {
            self.banner_displayed(banner).await?
        } else {
            self.banner_hidden(banner).await?
        };

        if !ok {
            let style = self.style_of(banner.capability()).await?;
            return Err(E2eError::assertion(
                &banner.capability().to_string(),
                if displayed { "displayed" } else { "hidden" },
                format!("style '{}'", style),
            ));
        }
        Ok(())
    }

    /// Inline style of an input's form control
    pub async fn border_style(&self, input: ValidatedInput) -> E2eResult<String> {
        self.style_of(input.form_control()).await
    }

    /// Wait for the form control's style to contain `expected`, failing with
    /// the last observed style if it never does.
    pub async fn assert_border_style(&self, input: ValidatedInput, expected: &str) -> E2eResult<()> {
        let capability = input.form_control();
        let condition = format!("{} style to contain '{}'", capability, expected);

        let waited = await_condition(&condition, self.timing().style(), move || async move {
            self.style_of(capability)
                .await
                .map(|style| style.contains(expected))
        })
        .await;

        match waited {
            Ok(()) => Ok(()),
            Err(E2eError::Timeout { .. }) => {
                let actual = self.border_style(input).await?;
                Err(E2eError::assertion(
                    &format!("{} style", capability),
                    format!("'{}'", expected),
                    format!("'{}'", actual),
                ))
            }
            Err(e) => Err(e),
        }
    }

    /// Wait for the form control to drop the invalid-input border
    pub async fn assert_border_valid(&self, input: ValidatedInput) -> E2eResult<()> {
        let capability = input.form_control();
        let condition = format!("{} to lose the invalid border", capability);

        let waited = await_condition(&condition, self.timing().style(), move || async move {
            self.style_of(capability)
                .await
                .map(|style| !style.contains(INVALID_BORDER))
        })
        .await;

        match waited {
            Err(E2eError::Timeout { .. }) => Err(E2eError::assertion(
                &format!("{} style", capability),
                "no invalid border",
                format!("'{}'", self.border_style(input).await?),
            )),
            other => other,
        }
    }

    /// Visible unless the editor's inline style hides it
    pub async fn editor_visible(&self) -> E2eResult<bool> {
        let style = self.style_of(Capability::Editor).await?;
        Ok(style.contains(DISPLAY_BLOCK) || !style.contains(DISPLAY_NONE))
    }

    pub async fn assert_editor_visible(&self, visible: bool) -> E2eResult<()> {
        let actual = self.editor_visible().await?;
        if actual != visible {
            let describe = |v: bool| if v { "visible" } else { "hidden" };
            return Err(E2eError::assertion("editor", describe(visible), describe(actual)));
        }
        Ok(())
    }

    /// Check borders and banners of both validated inputs against one outcome
    pub async fn assert_validation(&self, outcome: ValidationOutcome) -> E2eResult<()> {
        let invalid = outcome.invalid_input();
        for input in [ValidatedInput::Domain, ValidatedInput::TruthVector] {
            if invalid == Some(input) {
                self.assert_border_style(input, INVALID_BORDER).await?;
            } else {
                self.assert_border_valid(input).await?;
            }
        }

        let shown = outcome.banner();
        for banner in ErrorBanner::ALL {
            self.assert_banner(banner, shown == Some(banner)).await?;
        }

        debug!("Validation feedback matches {:?}", outcome);
        Ok(())
    }
}
