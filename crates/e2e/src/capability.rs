//! Named capabilities: every control of the visualizer the harness touches,
//! by logical name.

use std::fmt;

use crate::driver::Locator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ControlPanel,
    DomainInput,
    TruthVectorInput,
    RenderButton,
    StylingCheckbox,
    ColoringCheckbox,
    FontSelector,
    LabelsCheckbox,
    ToggleEditorButton,
    ExportFormatSelector,
    ExportButton,
    DomainFormControl,
    TruthVectorFormControl,
    DomainError,
    TruthVectorError,
    TruthVectorQuantityError,
    Editor,

    // Created or replaced by the application while a scenario runs; looked
    // up on use instead of at session start.
    ViewCanvas,
    CustomFontInput,
    SeparatorSelector,
    EdgeStyleMenu,
    EdgeColorMenu,
    EdgeStyleSelector(usize),
    EdgeColorSelector(usize),
    EditorLine,
}

impl Capability {
    /// Resolved eagerly whenever the session starts or resets
    pub const STATIC: [Capability; 17] = [
        Capability::ControlPanel,
        Capability::DomainInput,
        Capability::TruthVectorInput,
        Capability::RenderButton,
        Capability::StylingCheckbox,
        Capability::ColoringCheckbox,
        Capability::FontSelector,
        Capability::LabelsCheckbox,
        Capability::ToggleEditorButton,
        Capability::ExportFormatSelector,
        Capability::ExportButton,
        Capability::DomainFormControl,
        Capability::TruthVectorFormControl,
        Capability::DomainError,
        Capability::TruthVectorError,
        Capability::TruthVectorQuantityError,
        Capability::Editor,
    ];

    pub fn is_static(&self) -> bool {
        Self::STATIC.contains(self)
    }

    pub fn locator(&self) -> Locator {
        match self {
            Capability::ControlPanel => Locator::class("control-panel"),
            Capability::DomainInput => Locator::id("domain"),
            Capability::TruthVectorInput => Locator::id("truthVector"),
            Capability::RenderButton => Locator::id("renderButton"),
            Capability::StylingCheckbox => Locator::id("stylingCheckbox"),
            Capability::ColoringCheckbox => Locator::id("colorCheckbox"),
            Capability::FontSelector => Locator::id("Font"),
            Capability::LabelsCheckbox => Locator::id("labelsCheckbox"),
            Capability::ToggleEditorButton => Locator::id("toggleEditorButton"),
            Capability::ExportFormatSelector => Locator::id("format"),
            Capability::ExportButton => Locator::id("exportButton"),
            Capability::DomainFormControl => form_control("Domain"),
            Capability::TruthVectorFormControl => form_control("Truth Vector"),
            Capability::DomainError => Locator::id("domainError"),
            Capability::TruthVectorError => Locator::id("truthVectorError"),
            Capability::TruthVectorQuantityError => Locator::id("truthVectorInvalidQuantity"),
            Capability::Editor => Locator::id("editor"),
            Capability::ViewCanvas => Locator::id("viewCanvas"),
            Capability::CustomFontInput => Locator::id("customFont"),
            Capability::SeparatorSelector => Locator::id("separator"),
            Capability::EdgeStyleMenu => Locator::id("dynamicEdgeStyleMenu"),
            Capability::EdgeColorMenu => Locator::id("dynamicEdgeColorMenu"),
            Capability::EdgeStyleSelector(i) => Locator::id(format!("dynamicEdgeStyle{}", i)),
            Capability::EdgeColorSelector(i) => Locator::id(format!("dynamicEdgeColor{}", i)),
            Capability::EditorLine => Locator::class("ace_line"),
        }
    }
}

/// The `form-control` wrapper whose label contains `label`
fn form_control(label: &str) -> Locator {
    Locator::xpath(format!(
        "//div[contains(@class, 'form-control')][.//label[contains(text(), '{}')]]",
        label
    ))
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::ControlPanel => write!(f, "control panel"),
            Capability::DomainInput => write!(f, "domain input"),
            Capability::TruthVectorInput => write!(f, "truth vector input"),
            Capability::RenderButton => write!(f, "render trigger"),
            Capability::StylingCheckbox => write!(f, "styling toggle"),
            Capability::ColoringCheckbox => write!(f, "coloring toggle"),
            Capability::FontSelector => write!(f, "font selector"),
            Capability::LabelsCheckbox => write!(f, "labels toggle"),
            Capability::ToggleEditorButton => write!(f, "editor toggle"),
            Capability::ExportFormatSelector => write!(f, "export format selector"),
            Capability::ExportButton => write!(f, "export trigger"),
            Capability::DomainFormControl => write!(f, "domain form control"),
            Capability::TruthVectorFormControl => write!(f, "truth vector form control"),
            Capability::DomainError => write!(f, "domain error banner"),
            Capability::TruthVectorError => write!(f, "truth vector error banner"),
            Capability::TruthVectorQuantityError => write!(f, "truth vector quantity error banner"),
            Capability::Editor => write!(f, "editor"),
            Capability::ViewCanvas => write!(f, "view canvas"),
            Capability::CustomFontInput => write!(f, "custom font input"),
            Capability::SeparatorSelector => write!(f, "separator selector"),
            Capability::EdgeStyleMenu => write!(f, "edge style menu"),
            Capability::EdgeColorMenu => write!(f, "edge color menu"),
            Capability::EdgeStyleSelector(i) => write!(f, "edge style selector {}", i),
            Capability::EdgeColorSelector(i) => write!(f, "edge color selector {}", i),
            Capability::EditorLine => write!(f, "editor line"),
        }
    }
}
