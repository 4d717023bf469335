//! Values the visualizer's controls accept, and the logical groups of
//! controls the facade and assertions operate on.

use serde::{Deserialize, Serialize};

use crate::capability::Capability;

/// A value that can be chosen in a `<select>`
pub trait SelectValue {
    /// Value as the application's option label shows it
    fn label(&self) -> &'static str;
}

macro_rules! select_values {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl SelectValue for $name {
            fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }
    };
}

select_values!(
    /// Separator between list entries in the text inputs
    Separator {
        Comma => "Comma",
        Space => "Space",
    }
);

select_values!(
    EdgeStyle {
        Solid => "Solid",
        Dashed => "Dashed",
        Dotted => "Dotted",
        Bold => "Bold",
        Invisible => "Invis",
    }
);

select_values!(
    EdgeColor {
        Black => "Black",
        Red => "Red",
        Blue => "Blue",
        Green => "Green",
        Orange => "Orange",
        Purple => "Purple",
        Yellow => "Yellow",
        Cyan => "Cyan",
        Magenta => "Magenta",
        Brown => "Brown",
        Gray => "Gray",
        Pink => "Pink",
        Lime => "Lime",
        Navy => "Navy",
        Teal => "Teal",
    }
);

select_values!(
    Font {
        TimesRoman => "Times-Roman",
        Arial => "Arial",
        CourierNew => "Courier New",
        Helvetica => "Helvetica",
        MyOwnFont => "My own font",
    }
);

select_values!(
    ExportFormat {
        Png => "png",
        Svg => "svg",
    }
);

/// Determinism class of an exported artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Raster,
    Vector,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        self.label()
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            ExportFormat::Png => ArtifactKind::Raster,
            ExportFormat::Svg => ArtifactKind::Vector,
        }
    }

    pub const ALL: [ExportFormat; 2] = [ExportFormat::Png, ExportFormat::Svg];
}

/// Free-text inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Domains,
    TruthVector,
    CustomFont,
}

impl Field {
    pub fn capability(&self) -> Capability {
        match self {
            Field::Domains => Capability::DomainInput,
            Field::TruthVector => Capability::TruthVectorInput,
            Field::CustomFont => Capability::CustomFontInput,
        }
    }
}

/// Checkbox-backed features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Styling,
    Coloring,
    Labels,
}

impl Feature {
    pub fn capability(&self) -> Capability {
        match self {
            Feature::Styling => Capability::StylingCheckbox,
            Feature::Coloring => Capability::ColoringCheckbox,
            Feature::Labels => Capability::LabelsCheckbox,
        }
    }
}

/// Containers of dynamically generated per-edge selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMenu {
    EdgeStyle,
    EdgeColor,
}

impl SelectorMenu {
    pub fn capability(&self) -> Capability {
        match self {
            SelectorMenu::EdgeStyle => Capability::EdgeStyleMenu,
            SelectorMenu::EdgeColor => Capability::EdgeColorMenu,
        }
    }
}

/// Validation error banners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorBanner {
    Domain,
    TruthVector,
    TruthVectorQuantity,
}

impl ErrorBanner {
    pub fn capability(&self) -> Capability {
        match self {
            ErrorBanner::Domain => Capability::DomainError,
            ErrorBanner::TruthVector => Capability::TruthVectorError,
            ErrorBanner::TruthVectorQuantity => Capability::TruthVectorQuantityError,
        }
    }

    pub const ALL: [ErrorBanner; 3] = [
        ErrorBanner::Domain,
        ErrorBanner::TruthVector,
        ErrorBanner::TruthVectorQuantity,
    ];
}

/// Inputs whose form control shows a red border when invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatedInput {
    Domain,
    TruthVector,
}

impl ValidatedInput {
    pub fn form_control(&self) -> Capability {
        match self {
            ValidatedInput::Domain => Capability::DomainFormControl,
            ValidatedInput::TruthVector => Capability::TruthVectorFormControl,
        }
    }
}

/// Style fragment the application puts on an invalid form control
pub const INVALID_BORDER: &str = "border: 2px solid red";

/// Expected validation feedback after a render attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationOutcome {
    Clean,
    DomainInvalid,
    TruthVectorInvalid,
    TruthVectorQuantity,
}

impl ValidationOutcome {
    /// Input expected to carry the invalid border, if any
    pub fn invalid_input(&self) -> Option<ValidatedInput> {
        match self {
            ValidationOutcome::Clean => None,
            ValidationOutcome::DomainInvalid => Some(ValidatedInput::Domain),
            ValidationOutcome::TruthVectorInvalid | ValidationOutcome::TruthVectorQuantity => {
                Some(ValidatedInput::TruthVector)
            }
        }
    }

    /// Banner expected to be displayed, if any
    pub fn banner(&self) -> Option<ErrorBanner> {
        match self {
            ValidationOutcome::Clean => None,
            ValidationOutcome::DomainInvalid => Some(ErrorBanner::Domain),
            ValidationOutcome::TruthVectorInvalid => Some(ErrorBanner::TruthVector),
            ValidationOutcome::TruthVectorQuantity => Some(ErrorBanner::TruthVectorQuantity),
        }
    }
}
