//! The browser automation capability consumed by the session
//!
//! [`Driver`] only knows elements: locate, click, type, read attributes.
//! Everything semantic lives in the facade.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::E2eResult;

/// How an element is looked up
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    Class(String),
    Tag(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Locator::Class(class.into())
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Locator::Tag(tag.into())
    }

    pub fn xpath(xpath: impl Into<String>) -> Self {
        Locator::XPath(xpath.into())
    }

    /// Selector string in Playwright's selector syntax
    pub fn to_selector(&self) -> String {
        match self {
            Locator::Id(id) => format!("[id=\"{}\"]", id),
            Locator::Class(class) => format!(".{}", class),
            Locator::Tag(tag) => format!("css={}", tag),
            Locator::Css(css) => css.clone(),
            Locator::XPath(xpath) => format!("xpath={}", xpath),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Class(class) => write!(f, ".{}", class),
            Locator::Tag(tag) => write!(f, "<{}>", tag),
            Locator::Css(css) => write!(f, "{}", css),
            Locator::XPath(xpath) => write!(f, "{}", xpath),
        }
    }
}

/// Opaque handle to a located element.
///
/// Handles are only valid until the next navigation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Key chords, in Playwright's key naming
pub mod keys {
    pub const HOME: &str = "Home";
    pub const SELECT_TO_END: &str = "Shift+End";
    pub const SELECT_ALL: &str = "ControlOrMeta+a";
    pub const DELETE: &str = "Delete";
    pub const TAB: &str = "Tab";
    pub const PAGE_DOWN: &str = "PageDown";
}

/// Browser automation primitives.
///
/// Calls are synchronous from the caller's point of view; lookups honour the
/// driver's own implicit wait.
#[async_trait]
pub trait Driver: Send + Sync {
    async fn navigate(&self, url: &str) -> E2eResult<()>;

    /// Find the first match, searching inside `scope` when given.
    /// `Ok(None)` when nothing matched within the implicit wait.
    async fn find(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Option<ElementRef>>;

    /// Find every current match, without waiting.
    async fn find_all(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Vec<ElementRef>>;

    async fn click(&self, element: &ElementRef) -> E2eResult<()>;

    /// Empty an input's value.
    async fn clear(&self, element: &ElementRef) -> E2eResult<()>;

    /// Type text into `element`, or into whatever has focus.
    async fn type_text(&self, element: Option<&ElementRef>, text: &str) -> E2eResult<()>;

    /// Press a key chord (see [`keys`]) on `element`, or on whatever has focus.
    async fn press(&self, element: Option<&ElementRef>, chord: &str) -> E2eResult<()>;

    async fn attribute(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>>;

    /// Read a DOM property such as `scrollHeight`.
    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<serde_json::Value>;

    async fn is_checked(&self, element: &ElementRef) -> E2eResult<bool>;

    /// Rendered text of the element.
    async fn text(&self, element: &ElementRef) -> E2eResult<String>;

    /// Select the option whose value or label equals `option`.
    /// `Ok(false)` when the select has no such option.
    async fn select_option(&self, element: &ElementRef, option: &str) -> E2eResult<bool>;

    async fn quit(&self) -> E2eResult<()>;
}
