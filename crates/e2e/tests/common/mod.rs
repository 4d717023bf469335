//! In-memory stand-in for the visualizer, driven through the `Driver` trait.
//!
//! It models the parts of the page the harness touches: text inputs with
//! separators, feature checkboxes generating per-edge selectors, validation
//! borders and banners, a busy marker on the canvas while rendering, the
//! structured-text editor and exports written to a download directory.
//! Exports are deterministic functions of a [`Diagram`], so tests can write
//! golden references for any configuration.
#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use image::{ColorType, GrayImage, ImageFormat, Luma};
use serde_json::{json, Value};

use mddviz_e2e::config::{HarnessConfig, TimingConfig};
use mddviz_e2e::controls::ValidationOutcome;
use mddviz_e2e::{Driver, E2eError, E2eResult, ElementRef, Locator, Session};

pub const BASE_URL: &str = "http://visualizer.test";

pub const DOMAINS: &[u32] = &[2, 2, 3];
pub const TRUTH_POSITIVE: &[u32] = &[0, 0, 0, 0, 1, 1, 0, 1, 1, 0, 2, 2];
pub const TRUTH_NEGATIVE: &[u32] = &[0, 0, 0, 0, 1, 1, 0, 1, 1, 0, 2, 3];

const STATIC_IDS: &[&str] = &[
    "controlPanel",
    "domain",
    "truthVector",
    "renderButton",
    "stylingCheckbox",
    "colorCheckbox",
    "Font",
    "labelsCheckbox",
    "toggleEditorButton",
    "format",
    "exportButton",
    "domainFormControl",
    "truthVectorFormControl",
    "domainError",
    "truthVectorError",
    "truthVectorInvalidQuantity",
    "editor",
    "viewCanvas",
    "separator",
    "dynamicEdgeStyleMenu",
    "dynamicEdgeColorMenu",
];

const FONTS: &[&str] = &["Times-Roman", "Arial", "Courier New", "Helvetica", "My own font"];
const FORMATS: &[(&str, &str)] = &[("png", "PNG"), ("svg", "SVG")];
const SEPARATORS: &[&str] = &["Comma", "Space"];
const EDGE_STYLES: &[&str] = &["Solid", "Dashed", "Dotted", "Bold", "Invis"];
const EDGE_COLORS: &[&str] = &[
    "Black", "Red", "Blue", "Green", "Orange", "Purple", "Yellow", "Cyan", "Magenta", "Brown", "Gray", "Pink",
    "Lime", "Navy", "Teal",
];

const CUSTOM_FONT_OPTION: &str = "My own font";
const EXPORT_STEM: &str = "Decision_Diagram";

// ---------------------------------------------------------------------------
// Diagram model and exports
// ---------------------------------------------------------------------------

/// Presentation options that affect the exported picture
#[derive(Debug, Clone, PartialEq)]
pub struct Look {
    pub edge_styles: BTreeMap<usize, String>,
    pub edge_colors: BTreeMap<usize, String>,
    /// Effective font, the custom font when "My own font" is chosen
    pub font: String,
    pub labels: bool,
}

impl Default for Look {
    fn default() -> Self {
        Self {
            edge_styles: BTreeMap::new(),
            edge_colors: BTreeMap::new(),
            font: "Times-Roman".to_string(),
            labels: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagram {
    pub domains: Vec<u32>,
    pub truth: Vec<u32>,
    pub look: Look,
    pub script: Vec<String>,
}

const COLUMNS: u32 = 6;
const BLOCK: u32 = 16;
const STRIP: u32 = 8;

impl Diagram {
    pub fn new(domains: &[u32], truth: &[u32]) -> Self {
        Self {
            domains: domains.to_vec(),
            truth: truth.to_vec(),
            look: Look::default(),
            script: base_script(domains, truth),
        }
    }

    pub fn with_look(mut self, f: impl FnOnce(&mut Look)) -> Self {
        f(&mut self.look);
        self
    }

    /// Replace a script line the way the editor does, keeping indentation
    pub fn edit_line(mut self, index: usize, content: &str) -> Self {
        let line = &mut self.script[index];
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        *line = format!("{}{}", indent, content);
        self
    }

    fn digest(&self) -> u64 {
        let text = format!("{:?}|{:?}|{}", self.domains, self.look, self.script.join("\n"));
        fnv1a(text.as_bytes())
    }

    /// Options strip on top, one block per truth value below
    pub fn pixels(&self) -> GrayImage {
        let digest = self.digest();
        let rows = (self.truth.len() as u32).div_ceil(COLUMNS).max(1);
        let width = COLUMNS * BLOCK;
        let height = STRIP + rows * BLOCK;

        GrayImage::from_fn(width, height, |x, y| {
            if y < STRIP {
                let bit = (digest >> (x / 12)) & 1;
                return Luma([if bit == 1 { 255 } else { 0 }]);
            }
            let index = (((y - STRIP) / BLOCK) * COLUMNS + x / BLOCK) as usize;
            match self.truth.get(index) {
                Some(v) => Luma([((v * 97 + 40) % 256) as u8]),
                None => Luma([128]),
            }
        })
    }

    pub fn write_png(&self, path: &Path) {
        let img = self.pixels();
        image::save_buffer_with_format(path, img.as_raw(), img.width(), img.height(), ColorType::L8, ImageFormat::Png)
            .unwrap();
    }

    pub fn svg(&self) -> String {
        let img_width = COLUMNS * BLOCK;
        let rows = (self.truth.len() as u32).div_ceil(COLUMNS).max(1);
        let mut s = String::new();
        s.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
        let _ = writeln!(
            s,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{}\" height=\"{}\">",
            img_width,
            STRIP + rows * BLOCK
        );
        let _ = writeln!(s, "<title>Decision Diagram</title>");
        let _ = writeln!(s, "<desc>{}</desc>", escape(&format!("{:?}", self.look)));
        for (i, v) in self.truth.iter().enumerate() {
            let i = i as u32;
            let shade = (v * 97 + 40) % 256;
            let _ = writeln!(
                s,
                "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"rgb({},{},{})\" data-value=\"{}\"/>",
                (i % COLUMNS) * BLOCK,
                STRIP + (i / COLUMNS) * BLOCK,
                BLOCK,
                BLOCK,
                shade,
                shade,
                shade,
                v
            );
        }
        for (i, line) in self.script.iter().enumerate() {
            let _ = writeln!(s, "<text class=\"script\" data-line=\"{}\">{}</text>", i, escape(line));
        }
        s.push_str("</svg>\n");
        s
    }

    pub fn write_svg(&self, path: &Path) {
        std::fs::write(path, self.svg()).unwrap();
    }
}

fn base_script(domains: &[u32], truth: &[u32]) -> Vec<String> {
    let vars: Vec<String> = (0..domains.len()).map(|i| format!("x{}", i)).collect();
    let mut terminals: Vec<u32> = truth.to_vec();
    terminals.sort_unstable();
    terminals.dedup();
    let terminals: Vec<String> = terminals.iter().map(|t| t.to_string()).collect();

    let mut script = vec![
        "digraph MDD {".to_string(),
        "    graph [rankdir = TB];".to_string(),
        format!("    node [shape = circle] {};", vars.join(" ")),
        "    edge [style = solid];".to_string(),
        format!("    node [shape = square] {};", terminals.join(" ")),
    ];
    for pair in vars.windows(2) {
        script.push(format!("    {} -> {};", pair[0], pair[1]));
    }
    script.push("}".to_string());
    script
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf29ce484222325u64, |hash, b| {
        (hash ^ u64::from(*b)).wrapping_mul(0x100000001b3)
    })
}

// ---------------------------------------------------------------------------
// Page state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Focus {
    None,
    Input(&'static str),
    EditorLine {
        line: usize,
        caret: usize,
        anchor: Option<usize>,
    },
}

/// Everything reset by a navigation
#[derive(Debug, Clone)]
pub struct Page {
    pub domain: String,
    pub truth_vector: String,
    pub custom_font: String,
    pub styling: bool,
    pub coloring: bool,
    pub labels: bool,
    pub font: String,
    pub separator: String,
    pub format: String,
    pub edge_styles: BTreeMap<usize, String>,
    pub edge_colors: BTreeMap<usize, String>,
    pub validation: Option<ValidationOutcome>,
    pub busy: bool,
    pub editor_visible: bool,
    pub script: Vec<String>,
    pub rendered: Option<Diagram>,
    pub focus: Focus,
    pub select_all: bool,
    pub clicks: Vec<String>,
    pub page_downs: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            domain: String::new(),
            truth_vector: String::new(),
            custom_font: String::new(),
            styling: false,
            coloring: false,
            labels: false,
            font: "Times-Roman".to_string(),
            separator: "Comma".to_string(),
            format: "png".to_string(),
            edge_styles: BTreeMap::new(),
            edge_colors: BTreeMap::new(),
            validation: None,
            busy: false,
            editor_visible: false,
            script: base_script(&[], &[]),
            rendered: None,
            focus: Focus::None,
            select_all: false,
            clicks: Vec::new(),
            page_downs: 0,
        }
    }
}

impl Page {
    fn split<'a>(&self, text: &'a str) -> Vec<&'a str> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if self.separator == "Space" {
            text.split_whitespace().collect()
        } else {
            text.split(',').map(str::trim).collect()
        }
    }

    fn parse(&self, text: &str, min: u32) -> Option<Vec<u32>> {
        self.split(text)
            .into_iter()
            .map(|t| t.parse::<u32>().ok().filter(|v| *v >= min))
            .collect()
    }

    /// Number of per-edge selectors the checkboxes generate
    pub fn selector_count(&self) -> usize {
        self.split(&self.domain)
            .into_iter()
            .filter_map(|t| t.parse::<u32>().ok())
            .max()
            .unwrap_or(0) as usize
    }

    fn validate(&self) -> Result<(Vec<u32>, Vec<u32>), ValidationOutcome> {
        let domains = self
            .parse(&self.domain, 1)
            .filter(|d| !d.is_empty())
            .ok_or(ValidationOutcome::DomainInvalid)?;
        let truth = self
            .parse(&self.truth_vector, 0)
            .ok_or(ValidationOutcome::TruthVectorInvalid)?;
        let expected: u32 = domains.iter().product();
        if truth.len() != expected as usize {
            return Err(ValidationOutcome::TruthVectorQuantity);
        }
        Ok((domains, truth))
    }

    fn look(&self) -> Look {
        Look {
            edge_styles: if self.styling { self.edge_styles.clone() } else { BTreeMap::new() },
            edge_colors: if self.coloring { self.edge_colors.clone() } else { BTreeMap::new() },
            font: if self.font == CUSTOM_FONT_OPTION {
                self.custom_font.clone()
            } else {
                self.font.clone()
            },
            labels: self.labels,
        }
    }

    fn input_mut(&mut self, key: &str) -> Option<&mut String> {
        match key {
            "domain" => Some(&mut self.domain),
            "truthVector" => Some(&mut self.truth_vector),
            "customFont" => Some(&mut self.custom_font),
            _ => None,
        }
    }

    fn style(&self, key: &str) -> Option<String> {
        let outcome = self.validation.unwrap_or(ValidationOutcome::Clean);
        let banner = |shown: bool| {
            if shown {
                "display: block;".to_string()
            } else {
                "display: none;".to_string()
            }
        };
        let border = |invalid: bool| {
            if invalid {
                "border: 2px solid red;".to_string()
            } else {
                String::new()
            }
        };

        match key {
            "domainFormControl" => Some(border(outcome == ValidationOutcome::DomainInvalid)),
            "truthVectorFormControl" => Some(border(matches!(
                outcome,
                ValidationOutcome::TruthVectorInvalid | ValidationOutcome::TruthVectorQuantity
            ))),
            "domainError" => Some(banner(outcome == ValidationOutcome::DomainInvalid)),
            "truthVectorError" => Some(banner(outcome == ValidationOutcome::TruthVectorInvalid)),
            "truthVectorInvalidQuantity" => Some(banner(outcome == ValidationOutcome::TruthVectorQuantity)),
            "editor" => Some(banner(self.editor_visible)),
            _ => None,
        }
    }
}

pub struct AppState {
    pub navigations: u64,
    pub visited: Vec<String>,
    pub quit: bool,
    pub hidden: HashSet<String>,
    pub panel_scroll_height: f64,
    pub panel_client_height: f64,
    pub render_start_delay: Duration,
    pub render_duration: Duration,
    pub export_delay: Duration,
    pub exports: usize,
    pub page: Page,
}

impl AppState {
    fn exists(&self, key: &str) -> bool {
        if self.hidden.contains(key) {
            return false;
        }
        let page = &self.page;
        if STATIC_IDS.contains(&key) {
            return true;
        }
        if key == "customFont" {
            return page.font == CUSTOM_FONT_OPTION;
        }
        if let Some(i) = indexed(key, "dynamicEdgeStyle") {
            return page.styling && i < page.selector_count();
        }
        if let Some(i) = indexed(key, "dynamicEdgeColor") {
            return page.coloring && i < page.selector_count();
        }
        if let Some(i) = key.strip_prefix("ace_line:").and_then(|i| i.parse::<usize>().ok()) {
            return page.editor_visible && i < page.script.len();
        }
        false
    }

    fn candidates(&self, scope: Option<&str>, locator: &Locator) -> Vec<String> {
        let page = &self.page;
        let keys: Vec<String> = match locator {
            Locator::Id(id) => vec![id.clone()],
            Locator::Class(class) if class == "control-panel" => vec!["controlPanel".to_string()],
            Locator::Class(class) if class == "ace_line" => {
                (0..page.script.len()).map(|i| format!("ace_line:{}", i)).collect()
            }
            Locator::XPath(xpath) if xpath.contains("'Domain'") => vec!["domainFormControl".to_string()],
            Locator::XPath(xpath) if xpath.contains("'Truth Vector'") => {
                vec!["truthVectorFormControl".to_string()]
            }
            Locator::Tag(tag) if tag == "select" => {
                let count = page.selector_count();
                match scope {
                    Some("dynamicEdgeStyleMenu") => (0..count).map(|i| format!("dynamicEdgeStyle{}", i)).collect(),
                    Some("dynamicEdgeColorMenu") => (0..count).map(|i| format!("dynamicEdgeColor{}", i)).collect(),
                    Some(_) => Vec::new(),
                    None => ["Font", "format", "separator"].iter().map(|s| s.to_string()).collect(),
                }
            }
            _ => Vec::new(),
        };
        keys.into_iter().filter(|k| self.exists(k)).collect()
    }
}

fn indexed(key: &str, prefix: &str) -> Option<usize> {
    key.strip_prefix(prefix)?.parse().ok()
}

// ---------------------------------------------------------------------------
// The application and its driver
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct FakeApp {
    state: Arc<Mutex<AppState>>,
    download_dir: PathBuf,
}

impl FakeApp {
    pub fn new(download_dir: &Path) -> Self {
        std::fs::create_dir_all(download_dir).unwrap();
        let state = AppState {
            navigations: 0,
            visited: Vec::new(),
            quit: false,
            hidden: HashSet::new(),
            panel_scroll_height: 1500.0,
            panel_client_height: 900.0,
            render_start_delay: Duration::from_millis(15),
            render_duration: Duration::from_millis(40),
            export_delay: Duration::from_millis(30),
            exports: 0,
            page: Page::default(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            download_dir: download_dir.to_path_buf(),
        }
    }

    pub fn driver(&self) -> Box<dyn Driver> {
        Box::new(FakeDriver { app: self.clone() })
    }

    pub fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap()
    }

    /// Remove an element from the page, by id
    pub fn hide(&self, key: &str) {
        self.state().hidden.insert(key.to_string());
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    fn click(&self, key: &str) {
        let mut st = self.state();
        st.page.clicks.push(key.to_string());
        match key {
            "stylingCheckbox" => st.page.styling = !st.page.styling,
            "colorCheckbox" => st.page.coloring = !st.page.coloring,
            "labelsCheckbox" => st.page.labels = !st.page.labels,
            "toggleEditorButton" => st.page.editor_visible = !st.page.editor_visible,
            "renderButton" => {
                drop(st);
                self.render();
            }
            "exportButton" => {
                drop(st);
                self.export();
            }
            "domain" => st.page.focus = Focus::Input("domain"),
            "truthVector" => st.page.focus = Focus::Input("truthVector"),
            "customFont" => st.page.focus = Focus::Input("customFont"),
            _ => {
                if let Some(i) = key.strip_prefix("ace_line:").and_then(|i| i.parse::<usize>().ok()) {
                    let caret = st.page.script[i].chars().count();
                    st.page.focus = Focus::EditorLine {
                        line: i,
                        caret,
                        anchor: None,
                    };
                }
            }
        }
    }

    fn render(&self) {
        let mut st = self.state();
        let validated = st.page.validate();
        let (domains, truth) = match validated {
            Ok(parsed) => parsed,
            Err(outcome) => {
                st.page.validation = Some(outcome);
                return;
            }
        };
        st.page.validation = Some(ValidationOutcome::Clean);

        let diagram = Diagram {
            script: base_script(&domains, &truth),
            domains,
            truth,
            look: st.page.look(),
        };
        let navigation = st.navigations;
        let (start, duration) = (st.render_start_delay, st.render_duration);
        drop(st);

        let state = self.state.clone();
        std::thread::spawn(move || {
            std::thread::sleep(start);
            {
                let mut st = state.lock().unwrap();
                if st.navigations != navigation {
                    return;
                }
                st.page.busy = true;
            }
            std::thread::sleep(duration);
            let mut st = state.lock().unwrap();
            if st.navigations != navigation {
                return;
            }
            st.page.busy = false;
            st.page.script = diagram.script.clone();
            st.page.rendered = Some(diagram);
        });
    }

    fn export(&self) {
        let mut st = self.state();
        st.exports += 1;
        let mut diagram = st.page.rendered.clone().unwrap_or_else(|| Diagram::new(&[], &[]));
        diagram.script = st.page.script.clone();
        let extension = st.page.format.clone();
        let delay = st.export_delay;
        drop(st);

        let target = self.download_dir.join(format!("{}.{}", EXPORT_STEM, extension));
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let partial = target.with_extension(format!("{}.part", extension));
            match extension.as_str() {
                "svg" => std::fs::write(&partial, diagram.svg()).unwrap(),
                _ => {
                    let img = diagram.pixels();
                    image::save_buffer_with_format(
                        &partial,
                        img.as_raw(),
                        img.width(),
                        img.height(),
                        ColorType::L8,
                        ImageFormat::Png,
                    )
                    .unwrap()
                }
            }
            std::fs::rename(&partial, &target).unwrap();
        });
    }

    fn type_text(&self, key: Option<String>, text: &str) {
        let mut st = self.state();
        let page = &mut st.page;
        if let Some(key) = key {
            if let Some(value) = page.input_mut(&key) {
                value.push_str(text);
            }
            return;
        }

        let focus = page.focus;
        match focus {
            Focus::Input(key) => {
                if let Some(value) = page.input_mut(key) {
                    value.push_str(text);
                }
            }
            Focus::EditorLine { line, caret, anchor } => {
                let mut chars: Vec<char> = page.script[line].chars().collect();
                let start = anchor.map_or(caret, |a| a.min(caret));
                let end = anchor.map_or(caret, |a| a.max(caret));
                chars.splice(start..end, text.chars());
                page.script[line] = chars.into_iter().collect();
                page.focus = Focus::EditorLine {
                    line,
                    caret: start + text.chars().count(),
                    anchor: None,
                };
            }
            Focus::None => {}
        }
    }

    fn press(&self, key: Option<String>, chord: &str) {
        let mut st = self.state();
        let page = &mut st.page;

        if let Some(key) = key {
            if key == "controlPanel" {
                if chord == "PageDown" {
                    page.page_downs += 1;
                }
                return;
            }
            if let Some(input) = ["domain", "truthVector", "customFont"].into_iter().find(|k| *k == key) {
                page.focus = Focus::Input(input);
            }
        }

        match (chord, page.focus) {
            ("ControlOrMeta+a", Focus::Input(_)) => page.select_all = true,
            ("Delete", Focus::Input(input)) => {
                if page.select_all {
                    if let Some(value) = page.input_mut(input) {
                        value.clear();
                    }
                    page.select_all = false;
                }
            }
            ("Tab", _) => {
                page.focus = Focus::None;
                page.select_all = false;
            }
            ("Home", Focus::EditorLine { line, .. }) => {
                let first = page.script[line].chars().take_while(|c| c.is_whitespace()).count();
                page.focus = Focus::EditorLine {
                    line,
                    caret: first,
                    anchor: None,
                };
            }
            ("Shift+End", Focus::EditorLine { line, caret, anchor }) => {
                page.focus = Focus::EditorLine {
                    line,
                    caret: page.script[line].chars().count(),
                    anchor: Some(anchor.unwrap_or(caret)),
                };
            }
            _ => {}
        }
    }

    fn select(&self, key: &str, option: &str) -> bool {
        let mut st = self.state();
        let page = &mut st.page;
        let pick = |options: &[&str]| options.iter().find(|o| **o == option).map(|o| o.to_string());

        if let Some(i) = indexed(key, "dynamicEdgeStyle") {
            return pick(EDGE_STYLES).map(|v| page.edge_styles.insert(i, v)).is_some();
        }
        if let Some(i) = indexed(key, "dynamicEdgeColor") {
            return pick(EDGE_COLORS).map(|v| page.edge_colors.insert(i, v)).is_some();
        }
        match key {
            "Font" => pick(FONTS).map(|v| page.font = v).is_some(),
            "separator" => pick(SEPARATORS).map(|v| page.separator = v).is_some(),
            "format" => FORMATS
                .iter()
                .find(|(value, label)| *value == option || *label == option)
                .map(|(value, _)| page.format = value.to_string())
                .is_some(),
            _ => false,
        }
    }
}

pub struct FakeDriver {
    app: FakeApp,
}

impl FakeDriver {
    /// Element key behind a handle, failing for stale or detached handles
    fn resolve(&self, element: &ElementRef) -> E2eResult<String> {
        let st = self.app.state();
        let (navigation, key) = element
            .as_str()
            .split_once('/')
            .ok_or_else(|| E2eError::Playwright(format!("malformed handle {}", element.as_str())))?;

        if navigation.parse::<u64>().ok() != Some(st.navigations) {
            return Err(E2eError::Playwright(format!("stale element handle {}", element.as_str())));
        }
        if !st.exists(key) {
            return Err(E2eError::Playwright(format!("element {} is detached", key)));
        }
        Ok(key.to_string())
    }

    fn handles(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let scope = scope.map(|s| self.resolve(s)).transpose()?;
        let st = self.app.state();
        Ok(st
            .candidates(scope.as_deref(), locator)
            .into_iter()
            .map(|key| ElementRef::new(format!("{}/{}", st.navigations, key)))
            .collect())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        let mut st = self.app.state();
        st.navigations += 1;
        st.visited.push(url.to_string());
        st.page = Page::default();
        Ok(())
    }

    async fn find(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Option<ElementRef>> {
        Ok(self.handles(scope, locator)?.into_iter().next())
    }

    async fn find_all(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        self.handles(scope, locator)
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        let key = self.resolve(element)?;
        self.app.click(&key);
        Ok(())
    }

    async fn clear(&self, element: &ElementRef) -> E2eResult<()> {
        let key = self.resolve(element)?;
        if let Some(value) = self.app.state().page.input_mut(&key) {
            value.clear();
        }
        Ok(())
    }

    async fn type_text(&self, element: Option<&ElementRef>, text: &str) -> E2eResult<()> {
        let key = element.map(|e| self.resolve(e)).transpose()?;
        self.app.type_text(key, text);
        Ok(())
    }

    async fn press(&self, element: Option<&ElementRef>, chord: &str) -> E2eResult<()> {
        let key = element.map(|e| self.resolve(e)).transpose()?;
        self.app.press(key, chord);
        Ok(())
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>> {
        let key = self.resolve(element)?;
        let st = self.app.state();
        Ok(match (key.as_str(), name) {
            ("viewCanvas", "class") => Some(if st.page.busy {
                "view-canvas working".to_string()
            } else {
                "view-canvas".to_string()
            }),
            (key, "style") => st.page.style(key),
            _ => None,
        })
    }

    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Value> {
        let key = self.resolve(element)?;
        let st = self.app.state();
        Ok(match (key.as_str(), name) {
            ("controlPanel", "scrollHeight") => json!(st.panel_scroll_height),
            ("controlPanel", "clientHeight") => json!(st.panel_client_height),
            _ => Value::Null,
        })
    }

    async fn is_checked(&self, element: &ElementRef) -> E2eResult<bool> {
        let key = self.resolve(element)?;
        let st = self.app.state();
        Ok(match key.as_str() {
            "stylingCheckbox" => st.page.styling,
            "colorCheckbox" => st.page.coloring,
            "labelsCheckbox" => st.page.labels,
            _ => false,
        })
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let key = self.resolve(element)?;
        let st = self.app.state();
        Ok(key
            .strip_prefix("ace_line:")
            .and_then(|i| i.parse::<usize>().ok())
            .and_then(|i| st.page.script.get(i).cloned())
            .unwrap_or_default())
    }

    async fn select_option(&self, element: &ElementRef, option: &str) -> E2eResult<bool> {
        let key = self.resolve(element)?;
        Ok(self.app.select(&key, option))
    }

    async fn quit(&self) -> E2eResult<()> {
        self.app.state().quit = true;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Harness helpers
// ---------------------------------------------------------------------------

/// Short timeouts and tight polling for an in-process application
pub fn fast_timing() -> TimingConfig {
    TimingConfig {
        render_timeout_ms: 2_000,
        render_poll_ms: 5,
        download_timeout_ms: 3_000,
        download_poll_ms: 20,
        style_timeout_ms: 300,
        style_poll_ms: 5,
        app_ready_timeout_ms: 1_000,
    }
}

/// Configuration rooted in a scratch directory
pub fn harness_config(root: &Path) -> HarnessConfig {
    let mut config = HarnessConfig {
        base_url: BASE_URL.to_string(),
        download_dir: root.join("downloads"),
        golden_dir: root.join("golden"),
        scenarios_dir: Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios"),
        output_dir: root.join("results"),
        timing: fast_timing(),
        ..HarnessConfig::default()
    };
    config.oracle.diff_dir = Some(root.join("results").join("diffs"));
    std::fs::create_dir_all(&config.golden_dir).unwrap();
    config
}

pub async fn start_session(app: &FakeApp) -> Session {
    Session::start(app.driver(), BASE_URL, fast_timing()).await.unwrap()
}

/// Golden references for the shipped scenarios
pub fn write_goldens(dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let base = Diagram::new(DOMAINS, TRUTH_POSITIVE);

    base.write_png(&dir.join("expected_input_to_export.png"));
    base.write_svg(&dir.join("expected_input_to_export.svg"));
    base.write_png(&dir.join("expected_hidden_labels.png"));

    base.clone()
        .with_look(|l| {
            l.edge_styles.insert(2, "Dashed".to_string());
        })
        .write_png(&dir.join("expected_styling.png"));
    base.clone()
        .with_look(|l| {
            l.edge_colors.insert(2, "Pink".to_string());
        })
        .write_png(&dir.join("expected_coloring.png"));
    base.clone()
        .with_look(|l| l.font = "Helvetica".to_string())
        .write_png(&dir.join("expected_font.png"));
    base.clone()
        .with_look(|l| l.font = "Consolas".to_string())
        .write_png(&dir.join("expected_custom_font.png"));
    base.clone()
        .with_look(|l| l.labels = true)
        .write_png(&dir.join("expected_show_labels.png"));
    base.clone()
        .edit_line(4, "node [shape = triangle] 2 4 7;")
        .write_png(&dir.join("expected_editor_edit.png"));
}
