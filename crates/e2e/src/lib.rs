//! MDD Visualizer E2E Harness
//!
//! This crate drives the deployed visualizer through a browser and checks
//! what it produces:
//! - Controls Playwright through a persistent Node bridge
//! - Exposes the application's controls as semantic operations on a session
//! - Blocks on asynchronous effects with deadline-bounded waits
//! - Compares exported diagrams against golden references (SSIM for PNG,
//!   matching-block ratio for SVG)
//! - Runs declarative YAML scenarios and reports JSON results
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Scenario Runner (YAML specs)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session (impl blocks)                                      │
//! │    ├── facade:     configure_field, render, export, ...     │
//! │    └── assertions: selector_count, assert_validation, ...   │
//! ├──────────────────────────────┬──────────────────────────────┤
//! │  wait                        │  visual                      │
//! │    ├── await_condition       │    ├── raster (SSIM)         │
//! │    └── await_file            │    └── text (ratio)          │
//! ├──────────────────────────────┴──────────────────────────────┤
//! │  Driver trait ── PlaywrightDriver (Node bridge, JSON lines) │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod artifact;
pub mod assertions;
pub mod capability;
pub mod config;
pub mod controls;
pub mod driver;
pub mod error;
pub mod facade;
pub mod playwright;
pub mod probe;
pub mod runner;
pub mod session;
pub mod spec;
pub mod visual;
pub mod wait;

pub use artifact::{Artifact, DownloadDir, Materialization};
pub use capability::Capability;
pub use config::HarnessConfig;
pub use driver::{Driver, ElementRef, Locator};
pub use error::{E2eError, E2eResult};
pub use runner::{Outcome, ScenarioRunner, SuiteResult};
pub use session::Session;
pub use spec::{ScenarioSpec, ScenarioStep};
pub use visual::{raster_similar, text_similar, Comparison, VisualOracle};
pub use wait::{await_condition, await_file, await_predicate, WaitPolicy};
