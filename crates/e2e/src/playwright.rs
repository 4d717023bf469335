//! Playwright browser automation
//!
//! A long-lived Node process runs [`BRIDGE_SCRIPT`], which owns the browser
//! page and a table of element handles. The harness sends one JSON request
//! per line on stdin and reads one JSON response per line from stdout.

use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BrowserConfig;
use crate::driver::{Driver, ElementRef, Locator};
use crate::error::{E2eError, E2eResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::InvalidConfig(format!("unknown browser '{other}'"))),
        }
    }
}

/// Node side of the bridge
pub const BRIDGE_SCRIPT: &str = r#"
const fs = require('fs');
const path = require('path');
const readline = require('readline');
const playwright = require('playwright');

const config = JSON.parse(process.env.MDDVIZ_BRIDGE_CONFIG);
const handles = new Map();
let nextHandle = 1;
let page;
let browser;

function reply(msg) {
  process.stdout.write(JSON.stringify(msg) + '\n');
}

function handle(id) {
  const h = handles.get(id);
  if (!h) throw new Error(`stale or unknown element handle ${id}`);
  return h;
}

// One id per DOM node: a node found again keeps its id and the new
// handle is released.
async function register(h) {
  const known = await h.evaluate((el) => el.__mddvizHandle || null);
  if (known && handles.has(known)) {
    await h.dispose();
    return known;
  }
  const id = `e${nextHandle++}`;
  await h.evaluate((el, tag) => { el.__mddvizHandle = tag; }, id);
  handles.set(id, h);
  return id;
}

function releaseAll() {
  for (const h of handles.values()) {
    h.dispose().catch(() => {});
  }
  handles.clear();
}

function root(scope) {
  return scope ? handle(scope) : page;
}

async function saveDownload(download) {
  const target = path.join(config.downloadDir, download.suggestedFilename());
  const partial = target + '.part';
  await download.saveAs(partial);
  fs.renameSync(partial, target);
  console.error(`[bridge] saved download ${target}`);
}

const commands = {
  async navigate({ url }) {
    releaseAll();
    await page.goto(url);
    return null;
  },
  async find({ scope, selector }) {
    try {
      const h = await root(scope).waitForSelector(selector, {
        state: 'attached',
        timeout: config.implicitWaitMs,
      });
      return h ? await register(h) : null;
    } catch (e) {
      return null;
    }
  },
  async find_all({ scope, selector }) {
    const found = await root(scope).$$(selector);
    return Promise.all(found.map(register));
  },
  async click({ element }) {
    await handle(element).click();
    return null;
  },
  async clear({ element }) {
    await handle(element).fill('');
    return null;
  },
  async type_text({ element, text }) {
    if (element) {
      await handle(element).type(text);
    } else {
      await page.keyboard.type(text);
    }
    return null;
  },
  async press({ element, chord }) {
    if (element) {
      await handle(element).press(chord);
    } else {
      await page.keyboard.press(chord);
    }
    return null;
  },
  async attribute({ element, name }) {
    return await handle(element).getAttribute(name);
  },
  async property({ element, name }) {
    return await handle(element).evaluate((el, n) => el[n], name);
  },
  async is_checked({ element }) {
    return await handle(element).isChecked();
  },
  async text({ element }) {
    return await handle(element).innerText();
  },
  async select_option({ element, option }) {
    const h = handle(element);
    const value = await h.evaluate((el, wanted) => {
      const match = Array.from(el.options || []).find(
        (o) => o.value === wanted || o.label.trim() === wanted || o.text.trim() === wanted
      );
      return match ? match.value : null;
    }, option);
    if (value === null) return false;
    await h.selectOption({ value });
    return true;
  },
  async quit() {
    await browser.close();
    setImmediate(() => process.exit(0));
    return null;
  },
};

(async () => {
  browser = await playwright[config.browser].launch({ headless: config.headless });
  const context = await browser.newContext({
    acceptDownloads: true,
    viewport: { width: config.viewportWidth, height: config.viewportHeight },
  });
  page = await context.newPage();
  page.setDefaultTimeout(config.implicitWaitMs);
  page.on('download', (d) => {
    saveDownload(d).catch((e) => console.error(`[bridge] download failed: ${e.message}`));
  });
  reply({ id: 0, ok: true, value: 'ready' });

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    let req;
    try {
      req = JSON.parse(line);
      const fn = commands[req.cmd];
      if (!fn) throw new Error(`unknown command ${req.cmd}`);
      const value = await fn(req);
      reply({ id: req.id, ok: true, value: value === undefined ? null : value });
    } catch (e) {
      reply({ id: req ? req.id : -1, ok: false, error: e.message });
    }
  }
  await browser.close();
})().catch((e) => {
  reply({ id: 0, ok: false, error: e.message });
  process.exit(1);
});
"#;

#[derive(Debug, Serialize)]
struct BridgeConfig<'a> {
    browser: &'static str,
    headless: bool,
    #[serde(rename = "viewportWidth")]
    viewport_width: u32,
    #[serde(rename = "viewportHeight")]
    viewport_height: u32,
    #[serde(rename = "implicitWaitMs")]
    implicit_wait_ms: u64,
    #[serde(rename = "downloadDir")]
    download_dir: &'a Path,
}

#[derive(Debug, Deserialize)]
struct BridgeResponse {
    id: i64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
}

struct BridgeIo {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl BridgeIo {
    async fn send(&mut self, line: &str) -> E2eResult<()> {
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until the response for `id` arrives.
    async fn receive(&mut self, id: i64) -> E2eResult<Value> {
        loop {
            let line = self
                .stdout
                .next_line()
                .await?
                .ok_or_else(|| E2eError::Playwright("bridge exited unexpectedly".to_string()))?;

            let response: BridgeResponse = match serde_json::from_str(&line) {
                Ok(r) => r,
                Err(_) => {
                    debug!("[bridge stdout] {}", line);
                    continue;
                }
            };

            if response.id != id {
                warn!("Discarding bridge response {} while waiting for {}", response.id, id);
                continue;
            }

            return if response.ok {
                Ok(response.value)
            } else {
                Err(E2eError::Playwright(
                    response.error.unwrap_or_else(|| "unknown bridge error".to_string()),
                ))
            };
        }
    }
}

fn malformed(cmd: &str, value: &Value) -> E2eError {
    E2eError::Playwright(format!("malformed reply to '{}': {}", cmd, value))
}

/// [`Driver`] backed by a Playwright bridge process
pub struct PlaywrightDriver {
    io: Mutex<BridgeIo>,
    next_id: AtomicU64,
    command_timeout: Duration,

    /// Keeps the bridge script on disk for the lifetime of the process
    _script_dir: tempfile::TempDir,
}

impl PlaywrightDriver {
    /// Launch a browser through a fresh bridge process
    pub async fn launch(config: &BrowserConfig, download_dir: &Path) -> E2eResult<Self> {
        Self::check_playwright_installed()?;

        std::fs::create_dir_all(download_dir)?;
        let download_dir = download_dir.canonicalize()?;

        let script_dir = tempfile::tempdir()?;
        let script_path = script_dir.path().join("bridge.js");
        std::fs::write(&script_path, BRIDGE_SCRIPT)?;

        let bridge_config = serde_json::to_string(&BridgeConfig {
            browser: config.browser.as_str(),
            headless: config.headless,
            viewport_width: config.viewport_width,
            viewport_height: config.viewport_height,
            implicit_wait_ms: config.implicit_wait_ms,
            download_dir: &download_dir,
        })?;

        info!(
            "Launching {} via Playwright bridge (headless: {}, size: {}x{})",
            config.browser.as_str(),
            config.headless,
            config.viewport_width,
            config.viewport_height
        );

        let mut cmd = TokioCommand::new("node");
        cmd.arg(&script_path)
            .env("MDDVIZ_BRIDGE_CONFIG", bridge_config)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(node_path) = &config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("Failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let mut io = BridgeIo {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
        };

        let launch_timeout = Duration::from_millis(config.command_timeout_ms);
        tokio::time::timeout(launch_timeout, io.receive(0))
            .await
            .map_err(|_| E2eError::Playwright("browser launch timed out".to_string()))??;

        info!("Browser launched successfully");

        Ok(Self {
            io: Mutex::new(io),
            next_id: AtomicU64::new(1),
            command_timeout: launch_timeout,
            _script_dir: script_dir,
        })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    async fn call(&self, cmd: &str, args: Value) -> E2eResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;

        let mut request = json!({ "id": id, "cmd": cmd });
        if let (Some(obj), Value::Object(extra)) = (request.as_object_mut(), args) {
            obj.extend(extra);
        }
        let line = serde_json::to_string(&request)?;

        let mut io = self.io.lock().await;
        io.send(&line).await?;

        tokio::time::timeout(self.command_timeout, io.receive(id))
            .await
            .map_err(|_| {
                E2eError::Playwright(format!(
                    "'{}' did not complete within {:?}",
                    cmd, self.command_timeout
                ))
            })?
    }

    async fn call_unit(&self, cmd: &str, args: Value) -> E2eResult<()> {
        self.call(cmd, args).await.map(|_| ())
    }

    /// Decode a reply value, failing on anything the command never returns
    fn decode<T: DeserializeOwned>(cmd: &str, value: Value) -> E2eResult<T> {
        serde_json::from_value(value.clone()).map_err(|_| malformed(cmd, &value))
    }

    async fn terminate(io: &mut BridgeIo) {
        let exited = tokio::time::timeout(Duration::from_secs(5), io.child.wait()).await;
        if matches!(exited, Ok(Ok(_))) {
            return;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            if let Some(pid) = io.child.id() {
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                }
            }
        }

        let _ = io.child.kill().await;
    }
}

#[async_trait]
impl Driver for PlaywrightDriver {
    async fn navigate(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.call_unit("navigate", json!({ "url": url })).await
    }

    async fn find(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Option<ElementRef>> {
        let value = self
            .call("find", json!({ "scope": scope, "selector": locator.to_selector() }))
            .await?;
        Self::decode("find", value)
    }

    async fn find_all(&self, scope: Option<&ElementRef>, locator: &Locator) -> E2eResult<Vec<ElementRef>> {
        let value = self
            .call("find_all", json!({ "scope": scope, "selector": locator.to_selector() }))
            .await?;
        Self::decode("find_all", value)
    }

    async fn click(&self, element: &ElementRef) -> E2eResult<()> {
        self.call_unit("click", json!({ "element": element })).await
    }

    async fn clear(&self, element: &ElementRef) -> E2eResult<()> {
        self.call_unit("clear", json!({ "element": element })).await
    }

    async fn type_text(&self, element: Option<&ElementRef>, text: &str) -> E2eResult<()> {
        self.call_unit("type_text", json!({ "element": element, "text": text }))
            .await
    }

    async fn press(&self, element: Option<&ElementRef>, chord: &str) -> E2eResult<()> {
        self.call_unit("press", json!({ "element": element, "chord": chord }))
            .await
    }

    async fn attribute(&self, element: &ElementRef, name: &str) -> E2eResult<Option<String>> {
        let value = self
            .call("attribute", json!({ "element": element, "name": name }))
            .await?;
        Self::decode("attribute", value)
    }

    async fn property(&self, element: &ElementRef, name: &str) -> E2eResult<Value> {
        self.call("property", json!({ "element": element, "name": name }))
            .await
    }

    async fn is_checked(&self, element: &ElementRef) -> E2eResult<bool> {
        let value = self.call("is_checked", json!({ "element": element })).await?;
        Self::decode("is_checked", value)
    }

    async fn text(&self, element: &ElementRef) -> E2eResult<String> {
        let value = self.call("text", json!({ "element": element })).await?;
        Self::decode("text", value)
    }

    async fn select_option(&self, element: &ElementRef, option: &str) -> E2eResult<bool> {
        let value = self
            .call("select_option", json!({ "element": element, "option": option }))
            .await?;
        Self::decode("select_option", value)
    }

    async fn quit(&self) -> E2eResult<()> {
        info!("Closing browser");
        let mut io = self.io.lock().await;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) as i64;
        let line = serde_json::to_string(&json!({ "id": id, "cmd": "quit" }))?;

        if let Err(e) = io.send(&line).await {
            warn!("Bridge did not accept quit: {}", e);
        }
        Self::terminate(&mut io).await;
        Ok(())
    }
}
