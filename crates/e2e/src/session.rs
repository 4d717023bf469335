//! Session lifecycle
//!
//! A [`Session`] binds one driver connection to the application. Static
//! capabilities are resolved when the session starts and again on every
//! [`Session::reset`]; they are never re-resolved implicitly in between.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::capability::Capability;
use crate::config::TimingConfig;
use crate::driver::{Driver, ElementRef};
use crate::error::{E2eError, E2eResult};

pub struct Session {
    driver: Box<dyn Driver>,
    base_url: String,
    handles: HashMap<Capability, ElementRef>,
    timing: TimingConfig,
}

impl Session {
    /// Navigate to `base_url` and resolve every static capability
    pub async fn start(
        driver: Box<dyn Driver>,
        base_url: impl Into<String>,
        timing: TimingConfig,
    ) -> E2eResult<Self> {
        let mut session = Self {
            driver,
            base_url: base_url.into(),
            handles: HashMap::new(),
            timing,
        };
        session.open().await?;
        info!("Session started at {}", session.base_url);
        Ok(session)
    }

    /// Re-navigate and re-resolve handles, keeping the driver connection
    pub async fn reset(&mut self) -> E2eResult<()> {
        debug!("Resetting session");
        self.open().await
    }

    /// Release the driver connection
    pub async fn teardown(self) -> E2eResult<()> {
        info!("Tearing down session");
        self.driver.quit().await
    }

    async fn open(&mut self) -> E2eResult<()> {
        self.handles.clear();
        self.driver.navigate(&self.base_url).await?;

        for capability in Capability::STATIC {
            let element = self.find(capability).await?;
            self.handles.insert(capability, element);
        }

        debug!("Resolved {} capabilities", self.handles.len());
        Ok(())
    }

    async fn find(&self, capability: Capability) -> E2eResult<ElementRef> {
        let locator = capability.locator();
        self.driver
            .find(None, &locator)
            .await?
            .ok_or_else(|| E2eError::Resolution {
                capability: capability.to_string(),
                locator: locator.to_string(),
            })
    }

    /// Handle resolved at session start or the last reset
    pub fn handle(&self, capability: Capability) -> E2eResult<&ElementRef> {
        self.handles
            .get(&capability)
            .ok_or_else(|| E2eError::Resolution {
                capability: capability.to_string(),
                locator: capability.locator().to_string(),
            })
    }

    /// Static capabilities come from the handle table; dynamic ones are
    /// looked up now.
    pub async fn locate(&self, capability: Capability) -> E2eResult<ElementRef> {
        if capability.is_static() {
            self.handle(capability).cloned()
        } else {
            self.find(capability).await
        }
    }

    pub fn driver(&self) -> &dyn Driver {
        self.driver.as_ref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }
}
