//! Readiness probe for the deployed application

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tracing::{info, warn};

use crate::error::E2eResult;
use crate::wait::{await_condition, WaitPolicy};

/// Poll `base_url` until it answers with a success status.
///
/// Connection errors are expected while a deployment comes up and only the
/// first one is reported.
pub async fn wait_for_app(base_url: &str, policy: WaitPolicy) -> E2eResult<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()?;
    let attempts = AtomicUsize::new(0);
    let (client, counter) = (&client, &attempts);

    let condition = format!("{} to respond", base_url);
    await_condition(&condition, policy, move || async move {
        let attempt = counter.fetch_add(1, Ordering::Relaxed) + 1;
        match client.get(base_url).send().await {
            Ok(resp) if resp.status().is_success() => Ok(true),
            Ok(resp) => {
                warn!("Readiness probe returned {}", resp.status());
                Ok(false)
            }
            Err(e) => {
                if attempt == 1 {
                    info!("Waiting for {} ...", base_url);
                }
                if !e.is_connect() && !e.is_timeout() {
                    warn!("Readiness probe error: {}", e);
                }
                Ok(false)
            }
        }
    })
    .await?;

    info!(
        "Application ready at {} after {} attempt(s)",
        base_url,
        attempts.load(Ordering::Relaxed)
    );
    Ok(())
}
