//! Model invocation: one awaited exchange, bounded by a timeout.
//!
//! The default configuration performs no retries — the upstream exchange
//! either completes or the invocation fails. When `max_retries` is raised,
//! retries are gated on [`LabelScanError::is_transient`]: a timeout, 429 or
//! 5xx gets backed off and retried; an auth failure or malformed reply never
//! does. The first success ends the loop, so at most one result is ever
//! produced per invocation.
//!
//! ## Backoff
//!
//! Exponential: `retry_backoff_ms * 2^(attempt-1)`. With the 500 ms default
//! and 3 retries the wait sequence is 500 ms → 1 s → 2 s.

use crate::config::ExtractionConfig;
use crate::error::LabelScanError;
use crate::provider::{ImagePayload, VisionModel};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Drive the model call to completion or failure.
///
/// Returns the raw reply text plus the number of retries consumed.
pub async fn invoke_model(
    model: &Arc<dyn VisionModel>,
    instruction: &str,
    image: &ImagePayload,
    config: &ExtractionConfig,
) -> Result<(String, u32), LabelScanError> {
    let call_timeout = Duration::from_secs(config.api_timeout_secs);
    let mut last_err = LabelScanError::Internal("model was never invoked".into());

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "Model call retry {}/{} after {}ms",
                attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let start = Instant::now();
        let outcome = timeout(call_timeout, model.generate(instruction, image)).await;

        match outcome {
            Ok(Ok(text)) => {
                debug!(
                    "Model call succeeded in {}ms ({} retries)",
                    start.elapsed().as_millis(),
                    attempt
                );
                return Ok((text, attempt));
            }
            Ok(Err(e)) => {
                if !e.is_transient() {
                    return Err(e);
                }
                warn!("Model call attempt {} failed: {}", attempt + 1, e);
                last_err = e;
            }
            Err(_elapsed) => {
                let e = LabelScanError::UpstreamTimeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                };
                warn!("Model call attempt {} timed out", attempt + 1);
                last_err = e;
            }
        }
    }

    Err(last_err)
}
