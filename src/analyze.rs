//! Entry points for a label extraction.
//!
//! One invocation is a straight line: validate and encode the image, resolve
//! the model client, make the single model call, parse the reply. Any step
//! failing ends the invocation with a categorised error; there are no
//! partial results.

use crate::config::ExtractionConfig;
use crate::error::LabelScanError;
use crate::pipeline::{encode, extract, invoke};
use crate::prompts::DEFAULT_INSTRUCTION;
use crate::provider::{GeminiClient, VisionModel};
use crate::record::{ExtractionOutput, ExtractionRequest, ExtractionStats};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Extract the four-field record from a label photo.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `image_bytes` — raw image bytes (JPEG expected; PNG also recognised)
/// * `config` — extraction configuration
///
/// # Errors
/// * caller errors ([`LabelScanError::EmptyImage`]) before any network call
/// * [`LabelScanError::Misconfigured`] when no credential can be resolved,
///   also before any network call
/// * upstream and malformed-response errors from the model exchange
pub async fn analyze(
    image_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LabelScanError> {
    let total_start = Instant::now();

    // ── Step 1: Validate and encode ──────────────────────────────────────
    let payload = encode::encode_image(image_bytes)?;
    debug!("Image payload ready ({} bytes raw)", image_bytes.len());

    // ── Step 2: Resolve the model client ─────────────────────────────────
    // Checked every invocation: process-start initialisation can fail
    // silently, and a missing credential must surface as Misconfigured
    // before the network is touched.
    let model = resolve_model(config)?;

    // ── Step 3: Invoke the model ─────────────────────────────────────────
    let instruction = config.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION);
    let model_start = Instant::now();
    let (raw_text, retries) = invoke::invoke_model(&model, instruction, &payload, config).await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;

    // ── Step 4: Parse the reply ──────────────────────────────────────────
    let record = extract::extract_record(&raw_text)?;

    let stats = ExtractionStats {
        duration_ms: total_start.elapsed().as_millis() as u64,
        model_duration_ms,
        retries,
    };
    info!(
        "Extraction complete in {}ms (model {}ms, {} retries)",
        stats.duration_ms, stats.model_duration_ms, stats.retries
    );

    Ok(ExtractionOutput { record, stats })
}

/// Extract from a base64-encoded image payload.
///
/// Accepts a bare base64 string or a `data:image/...;base64,` data-URI.
pub async fn analyze_base64(
    data: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LabelScanError> {
    let bytes = encode::decode_base64(data)?;
    analyze(&bytes, config).await
}

/// Handle a callable-style request: `{ "imageData": "<base64>" }`.
///
/// The request-shape counterpart of [`analyze`], for hosts that receive the
/// payload as JSON. An absent `imageData` field is
/// [`LabelScanError::MissingImage`], reported without any network activity.
pub async fn handle_request(
    request: &ExtractionRequest,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LabelScanError> {
    let data = request
        .image_data
        .as_deref()
        .ok_or(LabelScanError::MissingImage)?;
    if data.is_empty() {
        return Err(LabelScanError::EmptyImage);
    }
    analyze_base64(data, config).await
}

/// Synchronous wrapper around [`analyze`].
///
/// Creates a temporary tokio runtime internally.
pub fn analyze_sync(
    image_bytes: &[u8],
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, LabelScanError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| LabelScanError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(analyze(image_bytes, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the model client, from most-specific to least-specific.
///
/// 1. **Pre-built client** (`config.model_client`) — the caller constructed
///    the client once at process start (or injected a test stub); used as-is.
/// 2. **Configured key** (`config.api_key`) — build a [`GeminiClient`]
///    against the configured endpoint.
/// 3. **Environment** (`GEMINI_API_KEY`) — deployment-level credential.
///
/// No credential anywhere is a deployment error, surfaced before any
/// network call is attempted.
fn resolve_model(config: &ExtractionConfig) -> Result<Arc<dyn VisionModel>, LabelScanError> {
    if let Some(ref client) = config.model_client {
        return Ok(Arc::clone(client));
    }

    let api_key = match config.api_key.clone() {
        Some(key) if !key.is_empty() => key,
        _ => match std::env::var("GEMINI_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => return Err(LabelScanError::Misconfigured),
        },
    };

    let client = GeminiClient::new(
        &config.api_base,
        api_key,
        &config.model,
        config.temperature,
        config.max_output_tokens,
    )?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stubless_config() -> ExtractionConfig {
        // No client, no key; the env var may leak in from the host shell,
        // so point it away explicitly per test instead of relying on it.
        ExtractionConfig::builder().build().unwrap()
    }

    #[test]
    fn resolve_prefers_injected_client() {
        use crate::provider::ImagePayload;
        use async_trait::async_trait;

        struct NullModel;

        #[async_trait]
        impl VisionModel for NullModel {
            async fn generate(
                &self,
                _instruction: &str,
                _image: &ImagePayload,
            ) -> Result<String, LabelScanError> {
                Ok("{}".into())
            }
        }

        let config = ExtractionConfig::builder()
            .model_client(Arc::new(NullModel))
            .build()
            .unwrap();
        assert!(resolve_model(&config).is_ok());
    }

    #[test]
    fn resolve_uses_configured_key() {
        let config = ExtractionConfig::builder().api_key("k").build().unwrap();
        assert!(resolve_model(&config).is_ok());
    }

    #[tokio::test]
    async fn empty_image_fails_before_model_resolution() {
        // An unconfigured model would also fail, but the caller error must
        // win because validation precedes resolution.
        let err = analyze(&[], &stubless_config()).await.unwrap_err();
        assert!(matches!(err, LabelScanError::EmptyImage));
    }

    #[tokio::test]
    async fn missing_image_data_is_invalid_argument() {
        let request = ExtractionRequest { image_data: None };
        let err = handle_request(&request, &stubless_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LabelScanError::MissingImage));
    }

    #[tokio::test]
    async fn empty_image_data_is_invalid_argument() {
        let request = ExtractionRequest {
            image_data: Some(String::new()),
        };
        let err = handle_request(&request, &stubless_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LabelScanError::EmptyImage));
    }

    #[tokio::test]
    async fn bad_base64_is_invalid_argument() {
        let request = ExtractionRequest {
            image_data: Some("!!definitely not base64!!".into()),
        };
        let err = handle_request(&request, &stubless_config())
            .await
            .unwrap_err();
        assert!(matches!(err, LabelScanError::InvalidBase64 { .. }));
    }
}
