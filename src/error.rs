//! Error types for the labelscan library.
//!
//! Every failure a caller can see falls into one of four coarse categories,
//! and each category answers a different "whose fault is it?" question:
//!
//! * **Caller input** — the request itself is unusable (no image bytes,
//!   broken base64). The caller must fix the request; retrying is pointless.
//!
//! * **Deployment** — the service side is missing its credential or endpoint
//!   configuration. An operator must fix the deployment.
//!
//! * **Upstream** — the vision-model call itself failed (network, quota,
//!   auth at the provider). A retry with backoff may help for the transient
//!   subset; see [`LabelScanError::is_transient`].
//!
//! * **Malformed response** — the model replied, but the text could not be
//!   turned into the expected record shape. This reflects model output
//!   variability, not a transient fault, and is never auto-retried.
//!
//! No partial results exist: an invocation yields either a complete
//! four-field record or exactly one of these errors.

use thiserror::Error;

/// All errors returned by the labelscan library.
#[derive(Debug, Error)]
pub enum LabelScanError {
    // ── Caller input errors ───────────────────────────────────────────────
    /// The request carried no image payload at all.
    #[error("No image data in request.\nSend the label photo as base64 JPEG bytes.")]
    MissingImage,

    /// The image payload was present but empty.
    #[error("Image data is empty (0 bytes)")]
    EmptyImage,

    /// The image payload was not valid base64.
    #[error("Image data is not valid base64: {detail}")]
    InvalidBase64 { detail: String },

    // ── Deployment errors ─────────────────────────────────────────────────
    /// No API key could be resolved from the config or the environment.
    #[error(
        "Vision model credential is not configured.\n\
         Set GEMINI_API_KEY, or pass an API key via ExtractionConfig."
    )]
    Misconfigured,

    // ── Upstream errors ───────────────────────────────────────────────────
    /// The model API rejected the credential (401/403) — retry will not help.
    #[error("Authentication failed at the model API: {detail}")]
    AuthFailed { detail: String },

    /// The model API returned HTTP 429 — caller should back off.
    ///
    /// Check `retry_after_secs` for a server-specified delay, or use
    /// exponential backoff if `None`.
    #[error("Rate limit exceeded at the model API")]
    RateLimited { retry_after_secs: Option<u64> },

    /// The model call did not complete within the configured timeout.
    #[error("Model call timed out after {elapsed_ms}ms")]
    UpstreamTimeout { elapsed_ms: u64 },

    /// Any other failure of the model call (network, 5xx, unusable body).
    #[error("Model call failed: {detail}")]
    UpstreamFailure { detail: String },

    // ── Malformed-response errors ─────────────────────────────────────────
    /// The model text contained no `{`…`}` span to parse.
    #[error("Model response contains no JSON object.\nResponse began: {snippet:?}")]
    NoJsonObject { snippet: String },

    /// A `{`…`}` span was found but did not parse as JSON.
    #[error("Model response is not valid JSON: {detail}")]
    UnparseableJson { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LabelScanError {
    /// Whether a retry with backoff has any chance of succeeding.
    ///
    /// Only transport-level upstream failures qualify. Malformed responses
    /// are deliberately excluded: model output variability could loop a
    /// retry forever without converging, so a second attempt is left to the
    /// caller's discretion.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            LabelScanError::RateLimited { .. }
                | LabelScanError::UpstreamTimeout { .. }
                | LabelScanError::UpstreamFailure { .. }
        )
    }

    /// Whether the error is the caller's to fix (bad request payload).
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            LabelScanError::MissingImage
                | LabelScanError::EmptyImage
                | LabelScanError::InvalidBase64 { .. }
        )
    }

    /// Whether the model replied but the reply could not be parsed.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            LabelScanError::NoJsonObject { .. } | LabelScanError::UnparseableJson { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limited_is_transient() {
        let e = LabelScanError::RateLimited {
            retry_after_secs: Some(30),
        };
        assert!(e.is_transient());
    }

    #[test]
    fn timeout_is_transient() {
        let e = LabelScanError::UpstreamTimeout { elapsed_ms: 30_000 };
        assert!(e.is_transient());
        assert!(e.to_string().contains("30000ms"));
    }

    #[test]
    fn auth_failure_is_not_transient() {
        let e = LabelScanError::AuthFailed {
            detail: "invalid key".into(),
        };
        assert!(!e.is_transient());
        assert!(e.to_string().contains("invalid key"));
    }

    #[test]
    fn malformed_is_never_transient() {
        let no_json = LabelScanError::NoJsonObject {
            snippet: "Sure! Here is".into(),
        };
        let bad_json = LabelScanError::UnparseableJson {
            detail: "expected value at line 1".into(),
        };
        assert!(!no_json.is_transient());
        assert!(!bad_json.is_transient());
        assert!(no_json.is_malformed_response());
        assert!(bad_json.is_malformed_response());
    }

    #[test]
    fn caller_errors_classified() {
        assert!(LabelScanError::MissingImage.is_caller_error());
        assert!(LabelScanError::EmptyImage.is_caller_error());
        assert!(!LabelScanError::Misconfigured.is_caller_error());
    }

    #[test]
    fn misconfigured_message_names_env_var() {
        assert!(LabelScanError::Misconfigured
            .to_string()
            .contains("GEMINI_API_KEY"));
    }
}
