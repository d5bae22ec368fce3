//! Configuration types for label extraction.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to share configs across invocations and to diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest; a many-field constructor breaks on
//! every new field.

use crate::error::LabelScanError;
use crate::provider::VisionModel;
use std::fmt;
use std::sync::Arc;

/// Default Gemini model used when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Default Gemini API base URL.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Configuration for a label extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use labelscan::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gemini-2.5-flash")
///     .api_timeout_secs(20)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Vision model identifier, e.g. "gemini-2.0-flash". Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the model API. Default: [`DEFAULT_API_BASE`].
    ///
    /// Overridable so tests and self-hosted gateways can point the client at
    /// a different endpoint without code changes.
    pub api_base: String,

    /// API key. If `None`, `GEMINI_API_KEY` is read from the environment at
    /// invocation time; if that is also absent the invocation fails with
    /// [`LabelScanError::Misconfigured`] before any network call.
    pub api_key: Option<String>,

    /// Instruction prompt sent with the image. If `None`, uses the built-in
    /// default from [`crate::prompts`].
    ///
    /// The prompt is configuration, not logic: the field exists so the
    /// instruction can be retuned (new field hints, new digit-confusion
    /// warnings) without touching or redeploying pipeline code.
    pub instruction: Option<String>,

    /// Sampling temperature for the model. Default: 0.1.
    ///
    /// Low temperature keeps the model faithful to what is printed on the
    /// label — exactly what you want for transcription. Higher values
    /// introduce creativity that worsens reading accuracy.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1024.
    ///
    /// The expected reply is a four-field JSON object, well under 200
    /// tokens; 1024 leaves room for models that pad with prose.
    pub max_output_tokens: usize,

    /// Maximum retry attempts on a transient model-call failure. Default: 0.
    ///
    /// The default is no retry: one failure of the single upstream call is
    /// fatal for the invocation. When raised, retries apply only to
    /// transport-level failures (timeout, 429, 5xx) — a malformed response
    /// is a data problem and is never retried automatically.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: 30.
    ///
    /// Without a bound an unresponsive upstream blocks the caller
    /// indefinitely. 30 s covers slow vision-model responses with margin.
    pub api_timeout_secs: u64,

    /// Pre-constructed model client. Takes precedence over `api_key`.
    ///
    /// Construct once at process start and reuse across invocations — the
    /// client is stateless configuration, not a resource needing locking.
    /// Tests inject a stub here instead of talking to the network.
    pub model_client: Option<Arc<dyn VisionModel>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: None,
            instruction: None,
            temperature: 0.1,
            max_output_tokens: 1024,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: 30,
            model_client: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("instruction", &self.instruction.as_ref().map(|s| s.len()))
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field(
                "model_client",
                &self.model_client.as_ref().map(|_| "<dyn VisionModel>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn instruction(mut self, prompt: impl Into<String>) -> Self {
        self.config.instruction = Some(prompt.into());
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_output_tokens(mut self, n: usize) -> Self {
        self.config.max_output_tokens = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn model_client(mut self, client: Arc<dyn VisionModel>) -> Self {
        self.config.model_client = Some(client);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, LabelScanError> {
        let c = &self.config;
        if c.model.is_empty() {
            return Err(LabelScanError::InvalidConfig(
                "Model id must not be empty".into(),
            ));
        }
        if c.api_base.is_empty() {
            return Err(LabelScanError::InvalidConfig(
                "API base URL must not be empty".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(LabelScanError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }
        if let Some(ref instruction) = c.instruction {
            if instruction.trim().is_empty() {
                return Err(LabelScanError::InvalidConfig(
                    "Instruction override must not be blank".into(),
                ));
            }
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ExtractionConfig::builder().build().unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.api_timeout_secs, 30);
    }

    #[test]
    fn temperature_is_clamped() {
        let config = ExtractionConfig::builder().temperature(9.0).build().unwrap();
        assert_eq!(config.temperature, 2.0);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = ExtractionConfig::builder()
            .api_timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, LabelScanError::InvalidConfig(_)));
    }

    #[test]
    fn blank_instruction_rejected() {
        let err = ExtractionConfig::builder()
            .instruction("   \n")
            .build()
            .unwrap_err();
        assert!(matches!(err, LabelScanError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = ExtractionConfig::builder()
            .api_key("super-secret")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
