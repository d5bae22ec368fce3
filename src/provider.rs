//! The vision-model seam: a narrow trait plus the Gemini implementation.
//!
//! The pipeline is written against [`VisionModel`] —
//! `generate(instruction, image) -> text` — and nothing else. Everything the
//! hosted API actually requires (endpoint shape, candidate arrays, key
//! placement) stays inside [`GeminiClient`], so swapping the hosted service
//! or substituting a test stub never touches pipeline logic.
//!
//! [`GeminiClient`] holds a `reqwest::Client` and is cheap to clone and safe
//! to share: construct it once at process start and reuse it across
//! invocations.

use crate::error::LabelScanError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A base64-encoded image ready for a multimodal API request body.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Base64-encoded image bytes.
    pub data: String,
    /// Mime type sent to the model, e.g. `image/jpeg`.
    pub mime_type: String,
}

/// The narrow upstream interface the pipeline depends on.
///
/// One instruction, one inline image, one free-text reply. Implementations
/// must be `Send + Sync` so a single instance can serve concurrent
/// invocations without locking.
#[async_trait]
pub trait VisionModel: Send + Sync {
    /// Send `instruction` plus `image` to the model and return its raw text.
    async fn generate(
        &self,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<String, LabelScanError>;
}

// ── Gemini REST wire types ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

/// Untagged: a part is either `{"text": …}` or `{"inlineData": …}` on the wire.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: usize,
    /// Asking for `application/json` output shifts most formatting burden to
    /// the API; defensive parsing downstream still handles models that
    /// disobey.
    response_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

// ── Gemini client ────────────────────────────────────────────────────────

/// Gemini `generateContent` implementation of [`VisionModel`].
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: usize,
}

impl GeminiClient {
    /// Build a client for the given endpoint and model.
    ///
    /// The key is validated for presence only; a wrong key surfaces as
    /// [`LabelScanError::AuthFailed`] on the first call.
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        max_output_tokens: usize,
    ) -> Result<Self, LabelScanError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LabelScanError::Misconfigured);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            api_base: api_base.into(),
            api_key,
            model: model.into(),
            temperature,
            max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base.trim_end_matches('/'),
            self.model,
            self.api_key
        )
    }
}

#[async_trait]
impl VisionModel for GeminiClient {
    async fn generate(
        &self,
        instruction: &str,
        image: &ImagePayload,
    ) -> Result<String, LabelScanError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text {
                        text: instruction.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: "application/json".to_string(),
            },
        };

        let response = self
            .http
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| LabelScanError::UpstreamFailure {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_http_error(status, response).await);
        }

        let body: GenerateContentResponse =
            response
                .json()
                .await
                .map_err(|e| LabelScanError::UpstreamFailure {
                    detail: format!("unreadable response body: {e}"),
                })?;

        let text: String = body
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(LabelScanError::UpstreamFailure {
                detail: "response carried no candidate text".into(),
            });
        }

        debug!("Model returned {} chars", text.len());
        Ok(text)
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
///
/// 401/403 are credential problems (not retryable), 429 is rate limiting
/// (retryable with backoff), everything else — including all 5xx — is a
/// generic upstream failure.
async fn classify_http_error(
    status: reqwest::StatusCode,
    response: reqwest::Response,
) -> LabelScanError {
    let retry_after_secs = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());
    let body = response.text().await.unwrap_or_default();
    let detail = if body.is_empty() {
        format!("HTTP {status}")
    } else {
        format!("HTTP {status}: {body}")
    };

    match status.as_u16() {
        401 | 403 => LabelScanError::AuthFailed { detail },
        429 => LabelScanError::RateLimited { retry_after_secs },
        _ => LabelScanError::UpstreamFailure { detail },
    }
}
