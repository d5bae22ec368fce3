//! # labelscan
//!
//! Read Japanese product labels into structured records using a hosted
//! vision model.
//!
//! ## Why this crate?
//!
//! Produce-label photos defeat classical OCR: handwritten corrections,
//! curved packaging, and near-identical digits (3/8, 0/9, 1/7) under plastic
//! wrap come out garbled. Instead this crate sends the photo to a multimodal
//! model with a reading instruction and defensively parses the free-text
//! reply into a fixed record — product name, origin, management id, JAN
//! code — with explicit nulls for anything the model could not read.
//!
//! ## Pipeline Overview
//!
//! ```text
//! JPEG bytes
//!  │
//!  ├─ 1. Encode   validate, sniff mime, base64-wrap
//!  ├─ 2. Invoke   single Gemini generateContent call (timeout-bounded)
//!  ├─ 3. Extract  strip fences, slice braces, parse JSON defensively
//!  └─ 4. Output   LabelRecord { productName, origin, mngId, janCode }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labelscan::{analyze, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential resolved from GEMINI_API_KEY when not set on the config
//!     let config = ExtractionConfig::default();
//!     let bytes = std::fs::read("label.jpg")?;
//!     let output = analyze(&bytes, &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.record)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Error model
//!
//! All failures are all-or-nothing and carry a coarse category: caller input
//! (fix the request), deployment (fix the credential), upstream (the model
//! call failed; the transient subset is safe to retry with backoff), or
//! malformed response (the model replied with something unparseable — not
//! retried automatically). See [`LabelScanError`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `labelscan` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! labelscan = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod analyze;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use analyze::{analyze, analyze_base64, analyze_sync, handle_request};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::LabelScanError;
pub use provider::{GeminiClient, ImagePayload, VisionModel};
pub use record::{ExtractionOutput, ExtractionRequest, ExtractionStats, LabelRecord};
