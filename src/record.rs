//! Request and result types for a label extraction.
//!
//! The record shape is fixed: exactly four fields, each independently a
//! string or an explicit `null`. A field the model could not read is `None`,
//! never defaulted from another field and never dropped from the serialised
//! output — downstream product-master tooling keys on all four names being
//! present.

use serde::{Deserialize, Serialize};

/// The inbound request payload, callable-style.
///
/// `imageData` carries the label photo as base64-encoded JPEG bytes. It is
/// the sole required input; an absent or empty value is a caller error, not
/// a processing failure. The request lives only for one invocation and is
/// never persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionRequest {
    /// Base64-encoded JPEG bytes of the label photo.
    #[serde(default)]
    pub image_data: Option<String>,
}

/// The structured record read off a product label.
///
/// Field meanings (Japanese produce-label domain):
/// * `product_name` — vegetable/fruit product name, e.g. 「カットキャベツ」
/// * `origin` — prefecture-of-production string, e.g. 「茨城県産」
/// * `mng_id` — short code printed next to a 「管理番号」 label
/// * `jan_code` — 13- or 8-digit JAN barcode number (45/49-prefixed)
///
/// No semantic validation is applied to the values: the extraction layer
/// trusts the model's field assignment, and format sanity (numeric JAN,
/// real prefecture names) is handled by prompt wording upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelRecord {
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub mng_id: Option<String>,
    #[serde(default)]
    pub jan_code: Option<String>,
}

impl LabelRecord {
    /// True when the model found none of the four fields.
    pub fn is_empty(&self) -> bool {
        self.product_name.is_none()
            && self.origin.is_none()
            && self.mng_id.is_none()
            && self.jan_code.is_none()
    }
}

/// Result of one extraction: the record plus timing stats.
///
/// The raw model text is consumed during parsing and deliberately not
/// retained here.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub record: LabelRecord,
    pub stats: ExtractionStats,
}

/// Operational stats for one extraction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionStats {
    /// Wall-clock time for the whole invocation.
    pub duration_ms: u64,
    /// Time spent inside the model call (including retries).
    pub model_duration_ms: u64,
    /// How many retries the model call needed (0 = first attempt succeeded).
    pub retries: u32,
}
