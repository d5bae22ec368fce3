//! Defensive parsing: untrusted model text → [`LabelRecord`].
//!
//! ## Why is this defensive at all?
//!
//! Even with `responseMimeType: application/json` requested, vision models
//! ship replies that are *semantically* right but *structurally* decorated:
//!
//! - wrapped in ` ```json … ``` ` fences despite the prompt saying not to
//! - prefixed with prose ("Here is the result: {…}")
//! - occasionally pure prose with no JSON at all
//!
//! The recovery strategy mirrors what works in practice: strip fences if
//! present, slice from the first `{` to the last `}`, and only then parse.
//! A reply with no brace pair, or a slice that is not valid JSON, is a
//! malformed response — a data problem distinct from a transport failure,
//! and never an all-null record.
//!
//! Every function here is pure: the same raw text always yields the same
//! result.

use crate::error::LabelScanError;
use crate::record::LabelRecord;
use once_cell::sync::Lazy;
use regex::Regex;

/// How much of a braceless reply to quote back in the error message.
const SNIPPET_CHARS: usize = 60;

/// Parse the raw model reply into the fixed four-field record.
///
/// Coercion rules:
/// * a field absent from the parsed object is `None`, not an error;
/// * extra fields in the parsed object are silently ignored;
/// * field values are taken as-is — no semantic validation of JAN digits or
///   prefecture names happens here.
///
/// # Errors
/// [`LabelScanError::NoJsonObject`] when the text has no `{`…`}` span,
/// [`LabelScanError::UnparseableJson`] when the span is not valid JSON.
pub fn extract_record(raw_text: &str) -> Result<LabelRecord, LabelScanError> {
    let unfenced = strip_code_fences(raw_text);
    let sliced = slice_json_object(&unfenced)?;
    serde_json::from_str(sliced).map_err(|e| LabelScanError::UnparseableJson {
        detail: e.to_string(),
    })
}

// ── Step 1: Strip code fences ────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

/// Remove a wrapping ` ```json … ``` ` fence when the whole reply is fenced;
/// pass anything else through untouched.
fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Step 2: Slice the brace span ─────────────────────────────────────────

/// Return the `{`…`}` span (inclusive) of the text.
///
/// Taking the *first* `{` and the *last* `}` survives both leading prose and
/// trailing commentary around the object. Braces are ASCII, so the byte
/// positions from `find`/`rfind` are valid char boundaries even in Japanese
/// text.
fn slice_json_object(text: &str) -> Result<&str, LabelScanError> {
    let start = text.find('{');
    let end = text.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if s < e => Ok(&text[s..=e]),
        _ => Err(LabelScanError::NoJsonObject {
            snippet: text.chars().take(SNIPPET_CHARS).collect(),
        }),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn record(raw: &str) -> LabelRecord {
        extract_record(raw).expect("extraction should succeed")
    }

    #[test]
    fn clean_json_body() {
        let r = record(
            r#"{"productName":"キャベツ","origin":"茨城県産","mngId":null,"janCode":"4901234567890"}"#,
        );
        assert_eq!(r.product_name.as_deref(), Some("キャベツ"));
        assert_eq!(r.origin.as_deref(), Some("茨城県産"));
        assert!(r.mng_id.is_none());
        assert_eq!(r.jan_code.as_deref(), Some("4901234567890"));
    }

    #[test]
    fn fenced_json_body() {
        let raw = "```json\n{\"productName\":\"キャベツ\",\"origin\":\"茨城県産\",\"mngId\":null,\"janCode\":\"4901234567890\"}\n```";
        let r = record(raw);
        assert_eq!(r.product_name.as_deref(), Some("キャベツ"));
        assert_eq!(r.jan_code.as_deref(), Some("4901234567890"));
    }

    #[test]
    fn fence_without_language_tag() {
        let raw = "```\n{\"productName\":\"トマト\"}\n```";
        assert_eq!(record(raw).product_name.as_deref(), Some("トマト"));
    }

    #[test]
    fn prose_around_the_object() {
        let raw = r#"Here is the result: {"productName":"トマト"}"#;
        let r = record(raw);
        assert_eq!(r.product_name.as_deref(), Some("トマト"));
        assert!(r.origin.is_none());
        assert!(r.mng_id.is_none());
        assert!(r.jan_code.is_none());
    }

    #[test]
    fn prose_before_and_after() {
        let raw = "結果は以下の通りです。\n{\"origin\":\"静岡県\"}\nご確認ください。";
        let r = record(raw);
        assert_eq!(r.origin.as_deref(), Some("静岡県"));
    }

    #[test]
    fn missing_fields_become_null_not_errors() {
        let r = record(r#"{"productName":"トマト"}"#);
        assert_eq!(r.product_name.as_deref(), Some("トマト"));
        assert!(r.origin.is_none() && r.mng_id.is_none() && r.jan_code.is_none());
    }

    #[test]
    fn extra_fields_silently_ignored() {
        let r = record(r#"{"productName":"トマト","confidence":0.98,"notes":"clear label"}"#);
        assert_eq!(r.product_name.as_deref(), Some("トマト"));
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("confidence").is_none());
        assert_eq!(json.as_object().unwrap().len(), 4);
    }

    #[test]
    fn no_braces_is_malformed() {
        let err = extract_record("申し訳ありませんが、この画像からは情報を読み取れません。")
            .unwrap_err();
        assert!(matches!(err, LabelScanError::NoJsonObject { .. }));
    }

    #[test]
    fn unbalanced_braces_are_malformed() {
        let err = extract_record("}{").unwrap_err();
        assert!(matches!(err, LabelScanError::NoJsonObject { .. }));
    }

    #[test]
    fn invalid_json_slice_is_malformed_not_transport() {
        let err = extract_record("{productName: カット}").unwrap_err();
        assert!(matches!(err, LabelScanError::UnparseableJson { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn snippet_is_char_boundary_safe() {
        let long_prose = "あ".repeat(200);
        match extract_record(&long_prose).unwrap_err() {
            LabelScanError::NoJsonObject { snippet } => {
                assert_eq!(snippet.chars().count(), SNIPPET_CHARS);
            }
            other => panic!("expected NoJsonObject, got {other:?}"),
        }
    }

    #[test]
    fn extraction_is_idempotent() {
        let raw = "```json\n{\"productName\":\"キャベツ\",\"janCode\":\"4512345678904\"}\n```";
        assert_eq!(record(raw), record(raw));
    }

    #[test]
    fn fences_pass_through_when_absent() {
        assert_eq!(strip_code_fences("plain text"), "plain text");
    }

    #[test]
    fn all_null_body_is_a_valid_record() {
        let r = record(r#"{"productName":null,"origin":null,"mngId":null,"janCode":null}"#);
        assert!(r.is_empty());
    }
}
