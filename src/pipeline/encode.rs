//! Image encoding: raw bytes → base64 [`ImagePayload`].
//!
//! The hosted multimodal APIs accept images as base64 data embedded in the
//! JSON request body. Label photos arrive as JPEG from the capture app, but
//! the magic bytes are sniffed anyway so a PNG screenshot pasted into the
//! same flow is declared correctly instead of mislabelled.

use crate::error::LabelScanError;
use crate::provider::ImagePayload;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, warn};

/// Validate and wrap image bytes for the model request.
///
/// Empty input is rejected here — before any network activity — as a caller
/// error. Unknown magic bytes are not rejected: the upstream model tolerates
/// a mislabelled mime type better than the caller tolerates a false
/// negative, so we log and send as JPEG.
pub fn encode_image(bytes: &[u8]) -> Result<ImagePayload, LabelScanError> {
    if bytes.is_empty() {
        return Err(LabelScanError::EmptyImage);
    }

    let mime_type = sniff_mime(bytes);
    if mime_type.is_none() {
        warn!(
            "Unrecognised image magic bytes {:02X?}, sending as image/jpeg",
            &bytes[..bytes.len().min(4)]
        );
    }

    let data = STANDARD.encode(bytes);
    debug!("Encoded image → {} bytes base64", data.len());

    Ok(ImagePayload {
        data,
        mime_type: mime_type.unwrap_or("image/jpeg").to_string(),
    })
}

/// Decode a base64 request payload into raw bytes.
///
/// Strips an optional `data:image/...;base64,` data-URI prefix first, since
/// browser capture code often sends the canvas output verbatim.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, LabelScanError> {
    let trimmed = data.trim();
    let raw = match trimmed.split_once(";base64,") {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => trimmed,
    };
    STANDARD
        .decode(raw)
        .map_err(|e| LabelScanError::InvalidBase64 {
            detail: e.to_string(),
        })
}

/// Recognise the image formats seen in practice; `None` for anything else.
fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some("image/png")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Shortest valid-looking JPEG prefix.
    const JPEG_STUB: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

    #[test]
    fn encode_jpeg_stub() {
        let payload = encode_image(JPEG_STUB).unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&payload.data).unwrap(), JPEG_STUB);
    }

    #[test]
    fn encode_png_is_sniffed() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        let payload = encode_image(&png).unwrap();
        assert_eq!(payload.mime_type, "image/png");
    }

    #[test]
    fn unknown_magic_falls_back_to_jpeg() {
        let payload = encode_image(b"not an image").unwrap();
        assert_eq!(payload.mime_type, "image/jpeg");
    }

    #[test]
    fn empty_bytes_rejected() {
        let err = encode_image(&[]).unwrap_err();
        assert!(matches!(err, LabelScanError::EmptyImage));
    }

    #[test]
    fn decode_plain_base64() {
        assert_eq!(decode_base64("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn decode_strips_data_uri_prefix() {
        assert_eq!(
            decode_base64("data:image/jpeg;base64,aGVsbG8=").unwrap(),
            b"hello"
        );
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_base64("!!not base64!!").unwrap_err();
        assert!(matches!(err, LabelScanError::InvalidBase64 { .. }));
    }
}
