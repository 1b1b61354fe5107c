//! Decoding of original court copies.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Extension used when the content type is missing or not in the table.
pub const UNKNOWN_EXTENSION: &str = "unkwn";

/// Content-type markers and the extension each maps to, checked in order.
const EXTENSIONS: [(&str, &str); 5] = [
    ("text/html", "html"),
    ("application/postscript", "ps"),
    ("application/pdf", "pdf"),
    ("text/plain", "txt"),
    ("image/png", "png"),
];

/// Infers a file extension from a `Content-Type` value by substring match.
///
/// ```
/// use ikfetch_core::extension_for_content_type;
///
/// assert_eq!(extension_for_content_type(Some("application/pdf; charset=binary")), "pdf");
/// assert_eq!(extension_for_content_type(Some("image/tiff")), "unkwn");
/// assert_eq!(extension_for_content_type(None), "unkwn");
/// ```
#[must_use]
pub fn extension_for_content_type(content_type: Option<&str>) -> &'static str {
    let Some(content_type) = content_type.filter(|c| !c.is_empty()) else {
        return UNKNOWN_EXTENSION;
    };
    EXTENSIONS
        .iter()
        .find(|&&(marker, _)| content_type.contains(marker))
        .map_or(UNKNOWN_EXTENSION, |&(_, ext)| ext)
}

/// Decodes a base64 payload, ignoring embedded whitespace and line breaks.
pub(crate) fn decode_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact)
}
