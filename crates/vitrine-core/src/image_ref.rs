//! Image reference classification and encoding
//!
//! The `src` attribute of an `img` element inside a rich-text field appears
//! in one of three forms:
//!
//! - an inline data URI (`data:image/png;base64,…`) for a not-yet-persisted
//!   image,
//! - a bare numeric id (`"17"`), the canonical form written to storage,
//! - a fully-qualified link (`https://host/api/images/17`), the form served
//!   to readers.
//!
//! All form recognition lives here so the heuristics stay in one testable
//! place.

use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::{DecodePaddingMode, Engine as _, GeneralPurpose, GeneralPurposeConfig};
use regex::Regex;

use crate::error::{SyncError, SyncResult};
use crate::image::{ImageType, NewImage};

static LINK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://.+/api/images/(\d+)$").expect("image link regex"));

/// Accepts both padded and unpadded payloads; browsers and API clients are
/// inconsistent about trailing `=`.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// The three encodings an image reference can appear in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A raw `src` that is neither a link nor a bare id; expected to be an
    /// inline data URI, but not yet validated
    Inline(String),
    /// A persisted image referenced by bare numeric id
    Stored(i64),
    /// A persisted image referenced through its public link
    Link(i64),
}

impl ImageRef {
    /// Classify a raw `src` attribute value. Total — unrecognizable input
    /// classifies as [`ImageRef::Inline`] and fails later, at decode time.
    pub fn classify(src: &str) -> ImageRef {
        if let Some(caps) = LINK_REGEX.captures(src) {
            if let Ok(id) = caps[1].parse() {
                return ImageRef::Link(id);
            }
        }
        if !src.is_empty() && src.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(id) = src.parse() {
                return ImageRef::Stored(id);
            }
        }
        ImageRef::Inline(src.to_string())
    }
}

/// Canonical stored form of a persisted image reference
pub fn encode_id(id: i64) -> String {
    id.to_string()
}

/// Public link form used when serving rich text to readers
pub fn encode_link(base_url: &str, id: i64) -> String {
    format!("{}/api/images/{}", base_url, id)
}

/// Decode an inline `data:image/<type>[;params…];base64,<payload>` reference
/// into a not-yet-persisted image.
///
/// Anything that does not match that shape is a [`SyncError::Decode`], which
/// aborts the whole operation.
pub fn decode_data_uri(src: &str) -> SyncResult<NewImage> {
    let rest = src
        .strip_prefix("data:")
        .ok_or_else(|| SyncError::Decode(format!("not a data URI: {}", truncate(src))))?;

    let (head, payload) = rest
        .split_once(',')
        .ok_or_else(|| SyncError::Decode(format!("data URI has no payload: {}", truncate(src))))?;

    let mut params = head.split(';');
    let mime = params.next().unwrap_or_default();
    if !mime.starts_with("image/") {
        return Err(SyncError::Decode(format!("not an image MIME type: {}", mime)));
    }
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(SyncError::Decode(format!(
            "data URI is not base64-encoded: {}",
            truncate(src)
        )));
    }

    let data = BASE64
        .decode(payload.trim())
        .map_err(|e| SyncError::Decode(format!("invalid base64 payload: {}", e)))?;

    Ok(NewImage::new(data, ImageType::from_mime(mime)))
}

/// Keep decode errors readable when the offending src is a large payload
fn truncate(src: &str) -> String {
    const LIMIT: usize = 48;
    if src.len() <= LIMIT {
        src.to_string()
    } else {
        let cut = (0..=LIMIT).rev().find(|i| src.is_char_boundary(*i)).unwrap_or(0);
        format!("{}…", &src[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_link() {
        assert_eq!(
            ImageRef::classify("http://localhost:8080/api/images/17"),
            ImageRef::Link(17)
        );
        assert_eq!(
            ImageRef::classify("https://folio.example.com/api/images/3"),
            ImageRef::Link(3)
        );
    }

    #[test]
    fn test_classify_stored_id() {
        assert_eq!(ImageRef::classify("17"), ImageRef::Stored(17));
        assert_eq!(ImageRef::classify("0"), ImageRef::Stored(0));
    }

    #[test]
    fn test_classify_inline() {
        assert_eq!(
            ImageRef::classify("data:image/png;base64,AAA"),
            ImageRef::Inline("data:image/png;base64,AAA".to_string())
        );
        // not a full link, not all digits
        assert_eq!(
            ImageRef::classify("/api/images/17"),
            ImageRef::Inline("/api/images/17".to_string())
        );
        assert_eq!(ImageRef::classify(""), ImageRef::Inline(String::new()));
        // digits too large for an i64 fall through to inline
        let huge = "9".repeat(30);
        assert_eq!(ImageRef::classify(&huge), ImageRef::Inline(huge.clone()));
    }

    #[test]
    fn test_encode_round_trip() {
        let link = encode_link("http://x", 7);
        assert_eq!(link, "http://x/api/images/7");
        assert_eq!(ImageRef::classify(&link), ImageRef::Link(7));
        assert_eq!(ImageRef::classify(&encode_id(7)), ImageRef::Stored(7));
    }

    #[test]
    fn test_decode_png() {
        let img = decode_data_uri("data:image/png;base64,AAA").unwrap();
        assert_eq!(img.image_type, ImageType::Png);
        assert_eq!(img.data, vec![0, 0]);
    }

    #[test]
    fn test_decode_jpeg_with_charset() {
        let img = decode_data_uri("data:image/jpeg;charset=utf-8;base64,aGVsbG8=").unwrap();
        assert_eq!(img.image_type, ImageType::Jpeg);
        assert_eq!(img.data, b"hello");
    }

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        let padded = decode_data_uri("data:image/png;base64,aGk=").unwrap();
        let unpadded = decode_data_uri("data:image/png;base64,aGk").unwrap();
        assert_eq!(padded.data, unpadded.data);
    }

    #[test]
    fn test_decode_failures() {
        // wrong scheme
        assert!(decode_data_uri("http://x/api/images/7").is_err());
        // not an image
        assert!(decode_data_uri("data:text/plain;base64,aGk=").is_err());
        // missing base64 token
        assert!(decode_data_uri("data:image/png,AAA").is_err());
        // missing payload separator
        assert!(decode_data_uri("data:image/png;base64").is_err());
        // invalid payload
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
        // empty string
        assert!(decode_data_uri("").is_err());
    }
}
