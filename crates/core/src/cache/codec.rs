//! Payload encoding for storage.
//!
//! Stored form is `<content-type tag>:<standard base64 body>`, which is plain
//! ASCII text and survives any backend that can hold a string.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{ContentType, Error, RawPayload};

/// Encode a payload for storage.
pub fn encode(payload: &RawPayload) -> String {
    format!("{}:{}", payload.content_type.as_str(), STANDARD.encode(&payload.body))
}

/// Decode a stored payload.
///
/// # Errors
///
/// Returns `Error::CorruptPayload` if the tag is unknown or the body is not valid base64.
pub fn decode(stored: &str) -> Result<RawPayload, Error> {
    let (tag, body) = stored
        .split_once(':')
        .ok_or_else(|| Error::CorruptPayload("missing content type separator".into()))?;

    let content_type: ContentType = tag.parse()?;
    let body = STANDARD
        .decode(body)
        .map_err(|e| Error::CorruptPayload(e.to_string()))?;

    Ok(RawPayload::new(content_type, body))
}
