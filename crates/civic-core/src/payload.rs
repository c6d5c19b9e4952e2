//! Image payloads as inline data URIs
//!
//! Payloads travel as `data:<mime>;base64,<body>` strings so a finalized
//! complaint can cross the sink boundary without a separate file transfer.
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CivicError;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

/// A self-describing image, encoded as a data URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImagePayload {
    mime: String,
    body: String,
}

impl ImagePayload {
    /// Encode raw image bytes
    pub fn encode(mime: &str, bytes: &[u8]) -> Result<Self, CivicError> {
        check_mime(mime)?;
        if bytes.is_empty() {
            return Err(CivicError::PayloadError("empty image".to_string()));
        }
        Ok(Self {
            mime: mime.to_ascii_lowercase(),
            body: STANDARD.encode(bytes),
        })
    }

    /// Parse a `data:image/...;base64,...` string
    pub fn parse(uri: &str) -> Result<Self, CivicError> {
        let rest = uri
            .strip_prefix(DATA_PREFIX)
            .ok_or_else(|| CivicError::PayloadError("missing data: prefix".to_string()))?;
        let (mime, body) = rest
            .split_once(BASE64_MARKER)
            .ok_or_else(|| CivicError::PayloadError("payload is not base64 encoded".to_string()))?;
        check_mime(mime)?;
        if body.is_empty() {
            return Err(CivicError::PayloadError("empty image".to_string()));
        }
        STANDARD
            .decode(body)
            .map_err(|e| CivicError::PayloadError(format!("invalid base64 body: {}", e)))?;

        Ok(Self {
            mime: mime.to_ascii_lowercase(),
            body: body.to_string(),
        })
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// Decode back to raw bytes
    pub fn decode(&self) -> Result<Vec<u8>, CivicError> {
        STANDARD
            .decode(&self.body)
            .map_err(|e| CivicError::PayloadError(e.to_string()))
    }

    /// Size of the decoded image in bytes
    pub fn byte_len(&self) -> usize {
        let padding = self.body.bytes().rev().take_while(|b| *b == b'=').count();
        self.body.len() / 4 * 3 - padding
    }

    pub fn to_data_uri(&self) -> String {
        format!("{}{}{}{}", DATA_PREFIX, self.mime, BASE64_MARKER, self.body)
    }

    /// Content digest over the encoded body
    pub fn digest(&self) -> blake3::Hash {
        blake3::hash(self.body.as_bytes())
    }
}

fn check_mime(mime: &str) -> Result<(), CivicError> {
    match mime.split_once('/') {
        Some((kind, subtype)) if kind.eq_ignore_ascii_case("image") && !subtype.is_empty() => Ok(()),
        _ => Err(CivicError::PayloadError(format!("unsupported media type '{}'", mime))),
    }
}

impl fmt::Display for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}{}{}", DATA_PREFIX, self.mime, BASE64_MARKER, self.body)
    }
}

impl TryFrom<String> for ImagePayload {
    type Error = CivicError;

    fn try_from(uri: String) -> Result<Self, Self::Error> {
        Self::parse(&uri)
    }
}

impl From<ImagePayload> for String {
    fn from(payload: ImagePayload) -> Self {
        payload.to_data_uri()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_data_uri() {
        let payload = ImagePayload::encode("image/png", b"\x89PNG").unwrap();
        assert_eq!(payload.to_data_uri(), "data:image/png;base64,iVBORw==");
        assert_eq!(payload.byte_len(), 4);
        assert_eq!(payload.decode().unwrap(), b"\x89PNG");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(ImagePayload::parse("image/png;base64,AAAA").is_err());
        assert!(ImagePayload::parse("data:image/png,AAAA").is_err());
        assert!(ImagePayload::parse("data:text/plain;base64,AAAA").is_err());
        assert!(ImagePayload::parse("data:image/png;base64,").is_err());
        assert!(ImagePayload::parse("data:image/png;base64,@@@@").is_err());
    }

    #[test]
    fn test_serde_uses_string_form() {
        let payload = ImagePayload::parse("data:image/jpeg;base64,/9j/").unwrap();
        let json = serde_json::to_string(&payload).unwrap();
        assert_eq!(json, "\"data:image/jpeg;base64,/9j/\"");

        let bad: Result<ImagePayload, _> = serde_json::from_str("\"not a uri\"");
        assert!(bad.is_err());
    }
}
