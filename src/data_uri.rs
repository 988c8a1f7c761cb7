//! Encoded image references (`data:` URIs)

use std::fmt;

use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::{Error, Result};

const PNG_MIME: &str = "image/png";

/// An image inlined as a `data:<mime>;base64,<payload>` string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDataUri {
    uri: String,
    mime_len: usize,
}

impl ImageDataUri {
    /// Wrap PNG bytes.
    pub fn from_png(png: &[u8]) -> Self {
        Self::from_bytes(PNG_MIME, png)
    }

    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        let payload = base64::engine::general_purpose::STANDARD.encode(bytes);
        Self {
            uri: format!("data:{};base64,{}", mime, payload),
            mime_len: mime.len(),
        }
    }

    /// Parse an existing `data:` URI. Only image media types are accepted.
    pub fn parse(s: &str) -> Result<Self> {
        let (mime, _, _) = split(s)?;
        if !mime.starts_with("image/") {
            return Err(Error::DataUriError(format!("not an image media type: '{}'", mime)));
        }
        // decode once so a malformed payload is rejected up front
        let uri = Self {
            uri: s.trim().to_string(),
            mime_len: mime.len(),
        };
        uri.decode()?;
        Ok(uri)
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    pub fn mime(&self) -> &str {
        &self.uri[5..5 + self.mime_len]
    }

    /// Decode the payload back into raw bytes.
    pub fn decode(&self) -> Result<Vec<u8>> {
        let (_, is_base64, payload) = split(&self.uri)?;
        if is_base64 {
            base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| Error::DataUriError(format!("invalid base64 payload: {}", e)))
        } else {
            Ok(payload.as_bytes().to_vec())
        }
    }
}

impl fmt::Display for ImageDataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Split a data URI into (mime, is_base64, payload).
fn split(s: &str) -> Result<(&str, bool, &str)> {
    let s = s.trim();
    let rest = s
        .strip_prefix("data:")
        .ok_or_else(|| Error::DataUriError("missing 'data:' prefix".into()))?;
    let comma = rest
        .find(',')
        .ok_or_else(|| Error::DataUriError("missing ',' separator".into()))?;
    let header = &rest[..comma];
    let payload = &rest[comma + 1..];

    let mut parts = header.split(';');
    let mime = parts.next().unwrap_or_default();
    let mime = if mime.is_empty() { "text/plain" } else { mime };
    let is_base64 = parts.any(|p| p.eq_ignore_ascii_case("base64"));
    Ok((mime, is_base64, payload))
}

/// A successful capture: the encoded image plus what it was made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub data_uri: ImageDataUri,
    pub width: u32,
    pub height: u32,
    /// SHA-256 of the raw RGBA pixels; equal for visually identical captures
    pub fingerprint: String,
}

/// Hex SHA-256 digest of a pixel buffer.
pub fn pixel_fingerprint(rgba: &[u8]) -> String {
    hex::encode(Sha256::digest(rgba))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn png_uri_has_expected_prefix() {
        let uri = ImageDataUri::from_png(b"\x89PNG\r\n\x1a\n");
        assert!(uri.as_str().starts_with("data:image/png;base64,"));
        assert_eq!(uri.mime(), "image/png");
        assert_eq!(uri.decode().unwrap(), b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn parse_rejects_non_images() {
        assert!(ImageDataUri::parse("data:text/plain,hello").is_err());
        assert!(ImageDataUri::parse("https://example.com/a.png").is_err());
        assert!(ImageDataUri::parse("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn parse_accepts_uppercase_base64_marker() {
        let uri = ImageDataUri::parse("data:image/gif;BASE64,R0lG").unwrap();
        assert_eq!(uri.mime(), "image/gif");
        assert_eq!(uri.decode().unwrap(), b"GIF");
    }

    #[test]
    fn fingerprint_is_stable() {
        let a = pixel_fingerprint(&[0, 0, 0, 255]);
        assert_eq!(a, pixel_fingerprint(&[0, 0, 0, 255]));
        assert_ne!(a, pixel_fingerprint(&[255, 255, 255, 255]));
        assert_eq!(a.len(), 64);
    }
}
