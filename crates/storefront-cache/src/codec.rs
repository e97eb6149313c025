//! # Payload Codec
//!
//! Transport encoding for values stored in the distributed tier:
//!
//! ```text
//! value ──serde_json──▶ bytes ──zlib──▶ compressed ──base64──▶ payload
//! ```
//!
//! Payloads written before compression was introduced are plain JSON text.
//! [`decode`] accepts both forms: when the input is not valid base64 or does
//! not inflate, it is parsed as JSON directly.
//!
//! ```
//! use serde_json::json;
//! use storefront_cache::codec;
//!
//! let value = json!({ "name": "A", "products": [1, 2, 3] });
//! let encoded = codec::encode(&value).unwrap();
//! assert_eq!(codec::decode(&encoded.payload).unwrap(), value);
//!
//! // Legacy uncompressed payload
//! assert_eq!(codec::decode(r#"{"name":"A"}"#).unwrap(), json!({ "name": "A" }));
//! ```

use std::io::{Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use serde::Serialize;
use serde_json::Value;

use crate::error::{CacheError, Result};

/// An encoded payload together with its size accounting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    /// Text-safe payload as written to the store
    pub payload: String,
    /// Length of the serialized JSON before compression
    pub raw_len: usize,
    /// Length of the compressed bytes before base64
    pub compressed_len: usize,
}

impl Encoded {
    /// Compressed size over raw size (lower is better)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ratio(&self) -> f64 {
        if self.raw_len == 0 {
            return 1.0;
        }
        self.compressed_len as f64 / self.raw_len as f64
    }
}

/// How a payload was interpreted by [`decode_with_format`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// base64(zlib(json))
    Compressed,
    /// Plain JSON written before compression existed
    Legacy,
}

/// Serialize, compress and base64-encode a value.
///
/// # Errors
///
/// Returns [`CacheError::Serialization`] if the value cannot be represented
/// as JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Encoded> {
    let raw = serde_json::to_vec(value)?;

    let mut encoder = ZlibEncoder::new(Vec::with_capacity(raw.len() / 2), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;

    Ok(Encoded {
        payload: STANDARD.encode(&compressed),
        raw_len: raw.len(),
        compressed_len: compressed.len(),
    })
}

/// Decode a payload produced by [`encode`], or a legacy plain JSON payload.
///
/// # Errors
///
/// Returns [`CacheError::Serialization`] only when the input is neither a
/// compressed payload nor valid JSON.
pub fn decode(payload: &str) -> Result<Value> {
    decode_with_format(payload).map(|(value, _)| value)
}

/// Like [`decode`], also reporting which format the payload was in.
///
/// # Errors
///
/// See [`decode`].
pub fn decode_with_format(payload: &str) -> Result<(Value, PayloadFormat)> {
    match inflate(payload) {
        Ok(raw) => {
            let value = serde_json::from_slice(&raw)?;
            Ok((value, PayloadFormat::Compressed))
        }
        Err(_) => {
            let value = serde_json::from_str(payload)?;
            Ok((value, PayloadFormat::Legacy))
        }
    }
}

fn inflate(payload: &str) -> Result<Vec<u8>> {
    let compressed = STANDARD.decode(payload.trim())?;
    let mut raw = Vec::with_capacity(compressed.len() * 2);
    ZlibDecoder::new(compressed.as_slice())
        .read_to_end(&mut raw)
        .map_err(|e| CacheError::Codec(format!("inflate failed: {e}")))?;
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_roundtrip() {
        let value = json!({
            "tenant": { "id": "t-1", "name": "Acme", "active": true },
            "products": [
                { "id": 1, "price": 19.5, "tags": ["new", "sale"] },
                { "id": 2, "price": -0.5, "tags": [] }
            ],
            "banner": null,
            "count": 18_446_744_073_709_551_615_u64,
            "unicode": "দোকান 🛒"
        });

        let encoded = encode(&value).unwrap();
        let (decoded, format) = decode_with_format(&encoded.payload).unwrap();

        assert_eq!(decoded, value);
        assert_eq!(format, PayloadFormat::Compressed);
    }

    #[test]
    fn test_scalar_roundtrips() {
        for value in [json!(null), json!(0), json!("plain"), json!([]), json!({})] {
            let encoded = encode(&value).unwrap();
            assert_eq!(decode(&encoded.payload).unwrap(), value);
        }
    }

    #[test]
    fn test_payload_is_text_safe() {
        let encoded = encode(&json!({ "line": "a\nb\t\"c\"" })).unwrap();
        assert!(encoded.payload.chars().all(|c| c.is_ascii_alphanumeric() || "+/=".contains(c)));
    }

    #[test]
    fn test_repetitive_payload_compresses() {
        let products: Vec<_> = (0..200)
            .map(|i| json!({ "id": i, "category": "electronics", "inStock": true }))
            .collect();
        let encoded = encode(&products).unwrap();

        assert!(encoded.compressed_len < encoded.raw_len);
        assert!(encoded.ratio() < 0.5);
    }

    #[test]
    fn test_legacy_object_fallback() {
        let (value, format) = decode_with_format(r#"{"name":"A","items":[1,2]}"#).unwrap();
        assert_eq!(value, json!({ "name": "A", "items": [1, 2] }));
        assert_eq!(format, PayloadFormat::Legacy);
    }

    #[test]
    fn test_legacy_scalar_that_is_valid_base64() {
        // "null" and "true" are valid base64 but do not inflate
        assert_eq!(decode("null").unwrap(), json!(null));
        assert_eq!(decode("true").unwrap(), json!(true));
        assert_eq!(decode("42").unwrap(), json!(42));
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = decode("%%% definitely not a payload").unwrap_err();
        assert!(matches!(err, CacheError::Serialization(_)));
    }

    #[test]
    fn test_empty_ratio() {
        let encoded = Encoded { payload: String::new(), raw_len: 0, compressed_len: 0 };
        assert!((encoded.ratio() - 1.0).abs() < f64::EPSILON);
    }
}
