//! Compression Codec Module
//!
//! Symmetric payload transforms used for large entries. Gzip is the native
//! codec; builds without the `gzip` feature substitute a base64 encoding that
//! keeps the same contract without shrinking anything.

use std::fmt::Debug;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64_STANDARD, Engine as _};

use crate::error::CodecError;

// == Codec Trait ==
/// A reversible payload transform.
///
/// Implementations must satisfy `decompress(compress(x)) == x`.
pub trait CompressionCodec: Send + Sync + Debug {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;
}

// == Gzip Codec ==
/// Streaming gzip via flate2.
#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy)]
pub struct GzipCodec {
    level: flate2::Compression,
}

#[cfg(feature = "gzip")]
impl GzipCodec {
    pub fn new() -> Self {
        Self {
            level: flate2::Compression::default(),
        }
    }

    /// Creates a codec with an explicit level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: flate2::Compression::new(level.min(9)),
        }
    }
}

#[cfg(feature = "gzip")]
impl Default for GzipCodec {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "gzip")]
impl CompressionCodec for GzipCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        use std::io::Write;

        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(data)
            .map_err(|e| CodecError::Compress(e.to_string()))?;
        encoder
            .finish()
            .map_err(|e| CodecError::Compress(e.to_string()))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        use std::io::Read;

        let mut decoder = flate2::read::GzDecoder::new(data);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| CodecError::Corruption(e.to_string()))?;
        Ok(out)
    }
}

// == Base64 Codec ==
/// Deterministic text-safe fallback. Grows the payload by a third.
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl CompressionCodec for Base64Codec {
    fn name(&self) -> &'static str {
        "base64"
    }

    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(BASE64_STANDARD.encode(data).into_bytes())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        BASE64_STANDARD
            .decode(data)
            .map_err(|e| CodecError::Corruption(e.to_string()))
    }
}

// == Default Codec ==
/// Returns the native codec when compiled in, else the fallback.
pub fn default_codec() -> Arc<dyn CompressionCodec> {
    #[cfg(feature = "gzip")]
    let codec: Arc<dyn CompressionCodec> = Arc::new(GzipCodec::new());
    #[cfg(not(feature = "gzip"))]
    let codec: Arc<dyn CompressionCodec> = Arc::new(Base64Codec);
    codec
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        "the quick brown fox jumps over the lazy dog "
            .repeat(64)
            .into_bytes()
    }

    #[test]
    fn test_base64_symmetric() {
        let codec = Base64Codec;
        let data = sample();

        let encoded = codec.compress(&data).unwrap();
        assert!(encoded.iter().all(|b| b.is_ascii()));
        assert_eq!(codec.decompress(&encoded).unwrap(), data);
    }

    #[test]
    fn test_base64_empty_input() {
        let codec = Base64Codec;
        let encoded = codec.compress(&[]).unwrap();
        assert!(encoded.is_empty());
        assert!(codec.decompress(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_base64_rejects_garbage() {
        let codec = Base64Codec;
        let result = codec.decompress(b"%%% not base64 %%%");
        assert!(matches!(result, Err(CodecError::Corruption(_))));
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_symmetric_and_smaller() {
        let codec = GzipCodec::new();
        let data = sample();

        let compressed = codec.compress(&data).unwrap();
        assert!(compressed.len() < data.len());
        assert_eq!(codec.decompress(&compressed).unwrap(), data);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_binary_payload() {
        let codec = GzipCodec::with_level(9);
        let data: Vec<u8> = (0..=255u8).cycle().take(4096).collect();

        let compressed = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&compressed).unwrap(), data);
    }

    #[cfg(feature = "gzip")]
    #[test]
    fn test_gzip_rejects_garbage() {
        let codec = GzipCodec::new();
        let result = codec.decompress(b"definitely not gzip");
        assert!(matches!(result, Err(CodecError::Corruption(_))));
    }

    #[test]
    fn test_default_codec_round_trip() {
        let codec = default_codec();
        let data = sample();
        let stored = codec.compress(&data).unwrap();
        assert_eq!(codec.decompress(&stored).unwrap(), data);
    }
}
