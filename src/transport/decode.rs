//! Response body decompression.
//!
//! Pure function over bytes and headers, so every encoding path is testable
//! without touching the network.

use std::io::Read;

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};

use crate::error_handling::FetchError;
use crate::transport::response::HeaderMap;

/// Decompresses a response body according to its `Content-Encoding` header
/// and decodes it to text.
///
/// `gzip`, `deflate`, and `br` are undone before UTF-8 decoding; any other
/// value, or no header at all, treats the buffer as already-plain text.
/// Decompression failure yields `FetchError::Decode`.
pub fn decode_response_body(buffer: &[u8], headers: &HeaderMap) -> Result<String, FetchError> {
    let encoding = headers
        .first("content-encoding")
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let decoded = match encoding.as_str() {
        "gzip" | "x-gzip" => gunzip(buffer)?,
        "deflate" => inflate(buffer)?,
        "br" => unbrotli(buffer)?,
        _ => buffer.to_vec(),
    };

    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

fn gunzip(buffer: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    GzDecoder::new(buffer)
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decode(format!("gzip: {e}")))?;
    Ok(out)
}

fn inflate(buffer: &[u8]) -> Result<Vec<u8>, FetchError> {
    // Servers disagree on whether "deflate" means zlib-wrapped or raw;
    // try zlib first and fall back to the raw stream
    let mut out = Vec::new();
    if ZlibDecoder::new(buffer).read_to_end(&mut out).is_ok() {
        return Ok(out);
    }
    let mut out = Vec::new();
    DeflateDecoder::new(buffer)
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decode(format!("deflate: {e}")))?;
    Ok(out)
}

fn unbrotli(buffer: &[u8]) -> Result<Vec<u8>, FetchError> {
    let mut out = Vec::new();
    brotli::Decompressor::new(buffer, 4096)
        .read_to_end(&mut out)
        .map_err(|e| FetchError::Decode(format!("brotli: {e}")))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "channel list: {\"name\":\"Ch1\",\"url\":\"acestream://a\"} \u{e9}\u{4e2d}";

    fn headers_with_encoding(value: &str) -> HeaderMap {
        HeaderMap::from_pairs([("Content-Encoding", value)])
    }

    fn gzip_bytes(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn zlib_bytes(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn brotli_bytes(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        {
            let mut writer = brotli::CompressorWriter::new(&mut out, 4096, 5, 22);
            writer.write_all(data).unwrap();
        }
        out
    }

    #[test]
    fn test_round_trip_gzip() {
        let body = gzip_bytes(SAMPLE.as_bytes());
        let decoded = decode_response_body(&body, &headers_with_encoding("gzip")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_round_trip_gzip_uppercase_header() {
        let body = gzip_bytes(SAMPLE.as_bytes());
        let decoded = decode_response_body(&body, &headers_with_encoding("GZIP")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_round_trip_deflate_zlib() {
        let body = zlib_bytes(SAMPLE.as_bytes());
        let decoded = decode_response_body(&body, &headers_with_encoding("deflate")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_round_trip_deflate_raw() {
        let mut enc =
            flate2::write::DeflateEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(SAMPLE.as_bytes()).unwrap();
        let body = enc.finish().unwrap();
        let decoded = decode_response_body(&body, &headers_with_encoding("deflate")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_round_trip_brotli() {
        let body = brotli_bytes(SAMPLE.as_bytes());
        let decoded = decode_response_body(&body, &headers_with_encoding("br")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_no_encoding_passthrough() {
        let decoded = decode_response_body(SAMPLE.as_bytes(), &HeaderMap::default()).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_unknown_encoding_passthrough() {
        let decoded =
            decode_response_body(SAMPLE.as_bytes(), &headers_with_encoding("zstd")).unwrap();
        assert_eq!(decoded, SAMPLE);
    }

    #[test]
    fn test_corrupt_gzip_is_decode_error() {
        let result = decode_response_body(b"\x1f\x8bnot really gzip", &headers_with_encoding("gzip"));
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

}
