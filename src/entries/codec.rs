use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Serialize};
use std::io::{Read, Write};

use crate::shared::AppError;

/// Gzip + base64 transfer encoding for the full-collection payload. The
/// consumer side decodes with [`decode_payload`]; `Content-Encoding: gzip`
/// is signalled explicitly in the response body.
pub fn encode_payload<T: Serialize>(value: &T) -> Result<String, AppError> {
    let json = serde_json::to_vec(value).map_err(|err| AppError::Encoding(err.to_string()))?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(&json)
        .and_then(|_| encoder.finish())
        .map(|compressed| STANDARD.encode(compressed))
        .map_err(|err| AppError::Encoding(err.to_string()))
}

/// Inverse of [`encode_payload`]. Used by sync tooling and tests.
pub fn decode_payload<T: DeserializeOwned>(data: &str) -> Result<T, AppError> {
    let compressed = STANDARD
        .decode(data)
        .map_err(|err| AppError::Encoding(err.to_string()))?;

    let mut json = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut json)
        .map_err(|err| AppError::Encoding(err.to_string()))?;

    serde_json::from_slice(&json).map_err(|err| AppError::Encoding(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_payload() {
        let payload = vec!["2024-10-10".to_string(), "2024-10-11".to_string()];
        let encoded = encode_payload(&payload).unwrap();
        let decoded: Vec<String> = decode_payload(&encoded).unwrap();
        assert_eq!(decoded, payload);
    }

    #[test]
    fn compresses_repetitive_payloads() {
        let payload: Vec<String> = (0..200).map(|_| "2024-10-10".to_string()).collect();
        let json_len = serde_json::to_vec(&payload).unwrap().len();
        let encoded = encode_payload(&payload).unwrap();
        assert!(encoded.len() < json_len);
    }

    #[test]
    fn rejects_garbage_input() {
        assert!(decode_payload::<Vec<String>>("not base64 at all!").is_err());
    }
}
