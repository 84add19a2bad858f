use base64::{Engine as _, engine::general_purpose::STANDARD};
use crate::error::{AppError, Result};

/// Upper bound on the decoded credential blob.
pub const MAX_CREDENTIALS_BYTES: usize = 8 * 1024;

/// Decodes the base64 credential blob sent by the transport.
///
/// The contents stay opaque; only emptiness, encoding and size are checked.
///
/// # Arguments
///
/// * `encoded` - Standard base64 text.
///
/// # Returns
///
/// A `Result` containing the raw bytes.
pub fn decode_credentials(encoded: &str) -> Result<Vec<u8>> {
    let encoded = encoded.trim();
    if encoded.is_empty() {
        return Err(AppError::Validation(
            "Credentials cannot be empty".to_string(),
        ));
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| AppError::Validation("Credentials must be valid base64".to_string()))?;

    if bytes.len() > MAX_CREDENTIALS_BYTES {
        return Err(AppError::Validation(format!(
            "Credentials must be at most {} bytes",
            MAX_CREDENTIALS_BYTES
        )));
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_blob() {
        let encoded = STANDARD.encode(b"\x00\x01sealed");
        assert_eq!(decode_credentials(&encoded).unwrap(), b"\x00\x01sealed");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(decode_credentials("  "), Err(AppError::Validation(_))));
        assert!(matches!(decode_credentials("%%%"), Err(AppError::Validation(_))));
    }

    #[test]
    fn rejects_oversized_blob() {
        let encoded = STANDARD.encode(vec![7u8; MAX_CREDENTIALS_BYTES + 1]);
        assert!(matches!(decode_credentials(&encoded), Err(AppError::Validation(_))));
    }
}
