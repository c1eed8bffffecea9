//! Signing keys, canonical JSON and token generation.

use base64::{
    Engine, alphabet,
    engine::{
        DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE_NO_PAD,
    },
};

pub mod canonical_json;
pub mod keys;
pub mod signing;
pub mod tokens;

pub use canonical_json::{CanonicalJsonError, encode_canonical_json};
pub use keys::{KeyError, Keyring};
pub use signing::{SigningError, sign_json, verify_json};

/// Standard alphabet, unpadded on encode, padding optional on decode.
const UNPADDED_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode bytes as unpadded standard base64.
#[must_use]
pub fn encode_base64(bytes: impl AsRef<[u8]>) -> String {
    UNPADDED_BASE64.encode(bytes)
}

/// Encode bytes as unpadded URL-safe base64.
#[must_use]
pub fn encode_base64_url(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decode standard base64, with or without padding.
///
/// # Errors
///
/// Returns an error when `input` is not valid base64.
pub fn decode_base64(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    UNPADDED_BASE64.decode(input)
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn encoding_drops_padding() {
        assert_eq!(encode_base64(b"ab"), "YWI");
    }

    #[test]
    fn decoding_accepts_padded_and_unpadded_input() -> TestResult {
        assert_eq!(decode_base64("YWI")?, b"ab");
        assert_eq!(decode_base64("YWI=")?, b"ab");

        Ok(())
    }

    #[test]
    fn url_encoding_uses_url_alphabet() {
        assert_eq!(encode_base64_url([0xfb, 0xff]), "-_8");
    }

    #[test]
    fn decoding_rejects_garbage() {
        assert!(decode_base64("not base64!").is_err(), "garbage decoded");
    }
}
